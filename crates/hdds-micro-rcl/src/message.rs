// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Message type descriptors
//!
//! A [`MessageType`] is the serialization boundary between application
//! messages and the middleware. It is a passive, immutable value, normally a
//! `static` emitted by the type generator and shared by reference across every
//! publisher and subscription of that type.
//!
//! Messages cross the client as byte slices: the in-memory image of the
//! message (`message_size` bytes) on the application side, the wire encoding
//! on the middleware side.

use crate::config::MAX_MESSAGE_SIZE;
use crate::error::{Error, Result};

/// Serialize a message image into wire bytes, returning the encoded length
///
/// `out` is `MAX_MESSAGE_SIZE` bytes long; implementations must not report
/// more than that.
pub type SerializeFn = fn(message: &[u8], out: &mut [u8]) -> Result<usize>;

/// Deserialize wire bytes into a message image, returning the decoded length
pub type DeserializeFn = fn(wire: &[u8], out: &mut [u8]) -> Result<usize>;

/// Metadata the client needs to handle one message type
///
/// The serialize and deserialize functions carried here are not applied
/// automatically. Endpoints run a function only when it is copied into
/// [`PublisherConfig::serialize`](crate::PublisherConfig) or
/// [`SubscriptionConfig::deserialize`](crate::SubscriptionConfig), e.g. via
/// [`MessageType::serializer`]. Without one, bytes pass through unchanged.
#[derive(Debug, Clone, Copy)]
pub struct MessageType {
    name: &'static str,
    message_size: usize,
    serialize: SerializeFn,
    deserialize: DeserializeFn,
}

impl MessageType {
    /// Create a descriptor
    ///
    /// # Arguments
    ///
    /// * `name` - Fully qualified type name (e.g. `std_msgs/String`)
    /// * `message_size` - Size of the in-memory message in bytes
    /// * `serialize` - Message image -> wire bytes
    /// * `deserialize` - Wire bytes -> message image
    pub const fn new(
        name: &'static str,
        message_size: usize,
        serialize: SerializeFn,
        deserialize: DeserializeFn,
    ) -> Self {
        Self {
            name,
            message_size,
            serialize,
            deserialize,
        }
    }

    /// Type name
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Size of the in-memory message in bytes
    pub const fn message_size(&self) -> usize {
        self.message_size
    }

    /// Serialize function, for [`PublisherConfig::serialize`](crate::PublisherConfig)
    pub const fn serializer(&self) -> SerializeFn {
        self.serialize
    }

    /// Deserialize function, for [`SubscriptionConfig::deserialize`](crate::SubscriptionConfig)
    pub const fn deserializer(&self) -> DeserializeFn {
        self.deserialize
    }

    /// Bytes a caller buffer needs to hold `queue_length` messages
    ///
    /// Returns `None` on overflow.
    pub const fn queue_bytes(&self, queue_length: usize) -> Option<usize> {
        self.message_size.checked_mul(queue_length)
    }
}

/// Run a serializer and check the length it reports
pub(crate) fn encode(serialize: SerializeFn, message: &[u8], out: &mut [u8]) -> Result<usize> {
    let len = serialize(message, out)?;
    if len > out.len() || len > MAX_MESSAGE_SIZE {
        return Err(Error::Generic);
    }
    Ok(len)
}

/// Run a deserializer and check the length it reports
pub(crate) fn decode(deserialize: DeserializeFn, wire: &[u8], out: &mut [u8]) -> Result<usize> {
    let len = deserialize(wire, out)?;
    if len > out.len() {
        return Err(Error::Generic);
    }
    Ok(len)
}

/// Message types that can describe themselves
///
/// Implemented by generated message structs so applications can write
/// `HelloWorld::type_support()` instead of naming the static.
pub trait TypeSupport {
    /// Descriptor for this type
    fn type_support() -> &'static MessageType;
}
