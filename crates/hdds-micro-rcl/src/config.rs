// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Compile-time limits and runtime client configuration
//!
//! Table capacities are const generic parameters of
//! [`Client`](crate::Client); the defaults below mirror a minimal target
//! (one node with one publisher and one subscription).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default maximum number of nodes
pub const DEFAULT_MAX_NODES: usize = 1;

/// Default maximum number of publishers per node
pub const DEFAULT_MAX_PUBLISHERS_PER_NODE: usize = 1;

/// Default maximum number of subscriptions per node
pub const DEFAULT_MAX_SUBSCRIPTIONS_PER_NODE: usize = 1;

/// Maximum size (in bytes) of a serialized message sent or received on a topic
pub const MAX_MESSAGE_SIZE: usize = 1024;

/// Maximum length of a topic name, node name or namespace
pub const MAX_TOPIC_NAME_LEN: usize = 32;

/// Highest valid DDS domain ID
pub const MAX_DOMAIN_ID: u32 = 232;

#[cfg(all(feature = "deserialize-static", feature = "deserialize-stack"))]
compile_error!("features `deserialize-static` and `deserialize-stack` are mutually exclusive");

/// Where subscription messages are deserialized before the callback runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeserializationSupport {
    /// Callbacks receive the raw message; deserialize functions are rejected
    Disabled,
    /// Every subscription slot reserves `MAX_MESSAGE_SIZE` bytes of scratch
    StaticAllocation,
    /// Scratch lives on the stack of `spin_once`
    StackAllocation,
}

/// Deserialization mode selected at build time
#[cfg(feature = "deserialize-static")]
pub const DESERIALIZATION_SUPPORT: DeserializationSupport =
    DeserializationSupport::StaticAllocation;

/// Deserialization mode selected at build time
#[cfg(feature = "deserialize-stack")]
pub const DESERIALIZATION_SUPPORT: DeserializationSupport =
    DeserializationSupport::StackAllocation;

/// Deserialization mode selected at build time
#[cfg(not(any(feature = "deserialize-static", feature = "deserialize-stack")))]
pub const DESERIALIZATION_SUPPORT: DeserializationSupport = DeserializationSupport::Disabled;

/// Client configuration passed to [`Client::init`](crate::Client::init)
///
/// `C` is the middleware's own connection configuration
/// ([`Middleware::Config`](crate::Middleware::Config)); use `()` when the
/// backend needs none.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClientConfig<C = ()> {
    /// DDS domain this client participates in (0-232)
    pub domain_id: u32,

    /// Middleware connection configuration
    pub transport: C,
}

impl<C> ClientConfig<C> {
    /// Create a configuration for `domain_id`
    pub const fn new(domain_id: u32, transport: C) -> Self {
        Self {
            domain_id,
            transport,
        }
    }
}
