// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Publisher lifecycle and publishing

use core::fmt;

use super::{bounded_name, check_queue, Client, Name, UserMetadata};
use crate::config::MAX_MESSAGE_SIZE;
use crate::error::{Error, Result};
use crate::handle::{NodeHandle, PublisherHandle};
use crate::message::{self, MessageType, SerializeFn};
use crate::middleware::{Middleware, PublisherParams};
use crate::qos::QosPolicy;

/// Called with the publisher and the error when a publish fails
pub type PublisherExceptionCallback<'a> = &'a dyn Fn(PublisherHandle, Error);

/// Optional publisher settings
///
/// Passing `None` to [`Client::publisher_create`] is the same as passing
/// `PublisherConfig::default()`.
#[derive(Clone, Copy)]
pub struct PublisherConfig<'a> {
    /// Serializer applied to every message. `None` publishes the caller's
    /// bytes as they are.
    ///
    /// The client never falls back to [`MessageType::serializer`]; pass it
    /// here to opt in.
    pub serialize: Option<SerializeFn>,
    /// QoS offered
    pub qos: QosPolicy,
    /// Invoked when a publish fails
    pub exception_callback: Option<PublisherExceptionCallback<'a>>,
    /// Opaque data for the application
    pub user_metadata: UserMetadata<'a>,
    /// Topic to publish on. `None` leaves the publisher without a topic and
    /// the middleware decides how to route it.
    pub topic_name: Option<&'a str>,
}

impl Default for PublisherConfig<'_> {
    fn default() -> Self {
        Self {
            serialize: None,
            qos: QosPolicy::default(),
            exception_callback: None,
            user_metadata: None,
            topic_name: None,
        }
    }
}

impl PublisherConfig<'_> {
    /// Reset every field to its default
    pub fn fill_defaults(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Debug for PublisherConfig<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublisherConfig")
            .field("serialize", &self.serialize.is_some())
            .field("qos", &self.qos)
            .field("exception_callback", &self.exception_callback.is_some())
            .field("user_metadata", &self.user_metadata.is_some())
            .field("topic_name", &self.topic_name)
            .finish()
    }
}

/// One publisher table entry
pub(super) struct PublisherSlot<'a, E> {
    pub(super) entity: E,
    message_type: &'a MessageType,
    buffer: &'a mut [u8],
    topic: Option<Name>,
    qos: QosPolicy,
    serialize: Option<SerializeFn>,
    exception_callback: Option<PublisherExceptionCallback<'a>>,
    user_metadata: UserMetadata<'a>,
}

impl<'a, M: Middleware, const NODES: usize, const PUBS: usize, const SUBS: usize>
    Client<'a, M, NODES, PUBS, SUBS>
{
    /// Create a publisher on `node`
    ///
    /// # Arguments
    ///
    /// * `message_type` - Descriptor of the published type
    /// * `queue_length` - Outgoing queue depth, at least 1
    /// * `buffer` - Queue storage, at least `message_size * queue_length` bytes
    /// * `config` - Optional settings, `None` for defaults
    ///
    /// # Errors
    ///
    /// - [`Error::NullPointer`] for the null node handle
    /// - [`Error::AlreadyDone`] for a destroyed node
    /// - [`Error::InvalidParameter`] for a bad queue length, buffer or topic
    /// - [`Error::OutOfSpace`] if the node owns `PUBS` publishers already
    /// - any middleware error, unchanged (the slot is rolled back)
    pub fn publisher_create(
        &mut self,
        node: NodeHandle,
        message_type: &'a MessageType,
        queue_length: usize,
        buffer: &'a mut [u8],
        config: Option<&PublisherConfig<'a>>,
    ) -> Result<PublisherHandle> {
        if node.is_null() {
            return Err(Error::NullPointer);
        }
        self.ensure_initialized()?;
        check_queue(message_type, queue_length, buffer)?;

        let config = config.copied().unwrap_or_default();
        let topic_name = config.topic_name;
        let topic = topic_name.map(|name| bounded_name(name, false)).transpose()?;

        let params = PublisherParams {
            message_type,
            topic_name,
            queue_length,
            qos: config.qos,
        };

        let middleware = &mut self.middleware;
        let owner = self.nodes.get_mut(node.slot())?;
        let node_entity = &mut owner.entity;
        let slot = owner.publishers.insert_with(|index| {
            let entity = middleware
                .publisher_create(node_entity, &params, &mut *buffer)
                .inspect_err(|e| {
                    log::warn!(
                        "[publisher_create] {:?} rejected by middleware: {} (slot {} rolled back)",
                        topic_name,
                        e,
                        index
                    )
                })?;
            Ok(PublisherSlot {
                entity,
                message_type,
                buffer,
                topic,
                qos: config.qos,
                serialize: config.serialize,
                exception_callback: config.exception_callback,
                user_metadata: config.user_metadata,
            })
        })?;

        let handle = PublisherHandle::new(node.slot(), slot);
        log::debug!(
            "[publisher_create] {:?} topic={:?} type={} depth={}",
            handle,
            topic_name,
            message_type.name(),
            queue_length
        );
        Ok(handle)
    }

    /// Destroy a publisher
    ///
    /// # Errors
    ///
    /// - [`Error::NullPointer`] for the null handle
    /// - [`Error::AlreadyDone`] if already destroyed
    /// - any middleware error, unchanged (the publisher stays live)
    pub fn publisher_destroy(&mut self, publisher: PublisherHandle) -> Result<()> {
        if publisher.is_null() {
            return Err(Error::NullPointer);
        }
        self.ensure_initialized()?;

        let middleware = &mut self.middleware;
        let owner = self.nodes.get_mut(publisher.node().slot())?;
        owner
            .publishers
            .release_with(publisher.slot(), |slot| middleware.publisher_destroy(&mut slot.entity))
            .inspect_err(|e| log::warn!("[publisher_destroy] {:?} failed: {}", publisher, e))?;

        log::debug!("[publisher_destroy] {:?} released", publisher);
        Ok(())
    }

    /// Publish one message
    ///
    /// Without a serializer `message` is handed to the middleware as is.
    /// With one, it is serialized into a stack buffer of `MAX_MESSAGE_SIZE`
    /// bytes first. On failure the exception callback (if any) runs before
    /// the error is returned.
    ///
    /// # Errors
    ///
    /// - [`Error::NullPointer`] for the null handle
    /// - [`Error::AlreadyDone`] for a destroyed publisher
    /// - [`Error::InvalidParameter`] for an empty or oversized message
    /// - any serializer or middleware error, unchanged
    pub fn publish(&mut self, publisher: PublisherHandle, message: &[u8]) -> Result<()> {
        if publisher.is_null() {
            return Err(Error::NullPointer);
        }
        self.ensure_initialized()?;
        if message.is_empty() || message.len() > MAX_MESSAGE_SIZE {
            return Err(Error::InvalidParameter);
        }

        let owner = self.nodes.get_mut(publisher.node().slot())?;
        let slot = owner.publishers.get_mut(publisher.slot())?;

        let result = match slot.serialize {
            None => self
                .middleware
                .publisher_publish(&mut slot.entity, &mut *slot.buffer, message),
            Some(serialize) => {
                let mut wire = [0u8; MAX_MESSAGE_SIZE];
                match message::encode(serialize, message, &mut wire) {
                    Ok(len) => self.middleware.publisher_publish(
                        &mut slot.entity,
                        &mut *slot.buffer,
                        &wire[..len],
                    ),
                    Err(e) => Err(e),
                }
            }
        };

        match result {
            Ok(()) => log::trace!("[publish] {:?} {} bytes on {:?}", publisher, message.len(), slot.topic),
            Err(e) => {
                log::warn!("[publish] {:?} on {:?} failed: {}", publisher, slot.topic, e);
                if let Some(callback) = slot.exception_callback {
                    callback(publisher, e);
                }
            }
        }
        result
    }

    /// User metadata of a live publisher
    pub fn publisher_user_metadata(&self, publisher: PublisherHandle) -> UserMetadata<'a> {
        self.publisher_slot(publisher)?.user_metadata
    }

    /// QoS of a live publisher
    pub fn publisher_qos(&self, publisher: PublisherHandle) -> Option<QosPolicy> {
        self.publisher_slot(publisher).map(|slot| slot.qos)
    }

    /// Topic of a live publisher, `None` if it was created without one
    pub fn publisher_topic_name(&self, publisher: PublisherHandle) -> Option<&str> {
        self.publisher_slot(publisher)?.topic.as_deref()
    }

    /// Message type of a live publisher
    pub fn publisher_message_type(&self, publisher: PublisherHandle) -> Option<&'a MessageType> {
        self.publisher_slot(publisher).map(|slot| slot.message_type)
    }

    fn publisher_slot(&self, publisher: PublisherHandle) -> Option<&PublisherSlot<'a, M::Publisher>> {
        self.nodes
            .get(publisher.node().slot())
            .ok()?
            .publishers
            .get(publisher.slot())
            .ok()
    }
}
