// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Subscription lifecycle

use core::any::Any;
use core::fmt;

use super::{bounded_name, check_queue, Client, Name, UserMetadata};
use crate::config::{DeserializationSupport, DESERIALIZATION_SUPPORT, MAX_MESSAGE_SIZE};
use crate::error::{Error, Result};
use crate::handle::{NodeHandle, SubscriptionHandle};
use crate::message::{DeserializeFn, MessageType};
use crate::middleware::{Middleware, SubscriptionParams};
use crate::qos::QosPolicy;

/// Called for every received message during spin
///
/// Receives the subscription, the message bytes (deserialized when a
/// deserializer is configured) and the subscription's user metadata.
pub type SubscriptionCallback<'a> = &'a dyn Fn(SubscriptionHandle, &[u8], Option<&dyn Any>);

/// Called with the subscription and the error when receiving fails
pub type SubscriptionExceptionCallback<'a> = &'a dyn Fn(SubscriptionHandle, Error);

/// Optional subscription settings
#[derive(Clone, Copy)]
pub struct SubscriptionConfig<'a> {
    /// Deserializer applied before the callback. Requires the
    /// `deserialize-static` or `deserialize-stack` feature. Not taken from
    /// the message type unless set here.
    pub deserialize: Option<DeserializeFn>,
    /// QoS requested
    pub qos: QosPolicy,
    /// Invoked when taking or deserializing a message fails
    pub exception_callback: Option<SubscriptionExceptionCallback<'a>>,
    /// Opaque data for the application
    pub user_metadata: UserMetadata<'a>,
}

impl Default for SubscriptionConfig<'_> {
    fn default() -> Self {
        Self {
            deserialize: None,
            qos: QosPolicy::default(),
            exception_callback: None,
            user_metadata: None,
        }
    }
}

impl SubscriptionConfig<'_> {
    /// Reset every field to its default
    pub fn fill_defaults(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Debug for SubscriptionConfig<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionConfig")
            .field("deserialize", &self.deserialize.is_some())
            .field("qos", &self.qos)
            .field("exception_callback", &self.exception_callback.is_some())
            .field("user_metadata", &self.user_metadata.is_some())
            .finish()
    }
}

/// One subscription table entry
pub(super) struct SubscriptionSlot<'a, E> {
    pub(super) entity: E,
    pub(super) message_type: &'a MessageType,
    pub(super) buffer: &'a mut [u8],
    pub(super) topic: Name,
    pub(super) qos: QosPolicy,
    pub(super) queue_length: usize,
    pub(super) callback: SubscriptionCallback<'a>,
    pub(super) deserialize: Option<DeserializeFn>,
    pub(super) exception_callback: Option<SubscriptionExceptionCallback<'a>>,
    pub(super) user_metadata: UserMetadata<'a>,
    #[cfg(feature = "deserialize-static")]
    pub(super) scratch: [u8; MAX_MESSAGE_SIZE],
}

impl<E> SubscriptionSlot<'_, E> {
    /// Log a receive failure and hand it to the exception callback
    pub(super) fn report(&self, handle: SubscriptionHandle, error: Error) {
        log::warn!("[spin] {:?} on '{}': {}", handle, self.topic, error);
        if let Some(callback) = self.exception_callback {
            callback(handle, error);
        }
    }
}

impl<'a, M: Middleware, const NODES: usize, const PUBS: usize, const SUBS: usize>
    Client<'a, M, NODES, PUBS, SUBS>
{
    /// Create a subscription on `node`
    ///
    /// # Arguments
    ///
    /// * `message_type` - Descriptor of the received type
    /// * `topic_name` - Topic, non-empty, at most `MAX_TOPIC_NAME_LEN` bytes
    /// * `callback` - Invoked from spin for every received message
    /// * `queue_length` - Incoming queue depth, at least 1
    /// * `buffer` - Queue storage, at least `message_size * queue_length` bytes
    /// * `config` - Optional settings, `None` for defaults
    ///
    /// # Errors
    ///
    /// - [`Error::NullPointer`] for the null node handle
    /// - [`Error::AlreadyDone`] for a destroyed node
    /// - [`Error::InvalidParameter`] for a bad topic, queue length or buffer,
    ///   or a deserializer the build cannot honour
    /// - [`Error::OutOfSpace`] if the node owns `SUBS` subscriptions already
    /// - any middleware error, unchanged (the slot is rolled back)
    #[allow(clippy::too_many_arguments)]
    pub fn subscription_create(
        &mut self,
        node: NodeHandle,
        message_type: &'a MessageType,
        topic_name: &str,
        callback: SubscriptionCallback<'a>,
        queue_length: usize,
        buffer: &'a mut [u8],
        config: Option<&SubscriptionConfig<'a>>,
    ) -> Result<SubscriptionHandle> {
        if node.is_null() {
            return Err(Error::NullPointer);
        }
        self.ensure_initialized()?;
        let topic = bounded_name(topic_name, false)?;
        check_queue(message_type, queue_length, buffer)?;

        let config = config.copied().unwrap_or_default();
        if config.deserialize.is_some() {
            if DESERIALIZATION_SUPPORT == DeserializationSupport::Disabled {
                log::warn!(
                    "[subscription_create] '{}': deserializer given but deserialization is disabled",
                    topic_name
                );
                return Err(Error::InvalidParameter);
            }
            if message_type.message_size() > MAX_MESSAGE_SIZE {
                return Err(Error::InvalidParameter);
            }
        }

        let params = SubscriptionParams {
            message_type,
            topic_name,
            queue_length,
            qos: config.qos,
        };

        let middleware = &mut self.middleware;
        let owner = self.nodes.get_mut(node.slot())?;
        let node_entity = &mut owner.entity;
        let slot = owner.subscriptions.insert_with(|index| {
            let entity = middleware
                .subscription_create(node_entity, &params, &mut *buffer)
                .inspect_err(|e| {
                    log::warn!(
                        "[subscription_create] '{}' rejected by middleware: {} (slot {} rolled back)",
                        topic_name,
                        e,
                        index
                    )
                })?;
            Ok(SubscriptionSlot {
                entity,
                message_type,
                buffer,
                topic,
                qos: config.qos,
                queue_length,
                callback,
                deserialize: config.deserialize,
                exception_callback: config.exception_callback,
                user_metadata: config.user_metadata,
                #[cfg(feature = "deserialize-static")]
                scratch: [0; MAX_MESSAGE_SIZE],
            })
        })?;

        let handle = SubscriptionHandle::new(node.slot(), slot);
        log::debug!(
            "[subscription_create] {:?} topic='{}' type={} depth={}",
            handle,
            topic_name,
            message_type.name(),
            queue_length
        );
        Ok(handle)
    }

    /// Destroy a subscription
    ///
    /// # Errors
    ///
    /// - [`Error::NullPointer`] for the null handle
    /// - [`Error::AlreadyDone`] if already destroyed
    /// - any middleware error, unchanged (the subscription stays live)
    pub fn subscription_destroy(&mut self, subscription: SubscriptionHandle) -> Result<()> {
        if subscription.is_null() {
            return Err(Error::NullPointer);
        }
        self.ensure_initialized()?;

        let middleware = &mut self.middleware;
        let owner = self.nodes.get_mut(subscription.node().slot())?;
        owner
            .subscriptions
            .release_with(subscription.slot(), |slot| {
                middleware.subscription_destroy(&mut slot.entity)
            })
            .inspect_err(|e| {
                log::warn!("[subscription_destroy] {:?} failed: {}", subscription, e)
            })?;

        log::debug!("[subscription_destroy] {:?} released", subscription);
        Ok(())
    }

    /// User metadata of a live subscription
    pub fn subscription_user_metadata(&self, subscription: SubscriptionHandle) -> UserMetadata<'a> {
        self.subscription_slot(subscription)?.user_metadata
    }

    /// QoS of a live subscription
    pub fn subscription_qos(&self, subscription: SubscriptionHandle) -> Option<QosPolicy> {
        self.subscription_slot(subscription).map(|slot| slot.qos)
    }

    /// Topic of a live subscription
    pub fn subscription_topic_name(&self, subscription: SubscriptionHandle) -> Option<&str> {
        self.subscription_slot(subscription)
            .map(|slot| slot.topic.as_str())
    }

    /// Message type of a live subscription
    pub fn subscription_message_type(
        &self,
        subscription: SubscriptionHandle,
    ) -> Option<&'a MessageType> {
        self.subscription_slot(subscription)
            .map(|slot| slot.message_type)
    }

    fn subscription_slot(
        &self,
        subscription: SubscriptionHandle,
    ) -> Option<&SubscriptionSlot<'a, M::Subscription>> {
        self.nodes
            .get(subscription.node().slot())
            .ok()?
            .subscriptions
            .get(subscription.slot())
            .ok()
    }
}
