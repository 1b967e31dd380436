// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Middleware abstraction for HDDS Micro RCL
//!
//! The client never talks to a network. It reserves slots, then asks a
//! [`Middleware`] backend to build, tear down and drive the entities that
//! live in them. A backend can be:
//! - an in-process loopback ([`LoopbackMiddleware`])
//! - an RTPS-lite stack over WiFi UDP / LoRa / serial
//! - an XRCE client talking to an agent
//!
//! ## Design Principles
//!
//! - **Capability typed** - each backend picks its own entity types
//! - **No heap allocations** - caller buffers are lent per call
//! - **Uninterpreted errors** - backends return the crate [`Error`](crate::Error)
//!   and the client forwards it unchanged

use core::ops::Range;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::message::MessageType;
use crate::qos::QosPolicy;

pub mod loopback;

pub use loopback::{LoopbackMiddleware, LoopbackStats};

/// Parameters of a publisher being created
#[derive(Debug, Clone, Copy)]
pub struct PublisherParams<'p> {
    /// Message type published
    pub message_type: &'p MessageType,
    /// Topic name, `None` when the application did not name one
    pub topic_name: Option<&'p str>,
    /// Number of messages the outgoing queue holds
    pub queue_length: usize,
    /// QoS offered
    pub qos: QosPolicy,
}

/// Parameters of a subscription being created
#[derive(Debug, Clone, Copy)]
pub struct SubscriptionParams<'p> {
    /// Message type received
    pub message_type: &'p MessageType,
    /// Topic name
    pub topic_name: &'p str,
    /// Number of messages the incoming queue holds
    pub queue_length: usize,
    /// QoS requested
    pub qos: QosPolicy,
}

/// Middleware backend consumed by [`Client`](crate::Client)
///
/// Implementors must handle:
/// - Session setup (`init`, called exactly once before anything else)
/// - Entity creation/destruction for nodes, publishers and subscriptions
/// - Moving messages (`publisher_publish`, `node_spin`, `subscription_take`)
///
/// Implementors never see pool state. A create that returns `Err` leaves
/// nothing behind on the client side, and a destroy that returns `Err`
/// keeps the entity alive so it can be retried.
pub trait Middleware {
    /// Connection configuration carried in [`ClientConfig::transport`]
    type Config;

    /// Backend state of one node (session-scoped participant)
    type Node;

    /// Backend state of one publisher
    type Publisher;

    /// Backend state of one subscription
    type Subscription;

    /// Initialize the backend
    fn init(&mut self, config: &ClientConfig<Self::Config>) -> Result<()>;

    /// Create the backend entity for a node
    fn node_create(&mut self, name: &str, namespace: &str) -> Result<Self::Node>;

    /// Destroy a node entity
    fn node_destroy(&mut self, node: &mut Self::Node) -> Result<()>;

    /// Service outstanding I/O for a node (one bounded pass)
    ///
    /// Drains outbound queues and pulls inbound data so that following
    /// [`Middleware::subscription_take`] calls can return it. How much work a
    /// single pass does is up to the backend.
    fn node_spin(&mut self, node: &mut Self::Node) -> Result<()>;

    /// Create a subscription entity bound to `node`
    ///
    /// `buffer` is the caller-provided message buffer, at least
    /// `message_size * queue_length` bytes. It is lent again on every
    /// [`Middleware::subscription_take`].
    fn subscription_create(
        &mut self,
        node: &mut Self::Node,
        params: &SubscriptionParams<'_>,
        buffer: &mut [u8],
    ) -> Result<Self::Subscription>;

    /// Destroy a subscription entity
    fn subscription_destroy(&mut self, subscription: &mut Self::Subscription) -> Result<()>;

    /// Move the next received message into `buffer`
    ///
    /// Returns the byte range of the message inside `buffer`, or `None` when
    /// nothing is pending.
    fn subscription_take(
        &mut self,
        subscription: &mut Self::Subscription,
        buffer: &mut [u8],
    ) -> Result<Option<Range<usize>>>;

    /// Create a publisher entity bound to `node`
    ///
    /// `buffer` is the caller-provided outgoing queue storage, at least
    /// `message_size * queue_length` bytes. It is lent again on every
    /// [`Middleware::publisher_publish`].
    fn publisher_create(
        &mut self,
        node: &mut Self::Node,
        params: &PublisherParams<'_>,
        buffer: &mut [u8],
    ) -> Result<Self::Publisher>;

    /// Destroy a publisher entity
    fn publisher_destroy(&mut self, publisher: &mut Self::Publisher) -> Result<()>;

    /// Publish one message (wire bytes)
    fn publisher_publish(
        &mut self,
        publisher: &mut Self::Publisher,
        buffer: &mut [u8],
        message: &[u8],
    ) -> Result<()>;
}
