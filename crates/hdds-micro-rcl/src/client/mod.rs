// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Client context: node manager, endpoint lifecycle and spin loop
//!
//! [`Client`] owns every slot table. Nothing is global: two clients never
//! share state, and each is sized at compile time through its const generic
//! parameters.
//!
//! Every create follows the same protocol:
//!
//! 1. validate arguments (null handles first, before any table is touched)
//! 2. reserve the first free slot
//! 3. delegate entity creation to the [`Middleware`]
//! 4. commit the slot on success, roll it back on failure and return the
//!    middleware error unchanged
//!
//! Every destroy rejects null and stale handles, delegates to the middleware
//! and frees the slot only once the middleware confirmed.
//!
//! # Example
//!
//! ```
//! use hdds_micro_rcl::middleware::LoopbackMiddleware;
//! use hdds_micro_rcl::{Client, ClientConfig, Error};
//!
//! let mut client: Client<'_, LoopbackMiddleware, 2> = Client::new(LoopbackMiddleware::new());
//! assert_eq!(client.node_create("early", ""), Err(Error::NotInitialized));
//!
//! client.init(&ClientConfig::default()).unwrap();
//! let a = client.node_create("a", "/robot").unwrap();
//! let _b = client.node_create("b", "/robot").unwrap();
//! assert_eq!(client.node_create("c", "/robot"), Err(Error::OutOfSpace));
//!
//! client.node_destroy(a).unwrap();
//! assert_eq!(client.node_destroy(a), Err(Error::AlreadyDone));
//! ```

use core::any::Any;

use heapless::String;

use crate::config::{
    ClientConfig, DEFAULT_MAX_NODES, DEFAULT_MAX_PUBLISHERS_PER_NODE,
    DEFAULT_MAX_SUBSCRIPTIONS_PER_NODE, MAX_DOMAIN_ID, MAX_TOPIC_NAME_LEN,
};
use crate::error::{Error, Result};
use crate::handle::NodeHandle;
use crate::message::MessageType;
use crate::middleware::Middleware;
use crate::pool::Pool;

mod publisher;
mod spin;
mod subscription;

pub use publisher::{PublisherConfig, PublisherExceptionCallback};
pub use subscription::{SubscriptionCallback, SubscriptionConfig, SubscriptionExceptionCallback};

use publisher::PublisherSlot;
use subscription::SubscriptionSlot;

/// Caller-supplied metadata attached to an endpoint
///
/// Borrowed for the client's lifetime, never copied or freed. Downcast it
/// with [`Any::downcast_ref`].
pub type UserMetadata<'a> = Option<&'a dyn Any>;

type Name = String<MAX_TOPIC_NAME_LEN>;

/// Copy `value` into a bounded name
fn bounded_name(value: &str, allow_empty: bool) -> Result<Name> {
    if value.is_empty() && !allow_empty {
        return Err(Error::InvalidParameter);
    }
    let mut name = Name::new();
    name.push_str(value).map_err(|()| Error::InvalidParameter)?;
    Ok(name)
}

/// Check queue length and caller buffer size for an endpoint
fn check_queue(message_type: &MessageType, queue_length: usize, buffer: &[u8]) -> Result<()> {
    if queue_length == 0 || message_type.message_size() == 0 {
        return Err(Error::InvalidParameter);
    }
    let needed = message_type
        .queue_bytes(queue_length)
        .ok_or(Error::InvalidParameter)?;
    if buffer.len() < needed {
        return Err(Error::InvalidParameter);
    }
    Ok(())
}

/// One node table entry
struct NodeSlot<'a, M: Middleware, const PUBS: usize, const SUBS: usize> {
    entity: M::Node,
    name: Name,
    namespace: Name,
    publishers: Pool<PublisherSlot<'a, M::Publisher>, PUBS>,
    subscriptions: Pool<SubscriptionSlot<'a, M::Subscription>, SUBS>,
}

/// Client context owning all node, publisher and subscription slots
///
/// # Type parameters
///
/// * `'a` - lifetime of every borrowed buffer, callback and user metadata
/// * `M` - middleware backend
/// * `NODES` - maximum number of nodes
/// * `PUBS` - maximum number of publishers per node
/// * `SUBS` - maximum number of subscriptions per node
///
/// # Design
///
/// - Single-threaded (no async, no locks): `&mut self` serializes callers
/// - Fixed number of nodes/endpoints (compile-time limit)
/// - No cascading in [`Client::node_destroy`]; see [`Client::node_teardown`]
pub struct Client<
    'a,
    M: Middleware,
    const NODES: usize = DEFAULT_MAX_NODES,
    const PUBS: usize = DEFAULT_MAX_PUBLISHERS_PER_NODE,
    const SUBS: usize = DEFAULT_MAX_SUBSCRIPTIONS_PER_NODE,
> {
    middleware: M,
    initialized: bool,
    domain_id: u32,
    nodes: Pool<NodeSlot<'a, M, PUBS, SUBS>, NODES>,
}

impl<'a, M: Middleware, const NODES: usize, const PUBS: usize, const SUBS: usize>
    Client<'a, M, NODES, PUBS, SUBS>
{
    /// Create an uninitialized client around `middleware`
    pub fn new(middleware: M) -> Self {
        Self {
            middleware,
            initialized: false,
            domain_id: 0,
            nodes: Pool::new(),
        }
    }

    /// Initialize the client (and the middleware)
    ///
    /// Must be called once before any other operation.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyDone`] if already initialized
    /// - [`Error::InvalidParameter`] if the domain ID is above 232
    /// - any middleware error, unchanged
    pub fn init(&mut self, config: &ClientConfig<M::Config>) -> Result<()> {
        if self.initialized {
            return Err(Error::AlreadyDone);
        }
        if config.domain_id > MAX_DOMAIN_ID {
            return Err(Error::InvalidParameter);
        }

        self.middleware
            .init(config)
            .inspect_err(|e| log::warn!("[init] middleware init failed: {}", e))?;

        self.initialized = true;
        self.domain_id = config.domain_id;
        log::debug!(
            "[init] client ready: domain={} nodes={} pubs/node={} subs/node={}",
            config.domain_id,
            NODES,
            PUBS,
            SUBS
        );
        Ok(())
    }

    /// Whether [`Client::init`] succeeded
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Domain ID given to [`Client::init`]
    pub const fn domain_id(&self) -> u32 {
        self.domain_id
    }

    /// Get middleware (immutable)
    pub fn middleware(&self) -> &M {
        &self.middleware
    }

    /// Get middleware (mutable)
    pub fn middleware_mut(&mut self) -> &mut M {
        &mut self.middleware
    }

    /// Consume the client, returning the middleware
    pub fn into_middleware(self) -> M {
        self.middleware
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(Error::NotInitialized)
        }
    }

    /// Create a node
    ///
    /// # Arguments
    ///
    /// * `name` - Node name, non-empty, at most `MAX_TOPIC_NAME_LEN` bytes
    /// * `namespace` - Node namespace, may be empty, same length limit
    ///
    /// # Errors
    ///
    /// - [`Error::NotInitialized`] before [`Client::init`]
    /// - [`Error::InvalidParameter`] for a bad name or namespace
    /// - [`Error::OutOfSpace`] if all `NODES` slots are in use
    /// - any middleware error, unchanged (the slot is rolled back)
    pub fn node_create(&mut self, name: &str, namespace: &str) -> Result<NodeHandle> {
        self.ensure_initialized()?;
        let node_name = bounded_name(name, false)?;
        let node_namespace = bounded_name(namespace, true)?;

        let middleware = &mut self.middleware;
        let slot = self
            .nodes
            .insert_with(|index| {
                let entity = middleware.node_create(name, namespace).inspect_err(|e| {
                    log::warn!(
                        "[node_create] '{}' rejected by middleware: {} (slot {} rolled back)",
                        name,
                        e,
                        index
                    )
                })?;
                Ok(NodeSlot {
                    entity,
                    name: node_name,
                    namespace: node_namespace,
                    publishers: Pool::new(),
                    subscriptions: Pool::new(),
                })
            })
            .inspect_err(|e| {
                if *e == Error::OutOfSpace {
                    log::debug!("[node_create] node table full ({} slots)", NODES);
                }
            })?;

        log::debug!("[node_create] '{}' ns='{}' -> {:?}", name, namespace, slot);
        Ok(NodeHandle::new(slot))
    }

    /// Destroy a node
    ///
    /// The node must not own any live publisher or subscription.
    ///
    /// # Errors
    ///
    /// - [`Error::NullPointer`] for the null handle
    /// - [`Error::AlreadyDone`] if the node was already destroyed
    /// - [`Error::ResourcesActive`] if publishers or subscriptions remain
    /// - any middleware error, unchanged (the node stays live)
    pub fn node_destroy(&mut self, node: NodeHandle) -> Result<()> {
        if node.is_null() {
            return Err(Error::NullPointer);
        }
        self.ensure_initialized()?;

        let slot = self.nodes.get(node.slot())?;
        if !slot.publishers.is_empty() || !slot.subscriptions.is_empty() {
            log::warn!(
                "[node_destroy] {:?} still owns {} publisher(s) and {} subscription(s)",
                node,
                slot.publishers.len(),
                slot.subscriptions.len()
            );
            return Err(Error::ResourcesActive);
        }

        let middleware = &mut self.middleware;
        self.nodes
            .release_with(node.slot(), |slot| middleware.node_destroy(&mut slot.entity))
            .inspect_err(|e| log::warn!("[node_destroy] {:?} failed: {}", node, e))?;

        log::debug!("[node_destroy] {:?} released", node);
        Ok(())
    }

    /// Destroy a node together with everything it owns
    ///
    /// Subscriptions go first, then publishers, then the node. Stops at the
    /// first middleware failure and returns it; everything destroyed up to
    /// that point stays destroyed.
    pub fn node_teardown(&mut self, node: NodeHandle) -> Result<()> {
        if node.is_null() {
            return Err(Error::NullPointer);
        }
        self.ensure_initialized()?;

        let middleware = &mut self.middleware;
        let slot = self.nodes.get_mut(node.slot())?;

        while let Some(id) = slot.subscriptions.first() {
            slot.subscriptions
                .release_with(id, |sub| middleware.subscription_destroy(&mut sub.entity))
                .inspect_err(|e| log::warn!("[node_teardown] subscription {:?}: {}", id, e))?;
        }
        while let Some(id) = slot.publishers.first() {
            slot.publishers
                .release_with(id, |publisher| middleware.publisher_destroy(&mut publisher.entity))
                .inspect_err(|e| log::warn!("[node_teardown] publisher {:?}: {}", id, e))?;
        }

        self.node_destroy(node)
    }

    /// Name of a live node
    pub fn node_name(&self, node: NodeHandle) -> Option<&str> {
        self.nodes.get(node.slot()).ok().map(|n| n.name.as_str())
    }

    /// Namespace of a live node
    pub fn node_namespace(&self, node: NodeHandle) -> Option<&str> {
        self.nodes.get(node.slot()).ok().map(|n| n.namespace.as_str())
    }

    /// Whether `node` refers to a live node
    pub fn contains_node(&self, node: NodeHandle) -> bool {
        self.nodes.contains(node.slot())
    }

    /// Number of live nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of live publishers on `node`
    pub fn publisher_count(&self, node: NodeHandle) -> Result<usize> {
        Ok(self.nodes.get(node.slot())?.publishers.len())
    }

    /// Number of live subscriptions on `node`
    pub fn subscription_count(&self, node: NodeHandle) -> Result<usize> {
        Ok(self.nodes.get(node.slot())?.subscriptions.len())
    }
}
