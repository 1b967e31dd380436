// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Shared fixtures: a scriptable middleware and a couple of message types.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::ops::Range;

use hdds_micro_rcl::middleware::{Middleware, PublisherParams, SubscriptionParams};
use hdds_micro_rcl::{ClientConfig, Error, MessageType, Result};

/// Identity (de)serializer.
pub fn copy(input: &[u8], out: &mut [u8]) -> Result<usize> {
    let dst = out.get_mut(..input.len()).ok_or(Error::OutOfSpace)?;
    dst.copy_from_slice(input);
    Ok(input.len())
}

/// Serializer that byte-swaps a `u32`.
pub fn swap_u32(input: &[u8], out: &mut [u8]) -> Result<usize> {
    let bytes: [u8; 4] = input.try_into().map_err(|_| Error::InvalidParameter)?;
    let swapped = u32::from_le_bytes(bytes).swap_bytes().to_le_bytes();
    copy(&swapped, out)
}

/// Serializer that always fails.
pub fn refuse(_input: &[u8], _out: &mut [u8]) -> Result<usize> {
    Err(Error::Generic)
}

pub static U32: MessageType = MessageType::new("std_msgs/UInt32", 4, copy, copy);
pub static SWAPPED_U32: MessageType = MessageType::new("test/SwappedU32", 4, swap_u32, swap_u32);
pub static BROKEN: MessageType = MessageType::new("test/Broken", 4, refuse, refuse);

/// Per-operation call counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Calls {
    pub init: usize,
    pub node_create: usize,
    pub node_destroy: usize,
    pub node_spin: usize,
    pub publisher_create: usize,
    pub publisher_destroy: usize,
    pub publish: usize,
    pub subscription_create: usize,
    pub subscription_destroy: usize,
    pub take: usize,
}

#[derive(Debug, PartialEq, Eq)]
pub struct MockNode(pub u32);

#[derive(Debug, PartialEq, Eq)]
pub struct MockPublisher(pub u32);

#[derive(Debug, PartialEq, Eq)]
pub struct MockSubscription(pub u32);

/// Middleware whose next call of each kind can be told to fail.
///
/// Every `fail_*` field is one-shot: it is taken by the next matching call.
#[derive(Debug, Default)]
pub struct MockMiddleware {
    pub calls: Calls,
    pub fail_init: Option<Error>,
    pub fail_node_create: Option<Error>,
    pub fail_node_destroy: Option<Error>,
    pub fail_node_spin: Option<Error>,
    pub fail_publisher_create: Option<Error>,
    pub fail_publisher_destroy: Option<Error>,
    pub fail_publish: Option<Error>,
    pub fail_subscription_create: Option<Error>,
    pub fail_subscription_destroy: Option<Error>,
    pub fail_take: Option<Error>,
    /// Range returned by the next take instead of the real one
    pub bogus_range: Option<Range<usize>>,
    /// Address and length of the last message handed to `publisher_publish`
    pub last_publish: Option<(usize, usize)>,
    /// Every message published, in order
    pub published: Vec<Vec<u8>>,
    /// Topics seen by `publisher_create` and `subscription_create`
    pub topics: Vec<String>,
    /// Buffer lengths lent at create time
    pub create_buffers: Vec<usize>,
    /// Backend ids handed out by `subscription_create`, in order
    pub subscription_ids: Vec<u32>,
    /// Messages waiting to be taken, per subscription id
    pub inbox: HashMap<u32, VecDeque<Vec<u8>>>,
    pub live_nodes: usize,
    pub live_publishers: usize,
    pub live_subscriptions: usize,
    next_id: u32,
}

impl MockMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `message` for the subscription with backend id `id`.
    pub fn push_inbound(&mut self, id: u32, message: &[u8]) {
        self.inbox.entry(id).or_default().push_back(message.to_vec());
    }

    pub fn pending(&self, id: u32) -> usize {
        self.inbox.get(&id).map_or(0, VecDeque::len)
    }

    fn allocate_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

impl Middleware for MockMiddleware {
    type Config = u8;
    type Node = MockNode;
    type Publisher = MockPublisher;
    type Subscription = MockSubscription;

    fn init(&mut self, _config: &ClientConfig<u8>) -> Result<()> {
        self.calls.init += 1;
        if let Some(e) = self.fail_init.take() {
            return Err(e);
        }
        Ok(())
    }

    fn node_create(&mut self, _name: &str, _namespace: &str) -> Result<MockNode> {
        self.calls.node_create += 1;
        if let Some(e) = self.fail_node_create.take() {
            return Err(e);
        }
        self.live_nodes += 1;
        Ok(MockNode(self.allocate_id()))
    }

    fn node_destroy(&mut self, _node: &mut MockNode) -> Result<()> {
        self.calls.node_destroy += 1;
        if let Some(e) = self.fail_node_destroy.take() {
            return Err(e);
        }
        self.live_nodes -= 1;
        Ok(())
    }

    fn node_spin(&mut self, _node: &mut MockNode) -> Result<()> {
        self.calls.node_spin += 1;
        if let Some(e) = self.fail_node_spin.take() {
            return Err(e);
        }
        Ok(())
    }

    fn subscription_create(
        &mut self,
        _node: &mut MockNode,
        params: &SubscriptionParams<'_>,
        buffer: &mut [u8],
    ) -> Result<MockSubscription> {
        self.calls.subscription_create += 1;
        if let Some(e) = self.fail_subscription_create.take() {
            return Err(e);
        }
        self.topics.push(params.topic_name.to_owned());
        self.create_buffers.push(buffer.len());
        self.live_subscriptions += 1;
        let id = self.allocate_id();
        self.subscription_ids.push(id);
        Ok(MockSubscription(id))
    }

    fn subscription_destroy(&mut self, subscription: &mut MockSubscription) -> Result<()> {
        self.calls.subscription_destroy += 1;
        if let Some(e) = self.fail_subscription_destroy.take() {
            return Err(e);
        }
        self.inbox.remove(&subscription.0);
        self.live_subscriptions -= 1;
        Ok(())
    }

    fn subscription_take(
        &mut self,
        subscription: &mut MockSubscription,
        buffer: &mut [u8],
    ) -> Result<Option<Range<usize>>> {
        self.calls.take += 1;
        if let Some(e) = self.fail_take.take() {
            return Err(e);
        }
        let Some(message) = self.inbox.get_mut(&subscription.0).and_then(VecDeque::pop_front)
        else {
            return Ok(None);
        };
        if let Some(range) = self.bogus_range.take() {
            return Ok(Some(range));
        }
        buffer[..message.len()].copy_from_slice(&message);
        Ok(Some(0..message.len()))
    }

    fn publisher_create(
        &mut self,
        _node: &mut MockNode,
        params: &PublisherParams<'_>,
        buffer: &mut [u8],
    ) -> Result<MockPublisher> {
        self.calls.publisher_create += 1;
        if let Some(e) = self.fail_publisher_create.take() {
            return Err(e);
        }
        self.topics.push(params.topic_name.unwrap_or_default().to_owned());
        self.create_buffers.push(buffer.len());
        self.live_publishers += 1;
        Ok(MockPublisher(self.allocate_id()))
    }

    fn publisher_destroy(&mut self, _publisher: &mut MockPublisher) -> Result<()> {
        self.calls.publisher_destroy += 1;
        if let Some(e) = self.fail_publisher_destroy.take() {
            return Err(e);
        }
        self.live_publishers -= 1;
        Ok(())
    }

    fn publisher_publish(
        &mut self,
        _publisher: &mut MockPublisher,
        _buffer: &mut [u8],
        message: &[u8],
    ) -> Result<()> {
        self.calls.publish += 1;
        self.last_publish = Some((message.as_ptr() as usize, message.len()));
        if let Some(e) = self.fail_publish.take() {
            return Err(e);
        }
        self.published.push(message.to_vec());
        Ok(())
    }
}
