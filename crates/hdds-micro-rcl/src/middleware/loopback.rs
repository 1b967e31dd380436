// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Loopback middleware (intra-process)
//!
//! Delivers every published message to the matching subscriptions of the
//! same middleware instance. Useful for host testing and for devices where
//! producers and consumers share one image.
//!
//! Matching: same topic name, and the writer's offered QoS satisfies the
//! reader's requested QoS (a reliable reader ignores best-effort writers).
//! A publisher created without a topic matches no reader.
//!
//! Each reader keeps at most `min(DEPTH, queue_length)` pending samples.
//! When full, a best-effort reader drops its oldest sample; a reliable
//! reader makes the publish fail with [`Error::OutOfSpace`] before any reader
//! is touched.

use core::ops::Range;

use heapless::{Deque, String, Vec};

use super::{Middleware, PublisherParams, SubscriptionParams};
use crate::config::{ClientConfig, MAX_MESSAGE_SIZE, MAX_TOPIC_NAME_LEN};
use crate::error::{Error, Result};
use crate::qos::{QosPolicy, Reliability};

type Sample = Vec<u8, MAX_MESSAGE_SIZE>;
type Topic = String<MAX_TOPIC_NAME_LEN>;

fn topic_from(name: &str) -> Result<Topic> {
    let mut topic = Topic::new();
    topic
        .push_str(name)
        .map_err(|()| Error::InvalidParameter)?;
    Ok(topic)
}

struct Reader<const DEPTH: usize> {
    id: u32,
    topic: Topic,
    qos: QosPolicy,
    depth: usize,
    pending: Deque<Sample, DEPTH>,
}

impl<const DEPTH: usize> Reader<DEPTH> {
    fn is_full(&self) -> bool {
        self.pending.len() >= self.depth
    }

    fn accepts(&self, topic: &Topic, offered: &QosPolicy) -> bool {
        self.topic == *topic && offered.is_compatible_with(&self.qos)
    }
}

/// Loopback node entity
#[derive(Debug, PartialEq, Eq)]
pub struct LoopbackNode {
    id: u32,
}

impl LoopbackNode {
    /// Backend-assigned id
    pub const fn id(&self) -> u32 {
        self.id
    }
}

/// Loopback publisher entity
#[derive(Debug)]
pub struct LoopbackPublisher {
    id: u32,
    topic: Option<Topic>,
    qos: QosPolicy,
}

impl LoopbackPublisher {
    /// Backend-assigned id
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Topic this publisher writes to, if any
    pub fn topic_name(&self) -> Option<&str> {
        self.topic.as_deref()
    }
}

/// Loopback subscription entity
#[derive(Debug, PartialEq, Eq)]
pub struct LoopbackSubscription {
    id: u32,
}

impl LoopbackSubscription {
    /// Backend-assigned id
    pub const fn id(&self) -> u32 {
        self.id
    }
}

/// Loopback counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopbackStats {
    /// Successful publish calls
    pub published: u64,
    /// Samples handed to subscriptions by `subscription_take`
    pub delivered: u64,
    /// Samples discarded (best-effort overflow, oversized for the reader buffer)
    pub dropped: u64,
    /// `node_spin` passes
    pub spins: u64,
}

/// Intra-process middleware with `READERS` subscription slots of `DEPTH` samples
pub struct LoopbackMiddleware<const READERS: usize = 4, const DEPTH: usize = 4> {
    initialized: bool,
    domain_id: u32,
    next_id: u32,
    live_nodes: usize,
    readers: Vec<Reader<DEPTH>, READERS>,
    stats: LoopbackStats,
}

impl<const READERS: usize, const DEPTH: usize> LoopbackMiddleware<READERS, DEPTH> {
    /// Create an uninitialized loopback middleware
    pub const fn new() -> Self {
        Self {
            initialized: false,
            domain_id: 0,
            next_id: 1,
            live_nodes: 0,
            readers: Vec::new(),
            stats: LoopbackStats {
                published: 0,
                delivered: 0,
                dropped: 0,
                spins: 0,
            },
        }
    }

    /// Whether `init` ran
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Domain ID given to `init`
    pub const fn domain_id(&self) -> u32 {
        self.domain_id
    }

    /// Number of live node entities
    pub const fn node_count(&self) -> usize {
        self.live_nodes
    }

    /// Number of live subscription entities
    pub fn reader_count(&self) -> usize {
        self.readers.len()
    }

    /// Samples waiting for `subscription`
    pub fn pending(&self, subscription: &LoopbackSubscription) -> usize {
        self.readers
            .iter()
            .find(|r| r.id == subscription.id)
            .map_or(0, |r| r.pending.len())
    }

    /// Counters
    pub const fn stats(&self) -> LoopbackStats {
        self.stats
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        id
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(Error::NotInitialized)
        }
    }
}

impl<const READERS: usize, const DEPTH: usize> Default for LoopbackMiddleware<READERS, DEPTH> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const READERS: usize, const DEPTH: usize> Middleware for LoopbackMiddleware<READERS, DEPTH> {
    type Config = ();
    type Node = LoopbackNode;
    type Publisher = LoopbackPublisher;
    type Subscription = LoopbackSubscription;

    fn init(&mut self, config: &ClientConfig<()>) -> Result<()> {
        if self.initialized {
            return Err(Error::AlreadyDone);
        }
        self.domain_id = config.domain_id;
        self.initialized = true;
        log::debug!("[loopback] initialized on domain {}", config.domain_id);
        Ok(())
    }

    fn node_create(&mut self, name: &str, namespace: &str) -> Result<LoopbackNode> {
        self.ensure_initialized()?;
        let id = self.allocate_id();
        self.live_nodes += 1;
        log::trace!("[loopback] node {} = {}/{}", id, namespace, name);
        Ok(LoopbackNode { id })
    }

    fn node_destroy(&mut self, _node: &mut LoopbackNode) -> Result<()> {
        self.live_nodes = self.live_nodes.saturating_sub(1);
        Ok(())
    }

    fn node_spin(&mut self, _node: &mut LoopbackNode) -> Result<()> {
        // Delivery happens at publish time; nothing is in flight.
        self.stats.spins += 1;
        Ok(())
    }

    fn subscription_create(
        &mut self,
        _node: &mut LoopbackNode,
        params: &SubscriptionParams<'_>,
        _buffer: &mut [u8],
    ) -> Result<LoopbackSubscription> {
        self.ensure_initialized()?;
        if self.readers.is_full() {
            return Err(Error::OutOfSpace);
        }

        let id = self.allocate_id();
        let reader = Reader {
            id,
            topic: topic_from(params.topic_name)?,
            qos: params.qos,
            depth: params.queue_length.min(DEPTH),
            pending: Deque::new(),
        };
        self.readers.push(reader).map_err(|_| Error::OutOfSpace)?;

        Ok(LoopbackSubscription { id })
    }

    fn subscription_destroy(&mut self, subscription: &mut LoopbackSubscription) -> Result<()> {
        let index = self
            .readers
            .iter()
            .position(|r| r.id == subscription.id)
            .ok_or(Error::AlreadyDone)?;
        self.readers.swap_remove(index);
        Ok(())
    }

    fn subscription_take(
        &mut self,
        subscription: &mut LoopbackSubscription,
        buffer: &mut [u8],
    ) -> Result<Option<Range<usize>>> {
        let reader = self
            .readers
            .iter_mut()
            .find(|r| r.id == subscription.id)
            .ok_or(Error::AlreadyDone)?;

        let Some(sample) = reader.pending.pop_front() else {
            return Ok(None);
        };

        let Some(dst) = buffer.get_mut(..sample.len()) else {
            self.stats.dropped += 1;
            return Err(Error::OutOfSpace);
        };
        dst.copy_from_slice(&sample);
        self.stats.delivered += 1;

        Ok(Some(0..sample.len()))
    }

    fn publisher_create(
        &mut self,
        _node: &mut LoopbackNode,
        params: &PublisherParams<'_>,
        _buffer: &mut [u8],
    ) -> Result<LoopbackPublisher> {
        self.ensure_initialized()?;
        Ok(LoopbackPublisher {
            id: self.allocate_id(),
            topic: params.topic_name.map(topic_from).transpose()?,
            qos: params.qos,
        })
    }

    fn publisher_destroy(&mut self, _publisher: &mut LoopbackPublisher) -> Result<()> {
        Ok(())
    }

    fn publisher_publish(
        &mut self,
        publisher: &mut LoopbackPublisher,
        _buffer: &mut [u8],
        message: &[u8],
    ) -> Result<()> {
        let sample = Sample::from_slice(message).map_err(|()| Error::InvalidParameter)?;
        let Some(topic) = publisher.topic.as_ref() else {
            self.stats.published += 1;
            return Ok(());
        };
        let offered = &publisher.qos;

        let blocked = self
            .readers
            .iter()
            .filter(|r| r.accepts(topic, offered))
            .any(|r| r.qos.reliability == Reliability::Reliable && r.is_full());
        if blocked {
            return Err(Error::OutOfSpace);
        }

        for reader in self.readers.iter_mut().filter(|r| r.accepts(topic, offered)) {
            if reader.depth == 0 {
                self.stats.dropped += 1;
                continue;
            }
            if reader.is_full() {
                reader.pending.pop_front();
                self.stats.dropped += 1;
            }
            if reader.pending.push_back(sample.clone()).is_err() {
                self.stats.dropped += 1;
            }
        }

        self.stats.published += 1;
        Ok(())
    }
}
