// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Executor: drive a node and dispatch received messages

use super::subscription::SubscriptionSlot;
use super::Client;
use crate::error::{Error, Result};
use crate::handle::{NodeHandle, SubscriptionHandle};
use crate::middleware::Middleware;

impl<'a, M: Middleware, const NODES: usize, const PUBS: usize, const SUBS: usize>
    Client<'a, M, NODES, PUBS, SUBS>
{
    /// Run one executor pass over `node`
    ///
    /// Lets the middleware service the node, then drains each subscription
    /// (at most `queue_length` messages per subscription per pass) into its
    /// callback. A failed take or deserialization goes to that subscription's
    /// exception callback and the pass moves on to the next subscription.
    ///
    /// Returns the number of messages delivered to callbacks.
    ///
    /// # Errors
    ///
    /// - [`Error::NullPointer`] for the null handle
    /// - [`Error::AlreadyDone`] for a destroyed node
    /// - any `node_spin` middleware error, unchanged
    pub fn spin_once(&mut self, node: NodeHandle) -> Result<usize> {
        if node.is_null() {
            return Err(Error::NullPointer);
        }
        self.ensure_initialized()?;

        let owner = self.nodes.get_mut(node.slot())?;
        self.middleware
            .node_spin(&mut owner.entity)
            .inspect_err(|e| log::warn!("[spin_once] {:?} node_spin failed: {}", node, e))?;

        let mut delivered = 0;
        for (id, subscription) in owner.subscriptions.iter_mut() {
            let handle = SubscriptionHandle::new(node.slot(), id);
            for _ in 0..subscription.queue_length {
                match take_one(&mut self.middleware, handle, subscription) {
                    Ok(true) => delivered += 1,
                    Ok(false) => break,
                    Err(e) => {
                        subscription.report(handle, e);
                        break;
                    }
                }
            }
        }

        if delivered > 0 {
            log::trace!("[spin_once] {:?} delivered {} message(s)", node, delivered);
        }
        Ok(delivered)
    }

    /// Spin `node` until it is destroyed
    ///
    /// Returns `Ok(())` once the node is no longer live. `Timeout` from the
    /// middleware is treated as an idle pass; any other error ends the loop,
    /// including an `AlreadyDone` reported by the middleware for a live node.
    pub fn spin_forever(&mut self, node: NodeHandle) -> Result<()> {
        self.spin_while(node, || true)
    }

    /// Spin `node` while `keep_going` returns `true`
    ///
    /// Same termination rules as [`Client::spin_forever`], plus the predicate
    /// (checked before each pass).
    pub fn spin_while<F>(&mut self, node: NodeHandle, mut keep_going: F) -> Result<()>
    where
        F: FnMut() -> bool,
    {
        while keep_going() {
            match self.spin_once(node) {
                Ok(_) | Err(Error::Timeout) => {}
                Err(Error::AlreadyDone) if !self.nodes.contains(node.slot()) => {
                    log::debug!("[spin] {:?} destroyed, leaving executor", node);
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

/// Take one message and hand it to the callback
///
/// `Ok(false)` means the subscription has nothing pending.
fn take_one<M: Middleware>(
    middleware: &mut M,
    handle: SubscriptionHandle,
    subscription: &mut SubscriptionSlot<'_, M::Subscription>,
) -> Result<bool> {
    let taken =
        middleware.subscription_take(&mut subscription.entity, &mut *subscription.buffer)?;
    let Some(range) = taken else {
        return Ok(false);
    };
    let message = subscription.buffer.get(range).ok_or(Error::Generic)?;
    let callback = subscription.callback;
    let metadata = subscription.user_metadata;

    match subscription.deserialize {
        None => callback(handle, message, metadata),

        #[cfg(feature = "deserialize-static")]
        Some(deserialize) => {
            let size = subscription.message_type.message_size();
            let out = subscription
                .scratch
                .get_mut(..size)
                .ok_or(Error::InvalidParameter)?;
            let len = crate::message::decode(deserialize, message, out)?;
            callback(handle, &out[..len], metadata);
        }

        #[cfg(feature = "deserialize-stack")]
        Some(deserialize) => {
            let mut scratch = [0u8; crate::config::MAX_MESSAGE_SIZE];
            let size = subscription.message_type.message_size();
            let out = scratch.get_mut(..size).ok_or(Error::InvalidParameter)?;
            let len = crate::message::decode(deserialize, message, out)?;
            callback(handle, &out[..len], metadata);
        }

        #[cfg(not(any(feature = "deserialize-static", feature = "deserialize-stack")))]
        Some(_) => return Err(Error::InvalidParameter),
    }
    Ok(true)
}
