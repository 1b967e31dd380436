// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # HDDS Micro RCL - Allocation-free client runtime
//!
//! A `no_std` client library that lets embedded applications create ROS-style
//! nodes, publishers and subscriptions on top of a pluggable middleware, with
//! every resource carved out of fixed-capacity slot tables.
//!
//! ## Design Constraints
//!
//! - **No heap allocations** (const generics size every table)
//! - **Single cooperative context** (`&mut self` everywhere, no locks)
//! - **Middleware agnostic** (the [`Middleware`] trait is the only seam)
//! - **`no_std` compatible**
//!
//! ## Architecture
//!
//! ```text
//! +-----------------------------------------+
//! |  Application (User Code)                |
//! +-----------------------------------------+
//!           v                    ^
//! +-----------------------------------------+
//! |  Client: nodes / publishers / subs      |
//! |  (handle lifecycle, spin loop)          |
//! +-----------------------------------------+
//!           v                    ^
//! +-----------------------------------------+
//! |  Pool (fixed slots, generations)        |
//! +-----------------------------------------+
//!           v                    ^
//! +-----------------------------------------+
//! |  Middleware (loopback, RTPS, XRCE...)   |
//! +-----------------------------------------+
//! ```
//!
//! ## Example
//!
//! ```
//! use hdds_micro_rcl::middleware::LoopbackMiddleware;
//! use hdds_micro_rcl::{Client, ClientConfig, MessageType, PublisherConfig, Result, SubscriptionHandle};
//!
//! fn copy(input: &[u8], out: &mut [u8]) -> Result<usize> {
//!     out[..input.len()].copy_from_slice(input);
//!     Ok(input.len())
//! }
//!
//! static COUNTER: MessageType = MessageType::new("std_msgs/UInt32", 4, copy, copy);
//!
//! # fn main() -> Result<()> {
//! let mut pub_buf = [0u8; 8];
//! let mut sub_buf = [0u8; 8];
//! let on_message = |_sub: SubscriptionHandle, msg: &[u8], _meta: Option<&dyn core::any::Any>| {
//!     assert_eq!(msg, &7u32.to_le_bytes());
//! };
//!
//! let mut client: Client<'_, LoopbackMiddleware, 1, 1, 1> =
//!     Client::new(LoopbackMiddleware::new());
//! client.init(&ClientConfig::default())?;
//!
//! let node = client.node_create("counter", "")?;
//! let config = PublisherConfig {
//!     topic_name: Some("/counter"),
//!     ..PublisherConfig::default()
//! };
//! let publisher = client.publisher_create(node, &COUNTER, 2, &mut pub_buf, Some(&config))?;
//! client.subscription_create(node, &COUNTER, "/counter", &on_message, 2, &mut sub_buf, None)?;
//!
//! client.publish(publisher, &7u32.to_le_bytes())?;
//! assert_eq!(client.spin_once(node)?, 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `std` -- Enable std (for host testing)
//! - `serde` -- Serialize/Deserialize for configuration and QoS types
//! - `deserialize-static` -- per-subscription deserialization scratch in the slot
//! - `deserialize-stack` -- deserialization scratch on the spin stack

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Node, publisher and subscription lifecycle plus the spin loop
pub mod client;

/// Compile-time limits and runtime client configuration
pub mod config;

/// Error types for HDDS Micro RCL
pub mod error;

/// Opaque handles to pooled resources
pub mod handle;

/// Message type descriptors (size + serialization boundary)
pub mod message;

/// Middleware abstraction consumed by the client
pub mod middleware;

/// Fixed-capacity slot pools
pub mod pool;

/// Quality of Service policies
pub mod qos;

// Re-exports for convenience
pub use crate::client::{
    Client, PublisherConfig, PublisherExceptionCallback, SubscriptionCallback,
    SubscriptionConfig, SubscriptionExceptionCallback, UserMetadata,
};
pub use crate::config::{ClientConfig, DeserializationSupport, MAX_MESSAGE_SIZE, MAX_TOPIC_NAME_LEN};
pub use crate::error::{status_code, Error, Result};
pub use crate::handle::{NodeHandle, PublisherHandle, SubscriptionHandle};
pub use crate::message::{DeserializeFn, MessageType, SerializeFn, TypeSupport};
pub use crate::middleware::Middleware;
pub use crate::qos::{QosPolicy, Reliability};

/// Version of HDDS Micro RCL
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
