// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Quality of Service policies
//!
//! Attached to a publisher or subscription at creation, immutable afterwards.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Delivery guarantee of a topic endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Reliability {
    /// Fire-and-forget, samples may be dropped
    #[default]
    BestEffort,
    /// Samples are not dropped silently
    Reliable,
}

/// QoS policy for publishers and subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QosPolicy {
    /// Reliability (default: BEST_EFFORT)
    pub reliability: Reliability,
}

impl QosPolicy {
    /// BEST_EFFORT policy (the default)
    pub const BEST_EFFORT: Self = Self {
        reliability: Reliability::BestEffort,
    };

    /// RELIABLE policy
    pub const RELIABLE: Self = Self {
        reliability: Reliability::Reliable,
    };

    /// Requested/offered compatibility (`self` offered by a writer)
    ///
    /// A reliable reader never matches a best-effort writer.
    pub const fn is_compatible_with(&self, requested: &QosPolicy) -> bool {
        !matches!(
            (self.reliability, requested.reliability),
            (Reliability::BestEffort, Reliability::Reliable)
        )
    }
}
