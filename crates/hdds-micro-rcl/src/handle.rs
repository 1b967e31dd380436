// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Opaque handles to pooled resources
//!
//! A handle names a slot by index and the generation of the occupant it was
//! issued for. Generation `0` is never issued: the all-zero value is the null
//! handle, which is also what `Default` yields.
//!
//! Generations are 32 bits wide. A handle only aliases a later occupant of
//! its slot after 2^32 - 1 reissues of that one slot.

use core::fmt;

/// Slot index + generation inside one pool
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SlotId {
    index: u16,
    generation: u32,
}

impl SlotId {
    /// The null slot id
    pub const NULL: Self = Self {
        index: 0,
        generation: 0,
    };

    pub(crate) const fn new(index: u16, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index inside the pool
    pub const fn index(&self) -> usize {
        self.index as usize
    }

    /// Generation of the occupant this id was issued for
    pub const fn generation(&self) -> u32 {
        self.generation
    }

    /// Whether this is the null id
    pub const fn is_null(&self) -> bool {
        self.generation == 0
    }
}

impl fmt::Debug for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "null")
        } else {
            write!(f, "{}#{}", self.index, self.generation)
        }
    }
}

/// Handle to a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NodeHandle {
    slot: SlotId,
}

impl NodeHandle {
    pub(crate) const fn new(slot: SlotId) -> Self {
        Self { slot }
    }

    /// The null node handle
    pub const fn null() -> Self {
        Self { slot: SlotId::NULL }
    }

    /// Whether this is the null handle
    pub const fn is_null(&self) -> bool {
        self.slot.is_null()
    }

    /// Slot occupied by this node in the node table
    pub const fn slot_index(&self) -> usize {
        self.slot.index()
    }

    pub(crate) const fn slot(&self) -> SlotId {
        self.slot
    }
}

macro_rules! endpoint_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name {
            node: SlotId,
            slot: SlotId,
        }

        impl $name {
            pub(crate) const fn new(node: SlotId, slot: SlotId) -> Self {
                Self { node, slot }
            }

            /// The null handle
            pub const fn null() -> Self {
                Self {
                    node: SlotId::NULL,
                    slot: SlotId::NULL,
                }
            }

            /// Whether this is the null handle
            pub const fn is_null(&self) -> bool {
                self.node.is_null() || self.slot.is_null()
            }

            /// Node this endpoint was created on
            pub const fn node(&self) -> NodeHandle {
                NodeHandle::new(self.node)
            }

            /// Slot occupied by this endpoint in its node's table
            pub const fn slot_index(&self) -> usize {
                self.slot.index()
            }

            pub(crate) const fn slot(&self) -> SlotId {
                self.slot
            }
        }
    };
}

endpoint_handle!(
    /// Handle to a publisher
    PublisherHandle
);

endpoint_handle!(
    /// Handle to a subscription
    SubscriptionHandle
);
