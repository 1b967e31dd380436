// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fixed-capacity slot pools
//!
//! A [`Pool`] is the allocator and ownership authority for one kind of
//! resource. Every slot is in exactly one of three states:
//!
//! ```text
//!            acquire()              commit()
//!   Free  -------------> Reserved ------------> Occupied(T)
//!    ^                      |                        |
//!    |   Reservation drop   |                        |
//!    +----------------------+                        |
//!    |           release_with() == Ok                |
//!    +-----------------------------------------------+
//! ```
//!
//! `Reserved` only exists while a [`Reservation`] is alive, and a
//! reservation borrows the pool mutably, so it can never escape a create
//! call. Each commit bumps the slot generation; ids carrying an older
//! generation are rejected with [`Error::AlreadyDone`].

use crate::error::{Error, Result};
use crate::handle::SlotId;

enum Slot<T> {
    Free,
    Reserved,
    Occupied(T),
}

struct Entry<T> {
    generation: u32,
    slot: Slot<T>,
}

impl<T> Entry<T> {
    const fn vacant() -> Self {
        Self {
            generation: 0,
            slot: Slot::Free,
        }
    }
}

/// Observable state of one slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Available for the next `acquire`
    Free,
    /// Held by a live [`Reservation`]
    Reserved,
    /// Holds a committed resource
    Occupied,
}

/// Fixed table of `N` slots holding `T`
pub struct Pool<T, const N: usize> {
    entries: [Entry<T>; N],
}

impl<T, const N: usize> Pool<T, N> {
    const INDEX_FITS: () = assert!(N <= u16::MAX as usize, "pool capacity exceeds u16 slot index");

    /// Create a pool with every slot free
    pub fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::INDEX_FITS;

        Self {
            entries: core::array::from_fn(|_| Entry::vacant()),
        }
    }

    /// Number of slots
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.slot, Slot::Occupied(_)))
            .count()
    }

    /// Whether no slot is occupied
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether no slot is free
    pub fn is_full(&self) -> bool {
        !self.entries.iter().any(|e| matches!(e.slot, Slot::Free))
    }

    /// State of the slot at `index` (`None` if out of range)
    pub fn slot_state(&self, index: usize) -> Option<SlotState> {
        self.entries.get(index).map(|e| match e.slot {
            Slot::Free => SlotState::Free,
            Slot::Reserved => SlotState::Reserved,
            Slot::Occupied(_) => SlotState::Occupied,
        })
    }

    /// Reserve the first free slot
    ///
    /// The scan stops at the first free slot; exactly one slot changes state.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfSpace`] if every slot is reserved or occupied.
    pub fn acquire(&mut self) -> Result<Reservation<'_, T, N>> {
        let index = self
            .entries
            .iter()
            .position(|e| matches!(e.slot, Slot::Free))
            .ok_or(Error::OutOfSpace)?;

        self.entries[index].slot = Slot::Reserved;

        Ok(Reservation { pool: self, index })
    }

    /// Reserve a slot, build its value, then commit or roll back
    ///
    /// `build` receives the reserved index. If it fails the slot is freed
    /// again and its error is returned unchanged.
    pub fn insert_with<F>(&mut self, build: F) -> Result<SlotId>
    where
        F: FnOnce(usize) -> Result<T>,
    {
        let reservation = self.acquire()?;
        let value = build(reservation.index())?;
        Ok(reservation.commit(value))
    }

    /// Borrow the value behind a live id
    ///
    /// # Errors
    ///
    /// - [`Error::NullPointer`] for the null id
    /// - [`Error::InvalidParameter`] if the index is out of range
    /// - [`Error::AlreadyDone`] if the slot is not occupied by that generation
    pub fn get(&self, id: SlotId) -> Result<&T> {
        if id.is_null() {
            return Err(Error::NullPointer);
        }
        let entry = self.entries.get(id.index()).ok_or(Error::InvalidParameter)?;
        match &entry.slot {
            Slot::Occupied(value) if entry.generation == id.generation() => Ok(value),
            _ => Err(Error::AlreadyDone),
        }
    }

    /// Mutably borrow the value behind a live id (same errors as [`Pool::get`])
    pub fn get_mut(&mut self, id: SlotId) -> Result<&mut T> {
        if id.is_null() {
            return Err(Error::NullPointer);
        }
        let entry = self
            .entries
            .get_mut(id.index())
            .ok_or(Error::InvalidParameter)?;
        match &mut entry.slot {
            Slot::Occupied(value) if entry.generation == id.generation() => Ok(value),
            _ => Err(Error::AlreadyDone),
        }
    }

    /// Whether `id` names a live occupant
    pub fn contains(&self, id: SlotId) -> bool {
        self.get(id).is_ok()
    }

    /// Tear down the occupant of `id` and free its slot
    ///
    /// `destroy` runs on the value in place. The slot is freed only if it
    /// returns `Ok`; otherwise the slot stays occupied (the caller may retry)
    /// and the error is returned.
    pub fn release_with<F>(&mut self, id: SlotId, destroy: F) -> Result<T>
    where
        F: FnOnce(&mut T) -> Result<()>,
    {
        destroy(self.get_mut(id)?)?;

        let entry = self
            .entries
            .get_mut(id.index())
            .ok_or(Error::InvalidParameter)?;
        match core::mem::replace(&mut entry.slot, Slot::Free) {
            Slot::Occupied(value) => Ok(value),
            other => {
                entry.slot = other;
                Err(Error::AlreadyDone)
            }
        }
    }

    /// Id of the first occupied slot
    pub fn first(&self) -> Option<SlotId> {
        self.iter().next().map(|(id, _)| id)
    }

    /// Iterate over occupied slots
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &T)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| match &entry.slot {
                Slot::Occupied(value) => Some((SlotId::new(index as u16, entry.generation), value)),
                _ => None,
            })
    }

    /// Iterate mutably over occupied slots
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (SlotId, &mut T)> + '_ {
        self.entries
            .iter_mut()
            .enumerate()
            .filter_map(|(index, entry)| match &mut entry.slot {
                Slot::Occupied(value) => Some((SlotId::new(index as u16, entry.generation), value)),
                _ => None,
            })
    }
}

impl<T, const N: usize> Default for Pool<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Generation that follows `current`, skipping the null generation
const fn next_generation(current: u32) -> u32 {
    match current.wrapping_add(1) {
        0 => 1,
        next => next,
    }
}

/// A slot held in the reserved-pending state
///
/// Dropping the reservation without calling [`Reservation::commit`] returns
/// the slot to `Free`.
pub struct Reservation<'p, T, const N: usize> {
    pool: &'p mut Pool<T, N>,
    index: usize,
}

impl<T, const N: usize> Reservation<'_, T, N> {
    /// Index of the reserved slot
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Store `value` in the slot and issue its id
    pub fn commit(self, value: T) -> SlotId {
        let entry = &mut self.pool.entries[self.index];
        entry.generation = next_generation(entry.generation);
        entry.slot = Slot::Occupied(value);
        SlotId::new(self.index as u16, entry.generation)
    }
}

impl<T, const N: usize> Drop for Reservation<'_, T, N> {
    fn drop(&mut self) {
        if let Some(entry) = self.pool.entries.get_mut(self.index) {
            if matches!(entry.slot, Slot::Reserved) {
                entry.slot = Slot::Free;
            }
        }
    }
}
