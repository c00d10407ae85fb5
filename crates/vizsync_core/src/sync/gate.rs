//! # Update Gate
//!
//! One guard, one slot per registered input type, one aggregate dirty flag.
//!
//! ## Architecture
//!
//! ```text
//!                    ┌───────────────────────────────────┐
//!                    │            UpdateGate             │
//!                    │                                   │
//!                    │  Mutex ┌────────┬────────┬─────┐  │
//!                    │        │ slot 0 │ slot 1 │ ... │  │
//!                    │        └────────┴────────┴─────┘  │
//!                    │  AtomicBool dirty (OR of slots)   │
//!                    └───────────────────────────────────┘
//!                          ▲                     │
//!              Updater<T>::update          drain (render thread)
//! ```
//!
//! ## Thread Safety
//!
//! - `Updater<T>` / `update`: any thread, one value move under the guard
//! - `is_dirty`: any thread, lock-free
//! - `drain`, `take`, `clear_dirty`: the single consumer only

use std::any::{Any, TypeId};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{GateError, GateResult};

/// Type-erased view of one input slot.
pub(crate) trait ErasedSlot: Send {
    /// Returns true if a value waits in this slot.
    fn is_pending(&self) -> bool;

    /// Access for downcasting to the concrete `TypedSlot<T>`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Concrete storage for one input type.
pub(crate) struct TypedSlot<T> {
    pub(crate) pending: Option<T>,
}

impl<T: Send + 'static> ErasedSlot for TypedSlot<T> {
    #[inline]
    fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Counters describing producer traffic through a gate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GateStats {
    /// Values stored by producers.
    pub stores: u64,
    /// Stores that overwrote a value the consumer never saw.
    pub coalesced: u64,
    /// Consumer drains that found the gate dirty.
    pub drains: u64,
}

/// Per-plugin-instance handoff point between producers and the render thread.
///
/// Slots are fixed at construction. The slot layout never changes afterwards,
/// so type lookups happen outside the guard.
pub struct UpdateGate {
    /// Pending values, one slot per registered type, in registration order.
    slots: Mutex<Vec<Box<dyn ErasedSlot>>>,
    /// Immutable slot directory (type, name) parallel to `slots`.
    types: Vec<(TypeId, &'static str)>,
    /// Logical OR of all slot flags plus explicit `mark_dirty` requests.
    /// Written only while `slots` is locked.
    dirty: AtomicBool,
    stores: AtomicU64,
    coalesced: AtomicU64,
    drains: AtomicU64,
}

impl UpdateGate {
    /// Starts describing the slots of a new gate.
    #[must_use]
    pub fn builder() -> GateBuilder {
        GateBuilder::default()
    }

    /// Returns whether any update is pending. Lock-free.
    #[inline]
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Flags the gate dirty without storing a value.
    ///
    /// Used when the plugin's state changed through some other route and the
    /// next tick must finalize the artifact anyway.
    ///
    /// Must not be called from inside a merge hook: the guard is held there
    /// and is not reentrant.
    pub fn mark_dirty(&self) {
        let _slots = self.slots.lock();
        self.dirty.store(true, Ordering::Release);
    }

    /// Stores `value` in the slot registered for `T`.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::UnregisteredType`] if no slot exists for `T`.
    pub fn update<T: Send + 'static>(&self, value: T) -> GateResult<()> {
        let index = self.index_of::<T>()?;
        self.store_at(index, value);
        Ok(())
    }

    /// Returns a typed producer handle for `T`.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::UnregisteredType`] if no slot exists for `T`.
    pub fn updater<T: Send + 'static>(self: &Arc<Self>) -> GateResult<Updater<T>> {
        let index = self.index_of::<T>()?;
        Ok(Updater {
            gate: Arc::clone(self),
            index,
            _marker: PhantomData,
        })
    }

    /// Takes the pending value of `T` without touching the aggregate flag.
    ///
    /// Consumer only. Pair with [`clear_dirty`](Self::clear_dirty).
    ///
    /// # Errors
    ///
    /// Returns [`GateError::UnregisteredType`] if no slot exists for `T`.
    pub fn take<T: Send + 'static>(&self) -> GateResult<Option<T>> {
        let index = self.index_of::<T>()?;
        let mut slots = self.slots.lock();
        Ok(slots[index]
            .as_any_mut()
            .downcast_mut::<TypedSlot<T>>()
            .and_then(|slot| slot.pending.take()))
    }

    /// Clears the aggregate flag unless a slot still holds a value.
    ///
    /// Consumer only.
    pub fn clear_dirty(&self) {
        let slots = self.slots.lock();
        let pending = slots.iter().any(|slot| slot.is_pending());
        self.dirty.store(pending, Ordering::Release);
    }

    /// Returns the slot index of `T`, if registered.
    #[must_use]
    pub fn slot_index<T: 'static>(&self) -> Option<usize> {
        let id = TypeId::of::<T>();
        self.types.iter().position(|(t, _)| *t == id)
    }

    /// Number of registered input types.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.types.len()
    }

    /// Names of the registered input types, in registration order.
    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.types.iter().map(|(_, name)| *name)
    }

    /// Returns a snapshot of the traffic counters.
    #[must_use]
    pub fn stats(&self) -> GateStats {
        GateStats {
            stores: self.stores.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            drains: self.drains.load(Ordering::Relaxed),
        }
    }

    fn index_of<T: 'static>(&self) -> GateResult<usize> {
        self.slot_index::<T>().ok_or(GateError::UnregisteredType {
            type_name: std::any::type_name::<T>(),
        })
    }

    /// Stores into a known slot. The dirty flag and the value change together.
    pub(crate) fn store_at<T: Send + 'static>(&self, index: usize, value: T) {
        let mut slots = self.slots.lock();
        let Some(slot) = slots[index].as_any_mut().downcast_mut::<TypedSlot<T>>() else {
            tracing::error!("slot {index} is not a {}", std::any::type_name::<T>());
            return;
        };
        if slot.pending.replace(value).is_some() {
            self.coalesced.fetch_add(1, Ordering::Relaxed);
        }
        self.stores.fetch_add(1, Ordering::Relaxed);
        self.dirty.store(true, Ordering::Release);
    }

    /// Runs `merge` on every pending slot in registration order, then clears
    /// the aggregate flag. All of it happens under the guard.
    ///
    /// Returns how many merges reported that they consumed a value.
    pub(crate) fn drain<F>(&self, mut merge: F) -> usize
    where
        F: FnMut(usize, &mut dyn ErasedSlot) -> bool,
    {
        let mut slots = self.slots.lock();
        let mut merged = 0;
        for (index, slot) in slots.iter_mut().enumerate() {
            if slot.is_pending() && merge(index, &mut **slot) {
                merged += 1;
            }
        }
        self.dirty.store(false, Ordering::Release);
        self.drains.fetch_add(1, Ordering::Relaxed);
        merged
    }
}

impl std::fmt::Debug for UpdateGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateGate")
            .field("types", &self.types.iter().map(|(_, n)| n).collect::<Vec<_>>())
            .field("dirty", &self.is_dirty())
            .field("stats", &self.stats())
            .finish()
    }
}

/// Describes the slots of an [`UpdateGate`] before it is shared.
#[derive(Default)]
pub struct GateBuilder {
    types: Vec<(TypeId, &'static str)>,
    slots: Vec<Box<dyn ErasedSlot>>,
}

impl GateBuilder {
    /// Adds a slot for `T`. Registering the same type twice keeps the first.
    #[must_use]
    pub fn slot<T: Send + 'static>(mut self) -> Self {
        self.push::<T>();
        self
    }

    /// Adds a slot for `T` in place. Returns false if `T` already had one.
    pub fn push<T: Send + 'static>(&mut self) -> bool {
        if self.contains::<T>() {
            tracing::warn!("input type {} registered twice", std::any::type_name::<T>());
            return false;
        }
        self.types.push((TypeId::of::<T>(), std::any::type_name::<T>()));
        self.slots.push(Box::new(TypedSlot::<T> { pending: None }));
        true
    }

    /// Returns true if `T` already has a slot.
    #[must_use]
    pub fn contains<T: 'static>(&self) -> bool {
        let id = TypeId::of::<T>();
        self.types.iter().any(|(t, _)| *t == id)
    }

    /// Number of slots described so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns true if no slot was described.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Freezes the slot layout.
    #[must_use]
    pub fn build(self) -> Arc<UpdateGate> {
        Arc::new(UpdateGate {
            slots: Mutex::new(self.slots),
            types: self.types,
            dirty: AtomicBool::new(false),
            stores: AtomicU64::new(0),
            coalesced: AtomicU64::new(0),
            drains: AtomicU64::new(0),
        })
    }
}

/// Typed producer handle for one slot of a gate.
///
/// Cheap to clone and safe to move to any thread. `update` cannot fail: the
/// slot was resolved when the handle was created.
pub struct Updater<T> {
    gate: Arc<UpdateGate>,
    index: usize,
    _marker: PhantomData<fn(T)>,
}

impl<T: Send + 'static> Updater<T> {
    /// Hands `value` to the render thread, replacing any unconsumed value.
    #[inline]
    pub fn update(&self, value: T) {
        self.gate.store_at(self.index, value);
    }

    /// The gate this handle writes to.
    #[must_use]
    pub fn gate(&self) -> &Arc<UpdateGate> {
        &self.gate
    }
}

impl<T> Clone for Updater<T> {
    fn clone(&self) -> Self {
        Self {
            gate: Arc::clone(&self.gate),
            index: self.index,
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for Updater<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Updater")
            .field("type", &std::any::type_name::<T>())
            .field("slot", &self.index)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn gate() -> Arc<UpdateGate> {
        UpdateGate::builder().slot::<i32>().slot::<String>().build()
    }

    #[test]
    fn test_gate_creation() {
        let gate = gate();
        assert_eq!(gate.slot_count(), 2);
        assert!(!gate.is_dirty());
        assert_eq!(gate.slot_index::<i32>(), Some(0));
        assert_eq!(gate.slot_index::<String>(), Some(1));
        assert_eq!(gate.slot_index::<f64>(), None);
        assert_eq!(gate.stats(), GateStats::default());
    }

    #[test]
    fn test_duplicate_slot_ignored() {
        let gate = UpdateGate::builder().slot::<i32>().slot::<i32>().build();
        assert_eq!(gate.slot_count(), 1);
    }

    #[test]
    fn test_update_sets_dirty() {
        let gate = gate();
        gate.update(5_i32).unwrap();
        assert!(gate.is_dirty());
        assert_eq!(gate.take::<i32>().unwrap(), Some(5));
        assert_eq!(gate.take::<String>().unwrap(), None);
    }

    #[test]
    fn test_unregistered_type_rejected() {
        let gate = gate();
        let err = gate.update(1.5_f64).unwrap_err();
        assert_eq!(err, GateError::UnregisteredType { type_name: "f64" });
        assert!(!gate.is_dirty());
        assert!(gate.updater::<u8>().is_err());
    }

    #[test]
    fn test_clear_dirty_keeps_signal_while_pending() {
        let gate = gate();
        gate.update(1_i32).unwrap();
        gate.update("x".to_string()).unwrap();

        let _ = gate.take::<i32>().unwrap();
        gate.clear_dirty();
        assert!(gate.is_dirty(), "string slot still pending");

        let _ = gate.take::<String>().unwrap();
        gate.clear_dirty();
        assert!(!gate.is_dirty());
    }

    #[test]
    fn test_mark_dirty_without_value() {
        let gate = gate();
        gate.mark_dirty();
        assert!(gate.is_dirty());

        let merged = gate.drain(|_, _| true);
        assert_eq!(merged, 0);
        assert!(!gate.is_dirty());
    }

    #[test]
    fn test_drain_in_registration_order() {
        let gate = gate();
        gate.update("x".to_string()).unwrap();
        gate.update(5_i32).unwrap();

        let mut order = Vec::new();
        let merged = gate.drain(|index, slot| {
            order.push(index);
            slot.is_pending()
        });

        assert_eq!(merged, 2);
        assert_eq!(order, vec![0, 1]);
        assert!(!gate.is_dirty());
    }

    #[test]
    fn test_coalescing_counted() {
        let gate = gate();
        let ints = gate.updater::<i32>().unwrap();
        ints.update(1);
        ints.update(2);
        ints.update(3);

        let stats = gate.stats();
        assert_eq!(stats.stores, 3);
        assert_eq!(stats.coalesced, 2);
        assert_eq!(gate.take::<i32>().unwrap(), Some(3));
    }

    #[test]
    fn test_updaters_from_many_threads() {
        let gate = gate();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let ints = gate.updater::<i32>().unwrap();
                thread::spawn(move || ints.update(i))
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert!(gate.is_dirty());
        let value = gate.take::<i32>().unwrap().unwrap();
        assert!((0..8).contains(&value));
        assert_eq!(gate.stats().stores, 8);
    }
}
