//! # Synchronization Primitives for the Update Path
//!
//! ## The Problem
//!
//! ```text
//! Producer threads:  data arrives at any time, any rate
//! Render thread:     mutates the visual artifact once per frame
//!
//! Without synchronization: TORN VALUES → GARBAGE GEOMETRY
//! With a queue:            UNBOUNDED BACKLOG → STALE FRAMES
//! ```
//!
//! ## The Solution: Single-Slot Coalescing
//!
//! ```text
//! update(a) ──┐
//! update(b) ──┼──> [slot: c] dirty=true ──tick──> merge(c) ──> dirty=false
//! update(c) ──┘    (a, b overwritten)
//! ```
//!
//! Producers hold the guard for one value move. The render thread holds it
//! for the merges of one tick. Nothing else ever takes it.
//!
//! [`SharedState`] is the standalone form of one gate slot: a single
//! coalescing cell behind its own guard. [`UpdateGate`] keeps all of a
//! plugin's slots behind one guard instead of nesting a lock per type.

mod gate;
mod shared_state;

pub use gate::{GateBuilder, GateStats, UpdateGate, Updater};
pub use shared_state::SharedState;

pub(crate) use gate::{ErasedSlot, TypedSlot};
