//! Single-value, single-guard coalescing cell.

use parking_lot::Mutex;

/// Holds the latest value of `T` and its dirty flag behind one mutex.
///
/// The flag and the value cannot disagree: the slot is dirty exactly when
/// it holds a value, and both change in the same critical section.
///
/// ## Usage
///
/// ```rust,ignore
/// let state = Arc::new(SharedState::new());
///
/// // Any thread
/// state.store(sample);
///
/// // Consumer, once per tick
/// if let Some(latest) = state.take_if_dirty() {
///     apply(latest);
/// }
/// ```
pub struct SharedState<T> {
    slot: Mutex<Option<T>>,
}

impl<T> SharedState<T> {
    /// Creates an empty, clean slot.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Moves `value` into the slot and marks it dirty.
    ///
    /// Overwrites any value the consumer has not taken yet. Blocks only for
    /// the duration of a concurrent `store` or `take_if_dirty`.
    pub fn store(&self, value: T) {
        *self.slot.lock() = Some(value);
    }

    /// Takes the pending value and clears the dirty flag.
    ///
    /// Returns `None` when nothing was stored since the last take, which is
    /// the normal outcome of an idle tick.
    #[must_use]
    pub fn take_if_dirty(&self) -> Option<T> {
        self.slot.lock().take()
    }

    /// Returns true if a value is waiting to be taken.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.slot.lock().is_some()
    }
}

impl<T> Default for SharedState<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for SharedState<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedState")
            .field("dirty", &self.is_dirty())
            .finish()
    }
}
