//! Input registration performed once per plugin instance.

use crate::adapter::AdapterRegistry;
use crate::error::AdapterResult;
use crate::sync::{ErasedSlot, GateBuilder, TypedSlot};

use super::{Merge, PluginCore};

/// Type-erased call into `Merge<T>::apply_update` for one slot.
pub(crate) type MergeFn<P> =
    fn(&mut P, &mut <P as PluginCore>::Artifact, &mut dyn ErasedSlot) -> bool;

/// Registers one adapter on a registry bound to the instance's gate.
pub(crate) type AdapterFn = fn(&mut AdapterRegistry, &str) -> AdapterResult<()>;

/// Collects the input types a plugin accepts.
///
/// ```rust,ignore
/// fn register_inputs(inputs: &mut Inputs<Self>) {
///     inputs
///         .adapter::<Vector3>("updateTrajectory")
///         .adapter::<Spline3>("updateSpline")
///         .accept::<TrajectoryStyle>();
/// }
/// ```
///
/// Registration order is merge order.
pub struct Inputs<P: PluginCore> {
    gate: GateBuilder,
    merges: Vec<MergeFn<P>>,
    adapters: Vec<(String, AdapterFn)>,
}

impl<P: PluginCore> Inputs<P> {
    pub(crate) fn new() -> Self {
        Self {
            gate: GateBuilder::default(),
            merges: Vec::new(),
            adapters: Vec::new(),
        }
    }

    /// Accepts values of `T`, merged by `P`'s `Merge<T>` implementation.
    pub fn accept<T>(&mut self) -> &mut Self
    where
        P: Merge<T>,
        T: Send + 'static,
    {
        if self.gate.push::<T>() {
            self.merges.push(merge_slot::<P, T>);
        }
        self
    }

    /// Accepts `T` and exposes it to dynamic callers under `method`.
    ///
    /// Dynamic callers lend the value; the adapter clones it into the slot.
    pub fn adapter<T>(&mut self, method: &str) -> &mut Self
    where
        P: Merge<T>,
        T: Clone + Send + 'static,
    {
        if !self.gate.contains::<T>() {
            self.accept::<T>();
        }
        let register: AdapterFn = AdapterRegistry::register::<T>;
        self.adapters.push((method.to_owned(), register));
        self
    }

    /// Number of accepted types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.merges.len()
    }

    /// Returns true if no type was accepted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.merges.is_empty()
    }

    pub(crate) fn into_parts(self) -> (GateBuilder, Vec<MergeFn<P>>, Vec<(String, AdapterFn)>) {
        (self.gate, self.merges, self.adapters)
    }
}

fn merge_slot<P, T>(plugin: &mut P, artifact: &mut P::Artifact, slot: &mut dyn ErasedSlot) -> bool
where
    P: Merge<T>,
    T: Send + 'static,
{
    let Some(value) = slot
        .as_any_mut()
        .downcast_mut::<TypedSlot<T>>()
        .and_then(|slot| slot.pending.take())
    else {
        return false;
    };
    plugin.apply_update(artifact, value);
    true
}
