//! # Adapter Registry
//!
//! Lets callers without compile-time type knowledge (scripting bridges,
//! message routers) reach a plugin's typed slots by name.
//!
//! ```text
//! "updateTrajectory" ──► (Vector3, store) ──► gate slot 0
//! "updateSpline"     ──► (Spline3, store) ──► gate slot 1
//! "unknownMethod"    ──► Err(UnregisteredIdentifier)
//! ```
//!
//! The registry is filled when the plugin instance is built and is read-only
//! afterwards, so it can be shared across threads without further locking.
//! Values are always copied in: the caller keeps ownership of what it passes.

use std::any::{Any, TypeId};
use std::sync::Arc;

use crate::error::{AdapterError, AdapterResult};
use crate::sync::UpdateGate;

/// Clones a borrowed payload of the adapter's type into its slot.
type StoreFn = fn(&UpdateGate, usize, &dyn Any) -> bool;

/// Public description of one adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterInfo {
    /// Identifier dynamic callers use.
    pub method: String,
    /// Name of the accepted type.
    pub type_name: &'static str,
}

struct Adapter {
    info: AdapterInfo,
    type_id: TypeId,
    slot: usize,
    store: StoreFn,
}

/// Maps string identifiers to typed store functions on one gate.
pub struct AdapterRegistry {
    plugin_name: String,
    gate: Arc<UpdateGate>,
    adapters: Vec<Adapter>,
}

impl AdapterRegistry {
    /// Creates an empty registry bound to `gate`.
    #[must_use]
    pub fn new(plugin_name: impl Into<String>, gate: Arc<UpdateGate>) -> Self {
        Self {
            plugin_name: plugin_name.into(),
            gate,
            adapters: Vec::new(),
        }
    }

    /// Exposes the gate's slot for `T` under `method`.
    ///
    /// # Errors
    ///
    /// - [`AdapterError::DuplicateIdentifier`] if `method` is taken
    /// - [`AdapterError::UnsupportedType`] if the gate has no slot for `T`
    pub fn register<T: Clone + Send + 'static>(&mut self, method: &str) -> AdapterResult<()> {
        if self.contains(method) {
            return Err(AdapterError::DuplicateIdentifier(method.to_owned()));
        }
        let type_name = std::any::type_name::<T>();
        let slot = self
            .gate
            .slot_index::<T>()
            .ok_or_else(|| AdapterError::UnsupportedType {
                method: method.to_owned(),
                type_name,
            })?;

        self.adapters.push(Adapter {
            info: AdapterInfo {
                method: method.to_owned(),
                type_name,
            },
            type_id: TypeId::of::<T>(),
            slot,
            store: store_copy::<T>,
        });
        Ok(())
    }

    /// Copies `value` into the slot behind `method`.
    ///
    /// # Errors
    ///
    /// - [`AdapterError::UnregisteredIdentifier`] if no adapter has this name
    /// - [`AdapterError::TypeMismatch`] if `value` is not of the adapter's type
    pub fn dispatch(&self, method: &str, value: &dyn Any) -> AdapterResult<()> {
        let adapter = self.find(method)?;
        if value.type_id() != adapter.type_id || !(adapter.store)(&self.gate, adapter.slot, value) {
            return Err(AdapterError::TypeMismatch {
                method: method.to_owned(),
                expected: adapter.info.type_name,
            });
        }
        Ok(())
    }

    /// Name of the type `method` accepts.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::UnregisteredIdentifier`] if no adapter has this name.
    pub fn data_type(&self, method: &str) -> AdapterResult<&'static str> {
        self.find(method).map(|a| a.info.type_name)
    }

    /// Returns true if an adapter is registered under `method`.
    #[must_use]
    pub fn contains(&self, method: &str) -> bool {
        self.adapters.iter().any(|a| a.info.method == method)
    }

    /// Identifiers of all adapters, in registration order.
    pub fn available(&self) -> impl Iterator<Item = &str> + '_ {
        self.adapters.iter().map(|a| a.info.method.as_str())
    }

    /// Descriptions of all adapters, in registration order.
    pub fn adapters(&self) -> impl Iterator<Item = &AdapterInfo> + '_ {
        self.adapters.iter().map(|a| &a.info)
    }

    /// Name of the plugin the registry belongs to.
    #[must_use]
    pub fn plugin_name(&self) -> &str {
        &self.plugin_name
    }

    /// Number of adapters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    /// Returns true if no adapter is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    fn find(&self, method: &str) -> AdapterResult<&Adapter> {
        self.adapters
            .iter()
            .find(|a| a.info.method == method)
            .ok_or_else(|| {
                tracing::warn!(plugin = %self.plugin_name, method, "adapter not available");
                AdapterError::UnregisteredIdentifier(method.to_owned())
            })
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("plugin", &self.plugin_name)
            .field("adapters", &self.adapters().collect::<Vec<_>>())
            .finish()
    }
}

fn store_copy<T: Clone + Send + 'static>(gate: &UpdateGate, slot: usize, value: &dyn Any) -> bool {
    match value.downcast_ref::<T>() {
        Some(value) => {
            gate.store_at(slot, value.clone());
            true
        }
        None => false,
    }
}
