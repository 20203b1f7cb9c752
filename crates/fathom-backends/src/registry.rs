//! Backend registry and selection.
//!
//! The registry maintains the set of available model backends and routes a
//! predictor tag to the first backend that recognizes it, following a
//! mutable preference order.

use std::sync::{Arc, RwLock};

use anyhow::{anyhow, Result};
use dashmap::DashMap;
use tracing::{debug, info, warn};

use crate::backend::{BackendId, ModelBackend};

/// Registry of model backends, routed by predictor tag.
pub struct BackendRegistry {
    /// Registered backends indexed by their id.
    backends: DashMap<BackendId, Arc<dyn ModelBackend>>,
    /// Selection order for tag routing.
    preference_order: RwLock<Vec<BackendId>>,
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BackendRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            backends: DashMap::new(),
            preference_order: RwLock::new(Vec::new()),
        }
    }

    /// Register a backend. New backends go to the back of the selection
    /// order. Fails on duplicate registration.
    pub fn register_backend(&self, backend: Arc<dyn ModelBackend>) -> Result<()> {
        let backend_id = backend.backend_id();

        if self.backends.contains_key(&backend_id) {
            return Err(anyhow!("Backend {backend_id:?} is already registered"));
        }

        self.backends.insert(backend_id, backend);
        {
            let mut order = self.preference_order.write().unwrap();
            if !order.contains(&backend_id) {
                order.push(backend_id);
            }
        }

        info!("Registered backend {:?}", backend_id);
        Ok(())
    }

    /// Unregister a backend.
    pub fn unregister_backend(&self, backend_id: BackendId) -> Result<()> {
        self.backends
            .remove(&backend_id)
            .ok_or_else(|| anyhow!("Backend {backend_id:?} not found"))?;
        {
            let mut order = self.preference_order.write().unwrap();
            order.retain(|&id| id != backend_id);
        }

        info!("Unregistered backend {:?}", backend_id);
        Ok(())
    }

    /// Get a backend by its id.
    pub fn get_backend(&self, backend_id: BackendId) -> Option<Arc<dyn ModelBackend>> {
        self.backends.get(&backend_id).map(|b| b.clone())
    }

    /// All registered backend ids, in no particular order.
    pub fn backend_ids(&self) -> Vec<BackendId> {
        self.backends.iter().map(|entry| *entry.key()).collect()
    }

    /// Select the first backend in preference order that recognizes `tag`.
    pub fn select_for_tag(&self, tag: &str) -> Option<Arc<dyn ModelBackend>> {
        let order = self.preference_order.read().unwrap();

        for &backend_id in order.iter() {
            if let Some(backend) = self.backends.get(&backend_id) {
                if backend.can_load(tag) {
                    debug!("Selected backend {:?} for tag {}", backend_id, tag);
                    return Some(backend.clone());
                }
            }
        }

        warn!("No backend recognizes tag {}", tag);
        None
    }

    /// Replace the selection order. Every id must be registered.
    pub fn set_preference_order(&self, order: Vec<BackendId>) -> Result<()> {
        for &backend_id in &order {
            if !self.backends.contains_key(&backend_id) {
                return Err(anyhow!("Backend {backend_id:?} is not registered"));
            }
        }
        {
            let mut preference = self.preference_order.write().unwrap();
            *preference = order;
        }

        info!("Updated backend preference order");
        Ok(())
    }

    /// The current selection order.
    pub fn preference_order(&self) -> Vec<BackendId> {
        self.preference_order.read().unwrap().clone()
    }
}
