//! Fathom Model Backends
//!
//! This crate defines the backend seam of the Fathom prediction runtime:
//! the [`Model`] trait implemented by loaded predictors, the
//! [`ModelBackend`] factory trait, and the tag-routed [`BackendRegistry`]
//! that picks a backend for a predictor tag. The builtin [`EchoBackend`]
//! loads JSON manifests and echoes inputs to outputs.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod echo;
pub mod registry;

use std::sync::{Arc, OnceLock};

pub use backend::{BackendId, Model, ModelBackend};
pub use echo::{EchoBackend, EchoModel};
pub use registry::BackendRegistry;

/// Create a registry with the builtin backends wired in.
pub fn create_backend_registry() -> anyhow::Result<Arc<BackendRegistry>> {
    let registry = Arc::new(BackendRegistry::new());
    registry.register_backend(Arc::new(EchoBackend))?;
    Ok(registry)
}

/// The process-wide shared registry, created on first use.
pub fn global_registry() -> Arc<BackendRegistry> {
    static REGISTRY: OnceLock<Arc<BackendRegistry>> = OnceLock::new();
    REGISTRY
        .get_or_init(|| {
            // Builtin registration cannot fail on an empty registry.
            create_backend_registry().unwrap_or_else(|_| Arc::new(BackendRegistry::new()))
        })
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_routes_to_echo() {
        let registry = create_backend_registry().unwrap();
        let backend = registry.select_for_tag("@fathom/echo").unwrap();
        assert_eq!(backend.backend_id(), BackendId::Echo);
    }

    #[test]
    fn test_global_registry_is_shared() {
        let a = global_registry();
        let b = global_registry();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
