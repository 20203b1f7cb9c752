//! Core traits every model backend implements.

use std::collections::BTreeMap;

use anyhow::Result;
use fathom_core::{Configuration, FeatureType, PredictionLog, ValueMap};

/// Identifies a registered backend implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendId {
    /// The builtin manifest-echo backend.
    Echo,
    /// An embedder-supplied backend with a caller-chosen id.
    Custom(u32),
}

/// A loaded, introspectable model.
///
/// Implementations are handed to exactly one predictor and outlive every
/// prediction made through it. `predict` is called on the embedder's
/// thread; implementations must not assume any particular thread but may
/// assume calls never overlap.
pub trait Model: Send {
    /// Model metadata as ordered key/value pairs.
    fn metadata(&self) -> &BTreeMap<String, String>;

    /// The declared input slots, in declaration order.
    fn input_features(&self) -> &[FeatureType];

    /// The declared output slots, in declaration order.
    fn output_features(&self) -> &[FeatureType];

    /// Run one prediction.
    ///
    /// Inputs have already passed schema validation. Diagnostics written to
    /// `log` end up in the caller's profile. A failure must not leave
    /// partial outputs behind; the returned map is discarded on `Err`.
    fn predict(&self, inputs: &ValueMap, log: &PredictionLog) -> Result<ValueMap>;
}

/// A factory that can turn model bytes into a loaded [`Model`].
pub trait ModelBackend: Send + Sync {
    /// The backend's identity in the registry.
    fn backend_id(&self) -> BackendId;

    /// Whether this backend recognizes the given predictor tag.
    fn can_load(&self, tag: &str) -> bool;

    /// Load a model from raw bytes.
    ///
    /// Must not retain references to `buffer` or `config` past return;
    /// anything the model needs later is copied into it.
    fn load(&self, buffer: &[u8], config: &Configuration) -> Result<Box<dyn Model>>;
}
