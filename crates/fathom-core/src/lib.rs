//! Fathom Core Marshaling Layer
//!
//! This crate provides the foundational value and configuration types of the
//! Fathom embedded prediction runtime: tagged values, ordered value maps,
//! feature schemas, creation settings, and per-prediction profiles.
//!
//! ## Architecture
//!
//! The marshaling layer is deliberately data-only:
//! - **Values**: Tagged payloads (`Value`, `ValueMap`) crossing the
//!   embedder/backend boundary
//! - **Schemas**: `FeatureType` declarations that describe a predictor's
//!   inputs and outputs without carrying data
//! - **Settings**: `Configuration` consumed at predictor creation
//! - **Diagnostics**: `Profile` and `PredictionLog` for per-prediction
//!   introspection
//!
//! ## Example
//!
//! ```rust
//! use fathom_core::{Dtype, Value};
//!
//! let tensor = Value::tensor(&[1.0f32, 2.0, 3.0, 4.0], &[2, 2])?;
//! assert_eq!(tensor.dtype(), Dtype::Float32);
//! assert_eq!(tensor.rank(), 2);
//! assert_eq!(tensor.as_slice::<f32>()?[3], 4.0);
//! # Ok::<(), fathom_core::CoreError>(())
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod buf;
pub mod config;
pub mod dtype;
/// Error and status types for marshaling operations
pub mod error;
pub mod feature;
pub mod logging;
pub mod map;
pub mod profile;
pub mod value;

// Re-export commonly used types
pub use config::{Acceleration, Configuration, Device, Resource};
pub use dtype::{Dtype, TensorElement};
pub use error::{CoreError, Result, Status};
pub use feature::{FeatureType, UNKNOWN_DIM, UNKNOWN_RANK};
pub use logging::{init_default_logging, init_logging, LoggingConfig};
pub use map::ValueMap;
pub use profile::{PredictionLog, Profile};
pub use value::Value;
