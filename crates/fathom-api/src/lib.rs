//! Fathom Predictor API
//!
//! The embedder-facing surface of the Fathom prediction runtime: build a
//! predictor for a tag, run predictions against it, inspect per-prediction
//! profiles, and release it.
//!
//! ## Example
//!
//! ```no_run
//! use fathom_api::PredictorBuilder;
//! use fathom_core::{Configuration, Value, ValueMap};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Configuration::new();
//!     config.set_resource("model", "model", Some("model.json".as_ref()));
//!
//!     let predictor = PredictorBuilder::new("@fathom/echo")
//!         .configuration(&config)
//!         .create()
//!         .await?;
//!
//!     let mut inputs = ValueMap::new();
//!     inputs.set("x", Some(Value::scalar(42i32)));
//!     let outputs = predictor.predict(&inputs)?;
//!     println!("{}", outputs.get("x")?.as_scalar::<i32>()?);
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod predictor;
pub mod secret;

pub use error::{Error, Result};
pub use predictor::{CreationFuture, Predictor, PredictorBuilder};
pub use secret::{Secret, SecretProvider, StaticSecretProvider};
