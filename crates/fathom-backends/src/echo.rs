//! The builtin echo backend.
//!
//! Loads a JSON manifest declaring a model's metadata and feature schema,
//! then echoes inputs to outputs at prediction time. It exists so the full
//! predictor lifecycle (loading, validation, profiling, routing) can run
//! without any numeric inference engine behind it.

use std::collections::BTreeMap;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use tracing::debug;

use fathom_core::{
    Configuration, Dtype, FeatureType, PredictionLog, Value, ValueMap, UNKNOWN_RANK,
};

use crate::backend::{BackendId, Model, ModelBackend};

/// One declared feature in a manifest.
#[derive(Debug, Deserialize)]
struct FeatureDecl {
    name: String,
    dtype: String,
    #[serde(default = "default_rank")]
    rank: i32,
    #[serde(default)]
    shape: Option<Vec<i32>>,
    #[serde(default)]
    optional: bool,
}

fn default_rank() -> i32 {
    UNKNOWN_RANK
}

/// The manifest format the echo backend loads.
#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    metadata: BTreeMap<String, String>,
    #[serde(default)]
    inputs: Vec<FeatureDecl>,
    #[serde(default)]
    outputs: Vec<FeatureDecl>,
}

impl FeatureDecl {
    fn into_feature(self) -> Result<FeatureType> {
        let dtype = Dtype::from_name(&self.dtype)
            .ok_or_else(|| anyhow!("unknown dtype \"{}\" for feature \"{}\"", self.dtype, self.name))?;
        // Manifests may omit rank for non-tensor kinds, which are always
        // rank 0.
        let rank = if !dtype.is_tensor() && self.rank == UNKNOWN_RANK {
            0
        } else {
            self.rank
        };
        let feature = FeatureType::new(self.name, dtype, rank, self.shape)?
            .with_optional(self.optional);
        Ok(feature)
    }
}

/// A loaded echo model.
pub struct EchoModel {
    metadata: BTreeMap<String, String>,
    inputs: Vec<FeatureType>,
    outputs: Vec<FeatureType>,
}

impl Model for EchoModel {
    fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    fn input_features(&self) -> &[FeatureType] {
        &self.inputs
    }

    fn output_features(&self) -> &[FeatureType] {
        &self.outputs
    }

    fn predict(&self, inputs: &ValueMap, log: &PredictionLog) -> Result<ValueMap> {
        let mut outputs = ValueMap::new();
        for declared in &self.outputs {
            let name = declared.name();
            let value = match inputs.get(name) {
                Ok(value) => {
                    log.append(&format!("echo: output \"{name}\" copied from input"));
                    value.clone_owned()
                }
                Err(_) if self.inputs.len() == 1 => {
                    let sole = self.inputs[0].name();
                    match inputs.get(sole) {
                        Ok(value) => {
                            log.append(&format!(
                                "echo: output \"{name}\" copied from sole input \"{sole}\""
                            ));
                            value.clone_owned()
                        }
                        Err(_) => {
                            log.append(&format!("echo: output \"{name}\" has no source, null"));
                            Value::null()
                        }
                    }
                }
                Err(_) => {
                    log.append(&format!("echo: output \"{name}\" has no source, null"));
                    Value::null()
                }
            };
            outputs.set(name, Some(value));
        }
        Ok(outputs)
    }
}

/// Backend that loads echo manifests.
#[derive(Debug, Default)]
pub struct EchoBackend;

impl ModelBackend for EchoBackend {
    fn backend_id(&self) -> BackendId {
        BackendId::Echo
    }

    fn can_load(&self, tag: &str) -> bool {
        // The reference backend takes any well-formed tag; real engines
        // registered ahead of it claim theirs first.
        !tag.is_empty()
    }

    fn load(&self, buffer: &[u8], config: &Configuration) -> Result<Box<dyn Model>> {
        let manifest: Manifest =
            serde_json::from_slice(buffer).context("invalid echo manifest")?;

        let mut metadata = manifest.metadata;
        metadata.insert(
            "acceleration".into(),
            config.acceleration().bits().to_string(),
        );
        metadata.insert(
            "device_bound".into(),
            config.device().is_some().to_string(),
        );
        if let Some(fingerprint) = config.fingerprint() {
            metadata.insert("fingerprint".into(), fingerprint.to_owned());
        }

        let inputs = manifest
            .inputs
            .into_iter()
            .map(FeatureDecl::into_feature)
            .collect::<Result<Vec<_>>>()?;
        let outputs = manifest
            .outputs
            .into_iter()
            .map(FeatureDecl::into_feature)
            .collect::<Result<Vec<_>>>()?;

        debug!(
            inputs = inputs.len(),
            outputs = outputs.len(),
            "Loaded echo manifest"
        );

        Ok(Box::new(EchoModel {
            metadata,
            inputs,
            outputs,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"{
        "metadata": { "title": "Echo" },
        "inputs": [
            { "name": "x", "dtype": "int32", "rank": 0 },
            { "name": "note", "dtype": "string", "rank": 0, "optional": true }
        ],
        "outputs": [
            { "name": "x", "dtype": "int32", "rank": 0 },
            { "name": "missing", "dtype": "float32" }
        ]
    }"#;

    fn load_model() -> Box<dyn Model> {
        EchoBackend
            .load(MANIFEST.as_bytes(), &Configuration::new())
            .unwrap()
    }

    #[test]
    fn test_manifest_schema() {
        let model = load_model();
        assert_eq!(model.metadata()["title"], "Echo");
        assert_eq!(model.input_features().len(), 2);
        assert!(model.input_features()[1].is_optional());
        assert_eq!(model.output_features()[1].dtype(), Dtype::Float32);
        assert_eq!(model.output_features()[1].rank(), UNKNOWN_RANK);
    }

    #[test]
    fn test_echo_prediction() {
        let model = load_model();
        let mut inputs = ValueMap::new();
        inputs.set("x", Some(Value::scalar(42i32)));

        let log = PredictionLog::new();
        let outputs = model.predict(&inputs, &log).unwrap();

        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs.get("x").unwrap().as_scalar::<i32>().unwrap(), 42);
        assert!(outputs.get("missing").unwrap().is_null());
        assert!(log.take().contains("copied from input"));
    }

    #[test]
    fn test_config_recorded_in_metadata() {
        let mut config = Configuration::new();
        config.set_acceleration(fathom_core::Acceleration::GPU);
        config.set_fingerprint(Some("fp-1"));
        let model = EchoBackend.load(MANIFEST.as_bytes(), &config).unwrap();
        assert_eq!(model.metadata()["acceleration"], "2");
        assert_eq!(model.metadata()["fingerprint"], "fp-1");
        assert_eq!(model.metadata()["device_bound"], "false");
    }

    #[test]
    fn test_invalid_manifest_rejected() {
        assert!(EchoBackend
            .load(b"not json", &Configuration::new())
            .is_err());
        let bad_dtype = r#"{ "outputs": [ { "name": "y", "dtype": "float99" } ] }"#;
        assert!(EchoBackend
            .load(bad_dtype.as_bytes(), &Configuration::new())
            .is_err());
    }
}
