//! Predictor lifecycle: creation, prediction and release.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use tokio::sync::oneshot;
use tracing::{debug, error, info};

use fathom_backends::{global_registry, BackendRegistry, Model};
use fathom_core::{Configuration, CoreError, FeatureType, PredictionLog, Profile, ValueMap};

use crate::error::{Error, Result};
use crate::secret::{issue_secret, SecretProvider};

/// A created predictor, bound to one loaded model.
///
/// Prediction is synchronous on the caller's thread. The type is `Send`
/// but deliberately not `Sync`; sequential non-overlapping predictions
/// from one owner are the supported pattern.
pub struct Predictor {
    tag: String,
    model: Option<Box<dyn Model>>,
}

// The model box is opaque; report identity and lifecycle state only.
impl fmt::Debug for Predictor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predictor")
            .field("tag", &self.tag)
            .field("released", &self.model.is_none())
            .finish()
    }
}

impl Predictor {
    fn new(tag: String, model: Box<dyn Model>) -> Self {
        Self {
            tag,
            model: Some(model),
        }
    }

    fn model(&self) -> Result<&dyn Model> {
        self.model
            .as_deref()
            .ok_or_else(|| CoreError::InvalidOperation("predictor has been released".into()).into())
    }

    /// The tag this predictor was created for.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Model metadata, in deterministic key order.
    pub fn metadata(&self) -> Result<&BTreeMap<String, String>> {
        Ok(self.model()?.metadata())
    }

    /// Declared input slots, in declaration order.
    pub fn input_features(&self) -> Result<&[FeatureType]> {
        Ok(self.model()?.input_features())
    }

    /// Declared output slots, in declaration order.
    pub fn output_features(&self) -> Result<&[FeatureType]> {
        Ok(self.model()?.output_features())
    }

    /// Run one prediction, discarding the profile.
    pub fn predict(&self, inputs: &ValueMap) -> Result<ValueMap> {
        self.predict_profiled(inputs).0
    }

    /// Run one prediction and report its profile.
    ///
    /// The profile is produced for failed predictions too, carrying the
    /// error message and whatever diagnostics the backend logged before
    /// failing. Validation failures never reach the backend.
    pub fn predict_profiled(&self, inputs: &ValueMap) -> (Result<ValueMap>, Profile) {
        let log = PredictionLog::new();
        let start = Instant::now();
        let result = self.run_prediction(inputs, &log);
        let latency_ms = start.elapsed().as_secs_f64() * 1_000.0;

        if let Err(err) = &result {
            debug!(tag = %self.tag, error = %err, "Prediction failed");
        }
        let error = result.as_ref().err().map(|e| e.to_string());
        (result, Profile::new(latency_ms, log.take(), error))
    }

    fn run_prediction(&self, inputs: &ValueMap, log: &PredictionLog) -> Result<ValueMap> {
        let model = self.model()?;

        for declared in model.input_features() {
            match inputs.get(declared.name()) {
                Ok(value) => {
                    // A present-but-null value on an optional slot stands
                    // for "omitted".
                    if !(declared.is_optional() && value.is_null()) {
                        declared.matches(value)?;
                    }
                }
                Err(_) if declared.is_optional() => {}
                Err(_) => {
                    return Err(CoreError::InvalidArgument(format!(
                        "required input \"{}\" is missing",
                        declared.name()
                    ))
                    .into());
                }
            }
        }

        let mut raw = model.predict(inputs, log)?;

        // Reshape the backend's map into exactly one entry per declared
        // output; a hole is a backend contract violation.
        let mut outputs = ValueMap::new();
        for declared in model.output_features() {
            let name = declared.name();
            let value = raw.take(name).ok_or_else(|| {
                Error::Backend(format!("backend produced no output \"{name}\""))
            })?;
            outputs.set(name, Some(value));
        }
        Ok(outputs)
    }

    /// Release the loaded model.
    ///
    /// Every subsequent operation on this predictor, including a second
    /// release, fails with `InvalidOperation`.
    pub fn release(&mut self) -> Result<()> {
        match self.model.take() {
            Some(model) => {
                drop(model);
                info!(tag = %self.tag, "Released predictor");
                Ok(())
            }
            None => Err(CoreError::InvalidOperation(
                "predictor has already been released".into(),
            )
            .into()),
        }
    }
}

/// Configures and launches predictor creation.
pub struct PredictorBuilder {
    tag: String,
    config: Configuration,
    registry: Option<Arc<BackendRegistry>>,
    secret_provider: Option<Arc<dyn SecretProvider>>,
}

impl PredictorBuilder {
    /// Start building a predictor for `tag`.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            config: Configuration::new(),
            registry: None,
            secret_provider: None,
        }
    }

    /// Use the given creation settings. The configuration is snapshotted;
    /// the caller's copy is free to change afterwards.
    pub fn configuration(mut self, config: &Configuration) -> Self {
        self.config = config.clone();
        self
    }

    /// Route creation through a specific registry instead of the shared
    /// process-wide one.
    pub fn registry(mut self, registry: Arc<BackendRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Gate creation on a prediction secret from `provider`.
    pub fn secret_provider(mut self, provider: Arc<dyn SecretProvider>) -> Self {
        self.secret_provider = Some(provider);
        self
    }

    /// Launch creation, returning a future that resolves once the model is
    /// loaded or creation has failed.
    ///
    /// Returns immediately; the work runs on the tokio runtime. Must be
    /// called from within a runtime context.
    pub fn create(self) -> CreationFuture {
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let outcome = self.build().await;
            // The caller may have dropped the future already.
            let _ = tx.send(outcome);
        });
        CreationFuture { rx }
    }

    /// Launch creation, delivering the outcome to `handler`.
    ///
    /// The handler fires exactly once, with `Some(predictor)` on success
    /// or `None` on failure; the failure itself is logged.
    pub fn create_with(self, handler: impl FnOnce(Option<Predictor>) + Send + 'static) {
        tokio::spawn(async move {
            match self.build().await {
                Ok(predictor) => handler(Some(predictor)),
                Err(err) => {
                    error!(error = %err, "Predictor creation failed");
                    handler(None);
                }
            }
        });
    }

    async fn build(self) -> Result<Predictor> {
        let Self {
            tag,
            mut config,
            registry,
            secret_provider,
        } = self;

        if let Some(provider) = secret_provider {
            match issue_secret(provider.as_ref()).await {
                Some(secret) => {
                    if config.token().is_none() {
                        config.set_token(Some(secret.as_str()));
                    }
                }
                None => {
                    return Err(Error::Creation(format!(
                        "secret issuance denied for tag {tag}"
                    )));
                }
            }
        }

        let path = config.resource("model")?.path.clone();
        let buffer = tokio::task::spawn_blocking(move || std::fs::read(path))
            .await
            .map_err(|e| Error::Creation(format!("model read task failed: {e}")))??;

        let registry = registry.unwrap_or_else(global_registry);
        let backend = registry
            .select_for_tag(&tag)
            .ok_or_else(|| Error::Creation(format!("no backend recognizes tag {tag}")))?;

        let load_config = config.clone();
        let model = tokio::task::spawn_blocking(move || backend.load(&buffer, &load_config))
            .await
            .map_err(|e| Error::Creation(format!("model load task failed: {e}")))??;

        info!(tag = %tag, "Created predictor");
        Ok(Predictor::new(tag, model))
    }
}

/// Resolves to the created predictor or the creation error.
pub struct CreationFuture {
    rx: oneshot::Receiver<Result<Predictor>>,
}

impl Future for CreationFuture {
    type Output = Result<Predictor>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().rx).poll(cx).map(|received| {
            received.unwrap_or_else(|_| {
                Err(Error::Creation("creation task terminated".into()))
            })
        })
    }
}
