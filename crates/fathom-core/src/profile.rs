//! Per-prediction diagnostics.

use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::buf;
use crate::error::{CoreError, Result};

/// A log sink handed to backends for the duration of one prediction.
///
/// Cheaply cloneable; every clone appends into the same buffer. The
/// prediction path drains the buffer into the [`Profile`] once the backend
/// returns.
#[derive(Debug, Clone, Default)]
pub struct PredictionLog {
    buffer: Arc<Mutex<String>>,
}

impl PredictionLog {
    /// Create an empty log sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one line of backend diagnostics.
    pub fn append(&self, line: &str) {
        // A poisoned lock only means another appender panicked mid-write;
        // the partial log is still worth keeping.
        let mut buffer = match self.buffer.lock() {
            Ok(buffer) => buffer,
            Err(poisoned) => poisoned.into_inner(),
        };
        buffer.push_str(line);
        buffer.push('\n');
    }

    /// Drain the accumulated lines, leaving the sink empty.
    pub fn take(&self) -> String {
        let mut buffer = match self.buffer.lock() {
            Ok(buffer) => buffer,
            Err(poisoned) => poisoned.into_inner(),
        };
        std::mem::take(&mut buffer)
    }
}

/// Diagnostics for one completed prediction: identity, latency, backend
/// logs, and the error message when the prediction failed.
///
/// Caller-owned; dropping it releases everything it holds.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    id: String,
    latency_ms: f64,
    logs: String,
    error: Option<String>,
}

impl Profile {
    /// Assemble a profile from the pieces the prediction path collected.
    pub fn new(latency_ms: f64, logs: String, error: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            latency_ms,
            logs,
            error,
        }
    }

    /// The unique prediction id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Required destination size for [`Profile::copy_id`].
    pub fn id_size(&self) -> usize {
        buf::required_size(&self.id)
    }

    /// Copy the prediction id into `dst` (negotiated-size convention).
    pub fn copy_id(&self, dst: &mut [u8]) -> Result<usize> {
        buf::fill(&self.id, dst)
    }

    /// Wall-clock latency of the prediction in milliseconds.
    pub fn latency_ms(&self) -> f64 {
        self.latency_ms
    }

    /// The error message of a failed prediction.
    ///
    /// `InvalidOperation` when the prediction succeeded; "no error" is the
    /// well-defined outcome, not a fault.
    pub fn error(&self) -> Result<&str> {
        self.error.as_deref().ok_or_else(|| {
            CoreError::InvalidOperation("prediction completed without error".into())
        })
    }

    /// Required destination size for [`Profile::copy_error`].
    pub fn error_size(&self) -> Result<usize> {
        Ok(buf::required_size(self.error()?))
    }

    /// Copy the error message into `dst` (negotiated-size convention).
    pub fn copy_error(&self, dst: &mut [u8]) -> Result<usize> {
        buf::fill(self.error()?, dst)
    }

    /// Newline-delimited backend log lines, possibly empty.
    pub fn logs(&self) -> &str {
        &self.logs
    }

    /// Required destination size for [`Profile::copy_logs`].
    pub fn logs_size(&self) -> usize {
        buf::required_size(&self.logs)
    }

    /// Copy the log text into `dst` (negotiated-size convention).
    pub fn copy_logs(&self, dst: &mut [u8]) -> Result<usize> {
        buf::fill(&self.logs, dst)
    }

    /// Export the profile as a JSON object.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CoreError::Internal(format!("profile serialization failed: {e}")))
    }
}
