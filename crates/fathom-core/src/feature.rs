//! Schema descriptors for a predictor's declared inputs and outputs.

use crate::buf;
use crate::dtype::Dtype;
use crate::error::{CoreError, Result};
use crate::value::Value;

/// Rank of a tensor feature whose dimensionality is unknown at declaration
/// time.
pub const UNKNOWN_RANK: i32 = -1;

/// Shape dimension that is unknown or undefined at declaration time.
pub const UNKNOWN_DIM: i32 = -1;

/// A schema descriptor for one declared input or output slot.
///
/// Describes name, data kind, rank and (optionally) shape without carrying
/// any data; immutable once created and independent of any [`Value`]
/// instance. Rank is `-1` for a tensor of unknown rank, `0` for a scalar,
/// and `n > 0` for a fixed-rank tensor. Shape entries may be `-1` for
/// dimensions left unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureType {
    name: String,
    dtype: Dtype,
    rank: i32,
    shape: Option<Vec<i32>>,
    optional: bool,
}

impl FeatureType {
    /// Create a feature type, validating kind/rank/shape agreement.
    ///
    /// Non-tensor dtypes must declare rank 0 and no shape. Tensor dtypes
    /// with a known positive rank may carry a shape of exactly that length.
    pub fn new(
        name: impl Into<String>,
        dtype: Dtype,
        rank: i32,
        shape: Option<Vec<i32>>,
    ) -> Result<Self> {
        let name = name.into();
        if !dtype.is_tensor() {
            if rank != 0 || shape.is_some() {
                return Err(CoreError::InvalidArgument(format!(
                    "feature \"{name}\" of kind {} cannot declare a rank or shape",
                    dtype.name()
                )));
            }
        } else {
            if rank < UNKNOWN_RANK {
                return Err(CoreError::InvalidArgument(format!(
                    "feature \"{name}\" rank must be -1, 0 or positive, got {rank}"
                )));
            }
            if let Some(shape) = &shape {
                if rank <= 0 || shape.len() != rank as usize {
                    return Err(CoreError::InvalidArgument(format!(
                        "feature \"{name}\" shape length {} disagrees with rank {rank}",
                        shape.len()
                    )));
                }
                if shape.iter().any(|&d| d < UNKNOWN_DIM) {
                    return Err(CoreError::InvalidArgument(format!(
                        "feature \"{name}\" shape entries must be -1 or non-negative"
                    )));
                }
            }
        }
        Ok(Self {
            name,
            dtype,
            rank,
            shape,
            optional: false,
        })
    }

    /// Create a scalar feature type.
    pub fn scalar(name: impl Into<String>, dtype: Dtype) -> Result<Self> {
        Self::new(name, dtype, 0, None)
    }

    /// Mark the feature optional at prediction time.
    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// The feature name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Required destination size for [`FeatureType::copy_name`].
    pub fn name_size(&self) -> usize {
        buf::required_size(&self.name)
    }

    /// Copy the name into `dst` (negotiated-size convention).
    pub fn copy_name(&self, dst: &mut [u8]) -> Result<usize> {
        buf::fill(&self.name, dst)
    }

    /// The data kind.
    pub fn dtype(&self) -> Dtype {
        self.dtype
    }

    /// Declared rank: `-1` unknown, `0` scalar, `n > 0` fixed.
    pub fn rank(&self) -> i32 {
        self.rank
    }

    /// Declared shape, present only for tensor kinds with known rank.
    pub fn shape(&self) -> Option<&[i32]> {
        self.shape.as_deref()
    }

    /// Whether the feature may be omitted from prediction inputs.
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Check a concrete value against this declaration.
    ///
    /// Kind must agree when the declaration is non-null; rank and shape
    /// must agree where the declaration pins them (`-1` entries match any
    /// dimension). Fails with `InvalidArgument` describing the
    /// disagreement.
    pub fn matches(&self, value: &Value) -> Result<()> {
        if self.dtype != Dtype::Null && value.dtype() != self.dtype {
            return Err(CoreError::InvalidArgument(format!(
                "feature \"{}\" expects {}, got {}",
                self.name,
                self.dtype.name(),
                value.dtype().name()
            )));
        }
        if self.dtype.is_tensor() && self.rank >= 0 {
            if value.rank() != self.rank {
                return Err(CoreError::InvalidArgument(format!(
                    "feature \"{}\" expects rank {}, got {}",
                    self.name,
                    self.rank,
                    value.rank()
                )));
            }
            if let Some(declared) = &self.shape {
                for (axis, (&want, &got)) in
                    declared.iter().zip(value.shape().iter()).enumerate()
                {
                    if want != UNKNOWN_DIM && want != got {
                        return Err(CoreError::InvalidArgument(format!(
                            "feature \"{}\" expects dimension {want} on axis {axis}, got {got}",
                            self.name
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_declaration() {
        let feature = FeatureType::scalar("x", Dtype::Int32).unwrap();
        assert_eq!(feature.name(), "x");
        assert_eq!(feature.rank(), 0);
        assert!(feature.shape().is_none());
        assert!(!feature.is_optional());
    }

    #[test]
    fn test_non_tensor_rejects_shape() {
        assert!(FeatureType::new("s", Dtype::String, 1, None).is_err());
        assert!(FeatureType::new("s", Dtype::Image, 0, Some(vec![2])).is_err());
        assert!(FeatureType::new("s", Dtype::String, 0, None).is_ok());
    }

    #[test]
    fn test_shape_rank_agreement() {
        assert!(FeatureType::new("t", Dtype::Float32, 2, Some(vec![3, 4])).is_ok());
        assert!(FeatureType::new("t", Dtype::Float32, 2, Some(vec![3])).is_err());
        assert!(FeatureType::new("t", Dtype::Float32, UNKNOWN_RANK, None).is_ok());
        assert!(FeatureType::new("t", Dtype::Float32, -2, None).is_err());
        assert!(FeatureType::new("t", Dtype::Float32, 1, Some(vec![-2])).is_err());
    }

    #[test]
    fn test_matches_kind_disagreement() {
        let feature = FeatureType::scalar("x", Dtype::Int32).unwrap();
        let wrong = Value::scalar(1.0f32);
        assert!(matches!(
            feature.matches(&wrong),
            Err(CoreError::InvalidArgument(_))
        ));
        assert!(feature.matches(&Value::scalar(1i32)).is_ok());
    }

    #[test]
    fn test_matches_rank_and_shape() {
        let feature = FeatureType::new("m", Dtype::Float32, 2, Some(vec![UNKNOWN_DIM, 2])).unwrap();
        let fits = Value::tensor(&[1.0f32, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
        assert!(feature.matches(&fits).is_ok());

        let wrong_rank = Value::tensor(&[1.0f32, 2.0], &[2]).unwrap();
        assert!(feature.matches(&wrong_rank).is_err());

        let wrong_dim = Value::tensor(&[1.0f32, 2.0, 3.0], &[1, 3]).unwrap();
        assert!(feature.matches(&wrong_dim).is_err());
    }

    #[test]
    fn test_unknown_rank_matches_any() {
        let feature = FeatureType::new("t", Dtype::Int64, UNKNOWN_RANK, None).unwrap();
        assert!(feature.matches(&Value::scalar(1i64)).is_ok());
        let tensor = Value::tensor(&[1i64, 2, 3], &[3]).unwrap();
        assert!(feature.matches(&tensor).is_ok());
    }

    #[test]
    fn test_null_declaration_matches_any_kind() {
        let feature = FeatureType::new("any", Dtype::Null, 0, None).unwrap();
        assert!(feature.matches(&Value::string("whatever")).is_ok());
    }

    #[test]
    fn test_null_declaration_cannot_pin_rank_or_shape() {
        assert!(FeatureType::new("any", Dtype::Null, 2, Some(vec![2, 2])).is_err());
        assert!(FeatureType::new("any", Dtype::Null, -1, None).is_err());
    }

    #[test]
    fn test_name_buffer_negotiation() {
        let feature = FeatureType::scalar("input_ids", Dtype::Int64).unwrap();
        let size = feature.name_size();
        let mut dst = vec![0u8; size];
        assert_eq!(feature.copy_name(&mut dst).unwrap(), size);
        assert_eq!(&dst[..size - 1], b"input_ids");
    }
}
