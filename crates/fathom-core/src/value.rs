//! Typed values exchanged with a predictor.
//!
//! A [`Value`] is a tagged container for one input or output payload. Tensor
//! payloads either own a private copy of their data or borrow caller-owned
//! memory; the borrow variant exists for the zero-copy path across the
//! allocator boundary and is therefore `unsafe` to construct.

use std::ptr::NonNull;

use crate::dtype::{Dtype, TensorElement};
use crate::error::{CoreError, Result};

/// Backing storage for a tensor, image or binary payload.
///
/// `Owned` keeps an 8-byte-aligned private copy (alignment covers every
/// tensor element type of the protocol). `Borrowed` records a caller pointer;
/// the caller must keep that memory alive and valid for the value's lifetime.
#[derive(Debug)]
enum TensorBuffer {
    Owned(AlignedBuf),
    Borrowed { ptr: NonNull<u8>, len: usize },
}

impl TensorBuffer {
    fn as_bytes(&self) -> &[u8] {
        match self {
            TensorBuffer::Owned(buf) => buf.as_bytes(),
            // Safety: construction promised the pointer stays valid for the
            // buffer's lifetime and covers `len` bytes.
            TensorBuffer::Borrowed { ptr, len } => unsafe {
                std::slice::from_raw_parts(ptr.as_ptr(), *len)
            },
        }
    }

    fn len(&self) -> usize {
        match self {
            TensorBuffer::Owned(buf) => buf.len,
            TensorBuffer::Borrowed { len, .. } => *len,
        }
    }
}

/// Byte storage aligned to 8 bytes so element slices of any protocol dtype
/// can be handed out without alignment faults.
#[derive(Debug)]
struct AlignedBuf {
    words: Vec<u64>,
    len: usize,
}

impl AlignedBuf {
    fn from_bytes(bytes: &[u8]) -> Self {
        let words = vec![0u64; bytes.len().div_ceil(8)];
        let mut buf = Self {
            words,
            len: bytes.len(),
        };
        // Safety: the word vector spans at least `len` bytes.
        unsafe {
            std::ptr::copy_nonoverlapping(
                bytes.as_ptr(),
                buf.words.as_mut_ptr().cast::<u8>(),
                bytes.len(),
            );
        }
        buf
    }

    fn as_bytes(&self) -> &[u8] {
        // Safety: the word vector spans at least `len` bytes.
        unsafe { std::slice::from_raw_parts(self.words.as_ptr().cast::<u8>(), self.len) }
    }
}

/// Kind-specific payload of a value.
#[derive(Debug)]
enum ValueData {
    Null,
    Tensor(TensorBuffer),
    Text(String),
    Image {
        buffer: TensorBuffer,
        width: i32,
        height: i32,
    },
    Binary(TensorBuffer),
}

/// A single tagged input or output payload.
///
/// The dtype tag is immutable after construction. Tensor kinds carry a shape
/// whose length is the rank; opaque kinds (string, list, dict, image,
/// binary) carry their own framing and report rank 0. Dropping a value
/// releases its owned payload exactly once.
#[derive(Debug)]
pub struct Value {
    dtype: Dtype,
    shape: Vec<i32>,
    data: ValueData,
}

fn checked_numel(shape: &[i32]) -> Result<usize> {
    let mut numel = 1usize;
    for &dim in shape {
        if dim < 0 {
            return Err(CoreError::InvalidArgument(format!(
                "value shapes must be concrete, got dimension {dim}"
            )));
        }
        numel = numel.checked_mul(dim as usize).ok_or_else(|| {
            CoreError::InvalidArgument(format!("shape {shape:?} overflows element count"))
        })?;
    }
    Ok(numel)
}

impl Value {
    /// Create a tensor value that owns a private copy of `data`.
    ///
    /// An empty `shape` creates a scalar, which must carry exactly one
    /// element. For tensors, the product of the dimensions must equal
    /// `data.len()`.
    pub fn tensor<T: TensorElement>(data: &[T], shape: &[i32]) -> Result<Self> {
        let numel = checked_numel(shape)?;
        if data.len() != numel {
            return Err(CoreError::InvalidArgument(format!(
                "shape {shape:?} expects {numel} elements, got {}",
                data.len()
            )));
        }
        // Safety: `data` is a valid slice of plain-old-data elements.
        let bytes = unsafe {
            std::slice::from_raw_parts(data.as_ptr().cast::<u8>(), std::mem::size_of_val(data))
        };
        Ok(Self {
            dtype: T::DTYPE,
            shape: shape.to_vec(),
            data: ValueData::Tensor(TensorBuffer::Owned(AlignedBuf::from_bytes(bytes))),
        })
    }

    /// Create a tensor value that borrows caller-owned memory (zero copy).
    ///
    /// # Safety
    ///
    /// `data` must point to at least as many elements as `shape` implies and
    /// must remain valid for the lifetime of the returned value. Mutations
    /// of the underlying memory are observed by [`Value::data`].
    pub unsafe fn tensor_borrowed<T: TensorElement>(data: *const T, shape: &[i32]) -> Result<Self> {
        let numel = checked_numel(shape)?;
        let ptr = NonNull::new(data.cast_mut().cast::<u8>()).ok_or_else(|| {
            CoreError::InvalidArgument("tensor data pointer must not be null".into())
        })?;
        Ok(Self {
            dtype: T::DTYPE,
            shape: shape.to_vec(),
            data: ValueData::Tensor(TensorBuffer::Borrowed {
                ptr,
                len: numel * std::mem::size_of::<T>(),
            }),
        })
    }

    /// Create a tensor value from raw owned bytes with an explicit dtype.
    pub fn tensor_from_bytes(bytes: Vec<u8>, shape: &[i32], dtype: Dtype) -> Result<Self> {
        let element_size = dtype.element_size().ok_or_else(|| {
            CoreError::InvalidArgument(format!("{} is not a tensor dtype", dtype.name()))
        })?;
        let numel = checked_numel(shape)?;
        if bytes.len() != numel * element_size {
            return Err(CoreError::InvalidArgument(format!(
                "shape {shape:?} of {} expects {} bytes, got {}",
                dtype.name(),
                numel * element_size,
                bytes.len()
            )));
        }
        // Bool elements must stay viewable as `bool` later.
        if dtype == Dtype::Bool && bytes.iter().any(|&b| b > 1) {
            return Err(CoreError::InvalidArgument(
                "bool tensor bytes must be 0 or 1".into(),
            ));
        }
        Ok(Self {
            dtype,
            shape: shape.to_vec(),
            data: ValueData::Tensor(TensorBuffer::Owned(AlignedBuf::from_bytes(&bytes))),
        })
    }

    /// Create a rank-0 (scalar) tensor value.
    pub fn scalar<T: TensorElement>(value: T) -> Self {
        // A one-element copy with an empty shape cannot fail validation.
        match Self::tensor(&[value], &[]) {
            Ok(v) => v,
            Err(_) => unreachable!("scalar construction is infallible"),
        }
    }

    /// Create a UTF-8 string value.
    pub fn string(text: impl Into<String>) -> Self {
        Self {
            dtype: Dtype::String,
            shape: Vec::new(),
            data: ValueData::Text(text.into()),
        }
    }

    /// Create a list value from its serialized (JSON-encoded) text.
    ///
    /// The encoding is stored verbatim; parsing is the consuming backend's
    /// responsibility.
    pub fn list(encoded: impl Into<String>) -> Self {
        Self {
            dtype: Dtype::List,
            shape: Vec::new(),
            data: ValueData::Text(encoded.into()),
        }
    }

    /// Create a dictionary value from its serialized (JSON-encoded) text.
    ///
    /// Stored verbatim, like [`Value::list`].
    pub fn dict(encoded: impl Into<String>) -> Self {
        Self {
            dtype: Dtype::Dict,
            shape: Vec::new(),
            data: ValueData::Text(encoded.into()),
        }
    }

    /// Create an image value that owns a copy of `pixels`.
    ///
    /// The buffer must be interleaved RGBA8888:
    /// `pixels.len() == width * height * 4`.
    pub fn image(pixels: &[u8], width: i32, height: i32) -> Result<Self> {
        let expected = Self::image_len(width, height)?;
        if pixels.len() != expected {
            return Err(CoreError::InvalidArgument(format!(
                "RGBA8888 buffer for {width}x{height} must be {expected} bytes, got {}",
                pixels.len()
            )));
        }
        Ok(Self {
            dtype: Dtype::Image,
            shape: Vec::new(),
            data: ValueData::Image {
                buffer: TensorBuffer::Owned(AlignedBuf::from_bytes(pixels)),
                width,
                height,
            },
        })
    }

    /// Create an image value that borrows a caller-owned pixel buffer.
    ///
    /// # Safety
    ///
    /// `pixels` must point to `width * height * 4` valid bytes that outlive
    /// the returned value.
    pub unsafe fn image_borrowed(pixels: *const u8, width: i32, height: i32) -> Result<Self> {
        let ptr = NonNull::new(pixels.cast_mut())
            .ok_or_else(|| CoreError::InvalidArgument("pixel buffer must not be null".into()))?;
        let len = Self::image_len(width, height)?;
        Ok(Self {
            dtype: Dtype::Image,
            shape: Vec::new(),
            data: ValueData::Image {
                buffer: TensorBuffer::Borrowed { ptr, len },
                width,
                height,
            },
        })
    }

    fn image_len(width: i32, height: i32) -> Result<usize> {
        if width <= 0 || height <= 0 {
            return Err(CoreError::InvalidArgument(format!(
                "image dimensions must be positive, got {width}x{height}"
            )));
        }
        Ok((width as usize) * (height as usize) * 4)
    }

    /// Create a binary value that owns `bytes`.
    pub fn binary(bytes: Vec<u8>) -> Self {
        Self {
            dtype: Dtype::Binary,
            shape: Vec::new(),
            data: ValueData::Binary(TensorBuffer::Owned(AlignedBuf::from_bytes(&bytes))),
        }
    }

    /// Create a binary value that borrows a caller-owned buffer.
    ///
    /// # Safety
    ///
    /// `buffer` must point to `len` valid bytes that outlive the returned
    /// value.
    pub unsafe fn binary_borrowed(buffer: *const u8, len: usize) -> Result<Self> {
        let ptr = NonNull::new(buffer.cast_mut())
            .ok_or_else(|| CoreError::InvalidArgument("binary buffer must not be null".into()))?;
        Ok(Self {
            dtype: Dtype::Binary,
            shape: Vec::new(),
            data: ValueData::Binary(TensorBuffer::Borrowed { ptr, len }),
        })
    }

    /// Create a null value.
    pub fn null() -> Self {
        Self {
            dtype: Dtype::Null,
            shape: Vec::new(),
            data: ValueData::Null,
        }
    }

    /// The dtype tag, fixed at construction.
    pub fn dtype(&self) -> Dtype {
        self.dtype
    }

    /// Number of dimensions; 0 for scalars and for non-tensor kinds.
    pub fn rank(&self) -> i32 {
        self.shape.len() as i32
    }

    /// The shape; empty for scalars and for non-tensor kinds.
    pub fn shape(&self) -> &[i32] {
        &self.shape
    }

    /// Image width in pixels, for image values.
    pub fn width(&self) -> Result<i32> {
        match &self.data {
            ValueData::Image { width, .. } => Ok(*width),
            _ => Err(CoreError::InvalidOperation(format!(
                "{} value has no width",
                self.dtype.name()
            ))),
        }
    }

    /// Image height in pixels, for image values.
    pub fn height(&self) -> Result<i32> {
        match &self.data {
            ValueData::Image { height, .. } => Ok(*height),
            _ => Err(CoreError::InvalidOperation(format!(
                "{} value has no height",
                self.dtype.name()
            ))),
        }
    }

    /// Raw payload bytes.
    ///
    /// The slice is valid only while the value is alive; callers must not
    /// retain it past drop. Null values yield an empty slice.
    pub fn data(&self) -> &[u8] {
        match &self.data {
            ValueData::Null => &[],
            ValueData::Tensor(buf) | ValueData::Binary(buf) => buf.as_bytes(),
            ValueData::Text(text) => text.as_bytes(),
            ValueData::Image { buffer, .. } => buffer.as_bytes(),
        }
    }

    /// View the tensor payload as typed elements.
    ///
    /// Fails with `InvalidArgument` if `T` does not match the value's dtype
    /// or a borrowed buffer is misaligned for `T`.
    pub fn as_slice<T: TensorElement>(&self) -> Result<&[T]> {
        if self.dtype != T::DTYPE {
            return Err(CoreError::InvalidArgument(format!(
                "value is {}, requested {}",
                self.dtype.name(),
                T::DTYPE.name()
            )));
        }
        let bytes = match &self.data {
            ValueData::Tensor(buf) => buf.as_bytes(),
            _ => {
                return Err(CoreError::InvalidOperation(format!(
                    "{} value has no tensor payload",
                    self.dtype.name()
                )))
            }
        };
        if bytes.as_ptr().align_offset(std::mem::align_of::<T>()) != 0 {
            return Err(CoreError::InvalidArgument(format!(
                "buffer is not aligned for {}",
                T::DTYPE.name()
            )));
        }
        // Safety: dtype match guarantees the byte length is a multiple of the
        // element size, and alignment was checked above.
        Ok(unsafe {
            std::slice::from_raw_parts(
                bytes.as_ptr().cast::<T>(),
                bytes.len() / std::mem::size_of::<T>(),
            )
        })
    }

    /// Read a rank-0 tensor value as a single element.
    pub fn as_scalar<T: TensorElement>(&self) -> Result<T> {
        let elements = self.as_slice::<T>()?;
        match elements.first() {
            Some(&v) if self.shape.is_empty() => Ok(v),
            _ => Err(CoreError::InvalidOperation(
                "value is not a scalar".into(),
            )),
        }
    }

    /// View a string, list or dict payload as text.
    pub fn as_str(&self) -> Result<&str> {
        match &self.data {
            ValueData::Text(text) => Ok(text),
            _ => Err(CoreError::InvalidOperation(format!(
                "{} value has no text payload",
                self.dtype.name()
            ))),
        }
    }

    /// Whether this value is the null kind.
    pub fn is_null(&self) -> bool {
        self.dtype == Dtype::Null
    }

    /// Deep-copy this value into one that owns its payload.
    ///
    /// Borrowed buffers are materialized into private copies, so the result
    /// has no lifetime tie to caller memory.
    pub fn clone_owned(&self) -> Value {
        let data = match &self.data {
            ValueData::Null => ValueData::Null,
            ValueData::Tensor(buf) => {
                ValueData::Tensor(TensorBuffer::Owned(AlignedBuf::from_bytes(buf.as_bytes())))
            }
            ValueData::Text(text) => ValueData::Text(text.clone()),
            ValueData::Image {
                buffer,
                width,
                height,
            } => ValueData::Image {
                buffer: TensorBuffer::Owned(AlignedBuf::from_bytes(buffer.as_bytes())),
                width: *width,
                height: *height,
            },
            ValueData::Binary(buf) => {
                ValueData::Binary(TensorBuffer::Owned(AlignedBuf::from_bytes(buf.as_bytes())))
            }
        };
        Value {
            dtype: self.dtype,
            shape: self.shape.clone(),
            data,
        }
    }

    /// Payload size in bytes.
    pub fn byte_len(&self) -> usize {
        match &self.data {
            ValueData::Null => 0,
            ValueData::Tensor(buf) | ValueData::Binary(buf) => buf.len(),
            ValueData::Text(text) => text.len(),
            ValueData::Image { buffer, .. } => buffer.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_int32() {
        // Scenario: a rank-0 int32 value holding 42.
        let value = Value::scalar(42i32);
        assert_eq!(value.dtype(), Dtype::Int32);
        assert_eq!(value.rank(), 0);
        assert!(value.shape().is_empty());
        assert_eq!(value.as_scalar::<i32>().unwrap(), 42);
    }

    #[test]
    fn test_tensor_shape_mismatch() {
        let err = Value::tensor(&[1.0f32, 2.0], &[3]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
    }

    #[test]
    fn test_tensor_negative_dim_rejected() {
        let err = Value::tensor(&[1.0f32], &[-1]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
    }

    #[test]
    fn test_copied_tensor_ignores_source_mutation() {
        let mut source = vec![1.0f32, 2.0, 3.0, 4.0];
        let value = Value::tensor(&source, &[2, 2]).unwrap();
        source[0] = 99.0;
        assert_eq!(value.as_slice::<f32>().unwrap(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_borrowed_tensor_observes_source_mutation() {
        let mut source = vec![1.0f32, 2.0, 3.0, 4.0];
        let value = unsafe { Value::tensor_borrowed(source.as_ptr(), &[4]) }.unwrap();
        assert_eq!(value.as_slice::<f32>().unwrap()[0], 1.0);
        source[0] = 99.0;
        assert_eq!(value.as_slice::<f32>().unwrap()[0], 99.0);
    }

    #[test]
    fn test_borrowed_null_pointer_rejected() {
        let err = unsafe { Value::tensor_borrowed(std::ptr::null::<f32>(), &[1]) }.unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
    }

    #[test]
    fn test_image_size_invariant() {
        let pixels = vec![0u8; 2 * 2 * 4];
        let value = Value::image(&pixels, 2, 2).unwrap();
        assert_eq!(value.dtype(), Dtype::Image);
        assert_eq!(value.rank(), 0);
        assert_eq!(value.width().unwrap(), 2);
        assert_eq!(value.height().unwrap(), 2);
        assert_eq!(value.byte_len(), 16);

        assert!(Value::image(&pixels, 3, 2).is_err());
        assert!(Value::image(&pixels, 0, 2).is_err());
    }

    #[test]
    fn test_text_kinds() {
        let s = Value::string("hello");
        assert_eq!(s.dtype(), Dtype::String);
        assert_eq!(s.as_str().unwrap(), "hello");
        assert_eq!(s.rank(), 0);

        let l = Value::list("[1, 2, 3]");
        assert_eq!(l.dtype(), Dtype::List);
        assert_eq!(l.as_str().unwrap(), "[1, 2, 3]");

        let d = Value::dict(r#"{"a": 1}"#);
        assert_eq!(d.dtype(), Dtype::Dict);
        assert_eq!(d.data(), br#"{"a": 1}"#);
    }

    #[test]
    fn test_typed_view_mismatch() {
        let value = Value::tensor(&[1i64, 2], &[2]).unwrap();
        let err = value.as_slice::<f32>().unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
        assert_eq!(value.as_slice::<i64>().unwrap(), &[1, 2]);
    }

    #[test]
    fn test_null_value() {
        let value = Value::null();
        assert!(value.is_null());
        assert_eq!(value.rank(), 0);
        assert!(value.data().is_empty());
    }

    #[test]
    fn test_tensor_from_bytes() {
        let bytes = 7i32.to_ne_bytes().to_vec();
        let value = Value::tensor_from_bytes(bytes, &[], Dtype::Int32).unwrap();
        assert_eq!(value.as_scalar::<i32>().unwrap(), 7);

        // Byte length disagreement.
        assert!(Value::tensor_from_bytes(vec![0u8; 3], &[], Dtype::Int32).is_err());
        // Opaque dtypes cannot be built from raw tensor bytes.
        assert!(Value::tensor_from_bytes(vec![], &[], Dtype::String).is_err());
    }

    #[test]
    fn test_clone_owned_detaches_borrow() {
        let mut source = vec![5u8, 6, 7];
        let borrowed = unsafe { Value::binary_borrowed(source.as_ptr(), source.len()) }.unwrap();
        let owned = borrowed.clone_owned();
        source[0] = 9;
        assert_eq!(borrowed.data()[0], 9);
        assert_eq!(owned.data(), &[5, 6, 7]);
    }

    #[test]
    fn test_bool_tensor() {
        let value = Value::tensor(&[true, false, true], &[3]).unwrap();
        assert_eq!(value.dtype(), Dtype::Bool);
        assert_eq!(value.as_slice::<bool>().unwrap(), &[true, false, true]);
    }

    #[test]
    fn test_f16_tensor() {
        let data = [half::f16::from_f32(0.5), half::f16::from_f32(1.5)];
        let value = Value::tensor(&data, &[2]).unwrap();
        assert_eq!(value.dtype(), Dtype::Float16);
        assert_eq!(value.byte_len(), 4);
        assert_eq!(value.as_slice::<half::f16>().unwrap()[1].to_f32(), 1.5);
    }
}
