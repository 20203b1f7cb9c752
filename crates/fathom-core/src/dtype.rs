//! The closed data-type tag set shared between values and feature schemas.
//!
//! The tag set is keyed by name; the numeric codes below are the pinned
//! protocol v1 numbering. Downstream bindings dispatch on these codes, so
//! any change to this table is a new protocol version, never an in-place
//! edit.

/// Data type of a value or feature.
///
/// Numeric codes (protocol v1):
/// `Null=0, Float16=1, Float32=2, Float64=3, Int8=4, Int16=5, Int32=6,
/// Int64=7, Uint8=8, Uint16=9, Uint32=10, Uint64=11, Bool=12, String=13,
/// List=14, Dict=15, Image=16, Binary=17`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Dtype {
    /// Null or undefined.
    Null = 0,
    /// Half-precision float.
    Float16 = 1,
    /// Single-precision float.
    Float32 = 2,
    /// Double-precision float.
    Float64 = 3,
    /// Signed 8-bit integer.
    Int8 = 4,
    /// Signed 16-bit integer.
    Int16 = 5,
    /// Signed 32-bit integer.
    Int32 = 6,
    /// Signed 64-bit integer.
    Int64 = 7,
    /// Unsigned 8-bit integer.
    Uint8 = 8,
    /// Unsigned 16-bit integer.
    Uint16 = 9,
    /// Unsigned 32-bit integer.
    Uint32 = 10,
    /// Unsigned 64-bit integer.
    Uint64 = 11,
    /// Boolean, one byte per element.
    Bool = 12,
    /// UTF-8 string.
    String = 13,
    /// Serialized (JSON-encoded) list; the marshaling layer stores the
    /// encoded text without parsing it.
    List = 14,
    /// Serialized (JSON-encoded) dictionary; stored unparsed.
    Dict = 15,
    /// Interleaved RGBA8888 pixel buffer.
    Image = 16,
    /// Opaque binary blob.
    Binary = 17,
}

impl Dtype {
    /// The pinned protocol v1 numeric code for this tag.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Look up a tag by its pinned numeric code.
    pub fn from_code(code: i32) -> Option<Self> {
        ALL.iter().copied().find(|d| d.code() == code)
    }

    /// The canonical lowercase name of this tag.
    pub fn name(self) -> &'static str {
        match self {
            Dtype::Null => "null",
            Dtype::Float16 => "float16",
            Dtype::Float32 => "float32",
            Dtype::Float64 => "float64",
            Dtype::Int8 => "int8",
            Dtype::Int16 => "int16",
            Dtype::Int32 => "int32",
            Dtype::Int64 => "int64",
            Dtype::Uint8 => "uint8",
            Dtype::Uint16 => "uint16",
            Dtype::Uint32 => "uint32",
            Dtype::Uint64 => "uint64",
            Dtype::Bool => "bool",
            Dtype::String => "string",
            Dtype::List => "list",
            Dtype::Dict => "dict",
            Dtype::Image => "image",
            Dtype::Binary => "binary",
        }
    }

    /// Look up a tag by its canonical name.
    pub fn from_name(name: &str) -> Option<Self> {
        ALL.iter().copied().find(|d| d.name() == name)
    }

    /// Size of one element in bytes, for tensor dtypes.
    ///
    /// Returns `None` for opaque kinds (null, string, list, dict, image,
    /// binary) which carry their own framing.
    pub fn element_size(self) -> Option<usize> {
        match self {
            Dtype::Int8 | Dtype::Uint8 | Dtype::Bool => Some(1),
            Dtype::Float16 | Dtype::Int16 | Dtype::Uint16 => Some(2),
            Dtype::Float32 | Dtype::Int32 | Dtype::Uint32 => Some(4),
            Dtype::Float64 | Dtype::Int64 | Dtype::Uint64 => Some(8),
            Dtype::Null
            | Dtype::String
            | Dtype::List
            | Dtype::Dict
            | Dtype::Image
            | Dtype::Binary => None,
        }
    }

    /// Whether values of this dtype carry a tensor payload with a shape.
    pub fn is_tensor(self) -> bool {
        self.element_size().is_some()
    }
}

const ALL: [Dtype; 18] = [
    Dtype::Null,
    Dtype::Float16,
    Dtype::Float32,
    Dtype::Float64,
    Dtype::Int8,
    Dtype::Int16,
    Dtype::Int32,
    Dtype::Int64,
    Dtype::Uint8,
    Dtype::Uint16,
    Dtype::Uint32,
    Dtype::Uint64,
    Dtype::Bool,
    Dtype::String,
    Dtype::List,
    Dtype::Dict,
    Dtype::Image,
    Dtype::Binary,
];

mod sealed {
    pub trait Sealed {}
}

/// A Rust scalar type that can populate a tensor value.
///
/// The mapping from Rust types to [`Dtype`] tags is closed; implementations
/// exist for exactly the numeric, boolean and half-precision element types
/// of the protocol.
pub trait TensorElement: sealed::Sealed + Copy + 'static {
    /// The dtype tag for this element type.
    const DTYPE: Dtype;
}

macro_rules! tensor_element {
    ($ty:ty, $dtype:expr) => {
        impl sealed::Sealed for $ty {}
        impl TensorElement for $ty {
            const DTYPE: Dtype = $dtype;
        }
    };
}

tensor_element!(half::f16, Dtype::Float16);
tensor_element!(f32, Dtype::Float32);
tensor_element!(f64, Dtype::Float64);
tensor_element!(i8, Dtype::Int8);
tensor_element!(i16, Dtype::Int16);
tensor_element!(i32, Dtype::Int32);
tensor_element!(i64, Dtype::Int64);
tensor_element!(u8, Dtype::Uint8);
tensor_element!(u16, Dtype::Uint16);
tensor_element!(u32, Dtype::Uint32);
tensor_element!(u64, Dtype::Uint64);
tensor_element!(bool, Dtype::Bool);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_pinned_v1() {
        // The protocol v1 table, spelled out so a code shuffle fails loudly.
        let table = [
            (Dtype::Null, 0),
            (Dtype::Float16, 1),
            (Dtype::Float32, 2),
            (Dtype::Float64, 3),
            (Dtype::Int8, 4),
            (Dtype::Int16, 5),
            (Dtype::Int32, 6),
            (Dtype::Int64, 7),
            (Dtype::Uint8, 8),
            (Dtype::Uint16, 9),
            (Dtype::Uint32, 10),
            (Dtype::Uint64, 11),
            (Dtype::Bool, 12),
            (Dtype::String, 13),
            (Dtype::List, 14),
            (Dtype::Dict, 15),
            (Dtype::Image, 16),
            (Dtype::Binary, 17),
        ];
        for (dtype, code) in table {
            assert_eq!(dtype.code(), code);
            assert_eq!(Dtype::from_code(code), Some(dtype));
        }
        assert!(Dtype::from_code(18).is_none());
    }

    #[test]
    fn test_name_round_trip() {
        for dtype in ALL {
            assert_eq!(Dtype::from_name(dtype.name()), Some(dtype));
        }
        assert!(Dtype::from_name("float128").is_none());
    }

    #[test]
    fn test_element_sizes() {
        assert_eq!(Dtype::Float16.element_size(), Some(2));
        assert_eq!(Dtype::Float32.element_size(), Some(4));
        assert_eq!(Dtype::Uint64.element_size(), Some(8));
        assert_eq!(Dtype::Bool.element_size(), Some(1));
        assert_eq!(Dtype::String.element_size(), None);
        assert_eq!(Dtype::Image.element_size(), None);
        assert!(!Dtype::Dict.is_tensor());
        assert!(Dtype::Int16.is_tensor());
    }

    #[test]
    fn test_element_mapping() {
        assert_eq!(f32::DTYPE, Dtype::Float32);
        assert_eq!(<half::f16 as TensorElement>::DTYPE, Dtype::Float16);
        assert_eq!(bool::DTYPE, Dtype::Bool);
        assert_eq!(u16::DTYPE, Dtype::Uint16);
    }
}
