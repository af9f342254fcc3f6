//! # Traits
//!
//! [`Scalar`] is implemented for every numeric type that can be stored in a data array. Each
//! implementation carries the [`Precision`] tag that the type is written with when no explicit
//! precision is requested at registration time.

use crate::format::Precision;
use std::fmt::Debug;

/// A single field value, kept in the widest type of its kind so that no integer is rounded
/// on its way to the output precision
#[derive(Debug, Clone, Copy, PartialEq, derive_more::Display)]
pub enum FieldValue {
    #[display(fmt = "{_0}")]
    Float(f64),
    #[display(fmt = "{_0}")]
    Int(i64),
    #[display(fmt = "{_0}")]
    UInt(u64),
}

/// A numeric value that can be written to (and read back from) a data array
pub trait Scalar: Copy + PartialEq + Debug + num_traits::NumCast + 'static {
    /// the precision this type is written with by default
    const PRECISION: Precision;

    /// number of bytes of a single value
    const SIZE: usize;

    fn to_f64(self) -> f64;

    /// this value without loss, widened to the largest type of its kind
    fn into_value(self) -> FieldValue;

    /// append the little endian bytes of this value
    fn extend_le_bytes(&self, buffer: &mut Vec<u8>);

    /// read a value from exactly `Self::SIZE` little endian bytes
    fn from_le_slice(bytes: &[u8]) -> Self;

    /// append the textual form of this value (without separator)
    fn push_ascii(&self, buffer: &mut String);
}

macro_rules! scalar_float {
    ($type:ty, $precision:ident) => {
        impl Scalar for $type {
            const PRECISION: Precision = Precision::$precision;
            const SIZE: usize = std::mem::size_of::<$type>();
            fn to_f64(self) -> f64 {
                self as f64
            }

            fn into_value(self) -> FieldValue {
                FieldValue::Float(self as f64)
            }

            fn extend_le_bytes(&self, buffer: &mut Vec<u8>) {
                buffer.extend(self.to_le_bytes())
            }

            fn from_le_slice(bytes: &[u8]) -> Self {
                let mut arr = [0; std::mem::size_of::<$type>()];
                arr.copy_from_slice(&bytes[..Self::SIZE]);
                <$type>::from_le_bytes(arr)
            }

            fn push_ascii(&self, buffer: &mut String) {
                let mut ryu_buffer = ryu::Buffer::new();
                buffer.push_str(ryu_buffer.format(*self));
            }
        }
    };
}

macro_rules! scalar_int {
    ($type:ty, $precision:ident, $variant:ident, $wide:ty) => {
        impl Scalar for $type {
            const PRECISION: Precision = Precision::$precision;
            const SIZE: usize = std::mem::size_of::<$type>();
            fn to_f64(self) -> f64 {
                self as f64
            }

            fn into_value(self) -> FieldValue {
                FieldValue::$variant(self as $wide)
            }

            fn extend_le_bytes(&self, buffer: &mut Vec<u8>) {
                buffer.extend(self.to_le_bytes())
            }

            fn from_le_slice(bytes: &[u8]) -> Self {
                let mut arr = [0; std::mem::size_of::<$type>()];
                arr.copy_from_slice(&bytes[..Self::SIZE]);
                <$type>::from_le_bytes(arr)
            }

            fn push_ascii(&self, buffer: &mut String) {
                use std::fmt::Write;
                // writing into a String never fails
                let _ = write!(buffer, "{}", self);
            }
        }
    };
}

scalar_float!(f32, Float32);
scalar_float!(f64, Float64);

scalar_int!(i8, Int8, Int, i64);
scalar_int!(i16, Int16, Int, i64);
scalar_int!(i32, Int32, Int, i64);
scalar_int!(i64, Int64, Int, i64);

scalar_int!(u8, UInt8, UInt, u64);
scalar_int!(u16, UInt16, UInt, u64);
scalar_int!(u32, UInt32, UInt, u64);
scalar_int!(u64, UInt64, UInt, u64);
