//! Data arrays and their ascii / base64 / raw encodings.
//!
//! A [`DataArray`] holds the little endian bytes of its values in their output precision, so
//! that every encoding is produced from the same buffer.

use crate::format::{HeaderPrecision, Precision};
use crate::traits::{FieldValue, Scalar};
use crate::Error;

/// A named array of values ready to be written to a file
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DataArray {
    pub(crate) name: String,
    pub(crate) precision: Precision,
    pub(crate) components: usize,
    bytes: Vec<u8>,
}

impl DataArray {
    /// convert `f64` values into the bytes of `precision`
    pub(crate) fn from_f64<I>(
        name: &str,
        precision: Precision,
        components: usize,
        values: I,
    ) -> Result<Self, Error>
    where
        I: IntoIterator<Item = f64>,
    {
        let values = values.into_iter().map(FieldValue::Float);
        Self::from_values(name, precision, components, values)
    }

    /// convert field values into the bytes of `precision`, failing on the first value that
    /// `precision` cannot represent
    pub(crate) fn from_values<I>(
        name: &str,
        precision: Precision,
        components: usize,
        values: I,
    ) -> Result<Self, Error>
    where
        I: IntoIterator<Item = FieldValue>,
    {
        let values = values.into_iter();
        let mut bytes = Vec::with_capacity(values.size_hint().0 * precision.size());

        for value in values {
            let converted = match precision {
                Precision::Float32 => push_as::<f32>(value, &mut bytes),
                Precision::Float64 => push_as::<f64>(value, &mut bytes),
                Precision::Int8 => push_as::<i8>(value, &mut bytes),
                Precision::Int16 => push_as::<i16>(value, &mut bytes),
                Precision::Int32 => push_as::<i32>(value, &mut bytes),
                Precision::Int64 => push_as::<i64>(value, &mut bytes),
                Precision::UInt8 => push_as::<u8>(value, &mut bytes),
                Precision::UInt16 => push_as::<u16>(value, &mut bytes),
                Precision::UInt32 => push_as::<u32>(value, &mut bytes),
                Precision::UInt64 => push_as::<u64>(value, &mut bytes),
            };

            if converted.is_none() {
                return Err(Error::ValueOutOfRange {
                    field: name.to_string(),
                    value,
                    precision,
                });
            }
        }

        Ok(Self {
            name: name.to_string(),
            precision,
            components,
            bytes,
        })
    }

    /// store values in their own precision
    pub(crate) fn from_scalars<T: Scalar>(name: &str, components: usize, values: &[T]) -> Self {
        let mut bytes = Vec::with_capacity(values.len() * T::SIZE);
        values.iter().for_each(|v| v.extend_le_bytes(&mut bytes));

        Self {
            name: name.to_string(),
            precision: T::PRECISION,
            components,
            bytes,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.bytes.len() / self.precision.size()
    }

    #[cfg(test)]
    pub(crate) fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// whitespace separated values
    pub(crate) fn ascii(&self) -> String {
        match self.precision {
            Precision::Float32 => ascii_from::<f32>(&self.bytes),
            Precision::Float64 => ascii_from::<f64>(&self.bytes),
            Precision::Int8 => ascii_from::<i8>(&self.bytes),
            Precision::Int16 => ascii_from::<i16>(&self.bytes),
            Precision::Int32 => ascii_from::<i32>(&self.bytes),
            Precision::Int64 => ascii_from::<i64>(&self.bytes),
            Precision::UInt8 => ascii_from::<u8>(&self.bytes),
            Precision::UInt16 => ascii_from::<u16>(&self.bytes),
            Precision::UInt32 => ascii_from::<u32>(&self.bytes),
            Precision::UInt64 => ascii_from::<u64>(&self.bytes),
        }
    }

    /// byte count header followed by the data, as one block
    pub(crate) fn binary_block(&self, header: HeaderPrecision) -> Vec<u8> {
        let mut block = header.header_bytes(self.bytes.len());
        block.extend_from_slice(&self.bytes);
        block
    }

    /// header and data base64 encoded together
    pub(crate) fn base64_block(&self, header: HeaderPrecision) -> String {
        base64::encode(self.binary_block(header))
    }
}

fn push_as<T: Scalar>(value: FieldValue, bytes: &mut Vec<u8>) -> Option<()> {
    let converted: T = match value {
        FieldValue::Float(v) => num_traits::cast(v)?,
        FieldValue::Int(v) => num_traits::cast(v)?,
        FieldValue::UInt(v) => num_traits::cast(v)?,
    };
    converted.extend_le_bytes(bytes);
    Some(())
}

fn ascii_from<T: Scalar>(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len() * 2);

    for (i, chunk) in bytes.chunks_exact(T::SIZE).enumerate() {
        if i > 0 {
            text.push(' ');
        }
        T::from_le_slice(chunk).push_ascii(&mut text);
    }

    text
}

fn values_from<T: Scalar>(bytes: &[u8]) -> Vec<f64> {
    bytes
        .chunks_exact(T::SIZE)
        .map(|chunk| T::from_le_slice(chunk).to_f64())
        .collect()
}

/// interpret little endian bytes of `precision` as `f64` values
pub(crate) fn decode_values(precision: Precision, bytes: &[u8]) -> Vec<f64> {
    match precision {
        Precision::Float32 => values_from::<f32>(bytes),
        Precision::Float64 => values_from::<f64>(bytes),
        Precision::Int8 => values_from::<i8>(bytes),
        Precision::Int16 => values_from::<i16>(bytes),
        Precision::Int32 => values_from::<i32>(bytes),
        Precision::Int64 => values_from::<i64>(bytes),
        Precision::UInt8 => values_from::<u8>(bytes),
        Precision::UInt16 => values_from::<u16>(bytes),
        Precision::UInt32 => values_from::<u32>(bytes),
        Precision::UInt64 => values_from::<u64>(bytes),
    }
}
