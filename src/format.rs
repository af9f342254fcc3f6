//! # Output formats
//!
//! A [`Format`] describes how a grid file is laid out on disk: the encoding of the data arrays,
//! whether they are written inline in their `DataArray` elements or into a trailing
//! `AppendedData` section, and the precision of coordinates and of the binary block headers.
//!
//! Formats are plain values. Build one with [`Format::vtu`] and adjust it with named options:
//!
//! ```
//! use gridwrite::{DataFormat, Encoding, Format, HeaderPrecision, VtuOptions};
//! use gridwrite::precision;
//!
//! let format = Format::vtu().with(VtuOptions {
//!     encoding: Encoding::Raw,
//!     data_format: DataFormat::Appended,
//!     coordinate_precision: precision::FLOAT32,
//!     header_precision: HeaderPrecision::UInt32,
//!     ..Default::default()
//! });
//!
//! assert!(format.validate().is_ok());
//! ```

use crate::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// numeric type of the values of a data array as it is stored on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Precision {
    Float32,
    Float64,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
}

impl Precision {
    /// the name of the type as it appears in the `type` attribute of a `DataArray`
    pub fn vtk_name(&self) -> &'static str {
        match self {
            Self::Float32 => "Float32",
            Self::Float64 => "Float64",
            Self::Int8 => "Int8",
            Self::Int16 => "Int16",
            Self::Int32 => "Int32",
            Self::Int64 => "Int64",
            Self::UInt8 => "UInt8",
            Self::UInt16 => "UInt16",
            Self::UInt32 => "UInt32",
            Self::UInt64 => "UInt64",
        }
    }

    pub(crate) fn from_vtk_name(name: &[u8]) -> Option<Self> {
        let precision = match name {
            b"Float32" => Self::Float32,
            b"Float64" => Self::Float64,
            b"Int8" => Self::Int8,
            b"Int16" => Self::Int16,
            b"Int32" => Self::Int32,
            b"Int64" => Self::Int64,
            b"UInt8" => Self::UInt8,
            b"UInt16" => Self::UInt16,
            b"UInt32" => Self::UInt32,
            b"UInt64" => Self::UInt64,
            _ => return None,
        };
        Some(precision)
    }

    /// number of bytes of a single value
    pub fn size(&self) -> usize {
        match self {
            Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Float32 | Self::Int32 | Self::UInt32 => 4,
            Self::Float64 | Self::Int64 | Self::UInt64 => 8,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }
}

/// Named precision tags, one per supported scalar kind.
pub mod precision {
    use super::Precision;

    pub const FLOAT32: Precision = Precision::Float32;
    pub const FLOAT64: Precision = Precision::Float64;

    pub const INT8: Precision = Precision::Int8;
    pub const INT16: Precision = Precision::Int16;
    pub const INT32: Precision = Precision::Int32;
    pub const INT64: Precision = Precision::Int64;

    pub const UINT8: Precision = Precision::UInt8;
    pub const UINT16: Precision = Precision::UInt16;
    pub const UINT32: Precision = Precision::UInt32;
    pub const UINT64: Precision = Precision::UInt64;
}

/// type of the byte-count header that precedes every binary block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum HeaderPrecision {
    UInt32,
    UInt64,
}

impl HeaderPrecision {
    pub fn vtk_name(&self) -> &'static str {
        match self {
            Self::UInt32 => "UInt32",
            Self::UInt64 => "UInt64",
        }
    }

    pub fn size(&self) -> usize {
        match self {
            Self::UInt32 => 4,
            Self::UInt64 => 8,
        }
    }

    pub(crate) fn from_vtk_name(name: &[u8]) -> Option<Self> {
        match name {
            b"UInt32" => Some(Self::UInt32),
            b"UInt64" => Some(Self::UInt64),
            _ => None,
        }
    }

    /// little endian bytes of a header announcing `num_bytes` bytes of data
    pub(crate) fn header_bytes(&self, num_bytes: usize) -> Vec<u8> {
        match self {
            Self::UInt32 => (num_bytes as u32).to_le_bytes().to_vec(),
            Self::UInt64 => (num_bytes as u64).to_le_bytes().to_vec(),
        }
    }
}

/// how the values of a data array are turned into text or bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Encoding {
    /// whitespace separated numbers, only valid for inlined data
    Ascii,
    /// base64 encoded little endian bytes
    Base64,
    /// raw little endian bytes, only valid for appended data
    Raw,
}

/// where the data arrays are placed in the file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DataFormat {
    /// inside of each `DataArray` element
    Inlined,
    /// in the `AppendedData` section at the end of the file, referenced by offset
    Appended,
}

/// Compression applied to binary blocks. Only uncompressed output is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub enum Compression {
    #[default]
    None,
}

/// Options of the VTK XML unstructured grid format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct VtuOptions {
    pub encoding: Encoding,
    pub compression: Compression,
    pub data_format: DataFormat,
    pub coordinate_precision: Precision,
    pub header_precision: HeaderPrecision,
}

impl Default for VtuOptions {
    fn default() -> Self {
        Self {
            encoding: Encoding::Raw,
            compression: Compression::None,
            data_format: DataFormat::Appended,
            coordinate_precision: Precision::Float64,
            header_precision: HeaderPrecision::UInt64,
        }
    }
}

/// The format descriptor handed to a writer. Never mutated after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub enum Format {
    Vtu(VtuOptions),
}

impl Format {
    /// `.vtu` files with default options (raw appended data, 64 bit coordinates and headers)
    pub fn vtu() -> Self {
        Self::Vtu(VtuOptions::default())
    }

    /// replace the options of this format
    pub fn with(self, options: VtuOptions) -> Self {
        match self {
            Self::Vtu(_) => Self::Vtu(options),
        }
    }

    pub fn options(&self) -> &VtuOptions {
        match self {
            Self::Vtu(options) => options,
        }
    }

    /// file extension of a single piece written in this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Vtu(_) => "vtu",
        }
    }

    /// file extension of the parallel master file
    pub fn parallel_extension(&self) -> &'static str {
        match self {
            Self::Vtu(_) => "pvtu",
        }
    }

    /// check that the combination of options can be written
    pub fn validate(&self) -> Result<(), Error> {
        let options = self.options();

        match (options.encoding, options.data_format) {
            (Encoding::Raw, DataFormat::Inlined) => {
                return Err(Error::InvalidFormat(
                    "raw encoding requires appended data".into(),
                ))
            }
            (Encoding::Ascii, DataFormat::Appended) => {
                return Err(Error::InvalidFormat(
                    "ascii encoding requires inlined data".into(),
                ))
            }
            _ => (),
        }

        if !options.coordinate_precision.is_float() {
            return Err(Error::InvalidFormat(format!(
                "coordinate precision must be a floating point type, got {}",
                options.coordinate_precision.vtk_name()
            )));
        }

        Ok(())
    }
}

impl Default for Format {
    fn default() -> Self {
        Self::vtu()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_format_is_valid() {
        assert!(Format::vtu().validate().is_ok());
    }

    #[test]
    fn raw_inline_is_rejected() {
        let format = Format::vtu().with(VtuOptions {
            encoding: Encoding::Raw,
            data_format: DataFormat::Inlined,
            ..Default::default()
        });

        assert!(matches!(format.validate(), Err(Error::InvalidFormat(_))));
    }

    #[test]
    fn ascii_appended_is_rejected() {
        let format = Format::vtu().with(VtuOptions {
            encoding: Encoding::Ascii,
            data_format: DataFormat::Appended,
            ..Default::default()
        });

        assert!(format.validate().is_err());
    }

    #[test]
    fn integer_coordinates_are_rejected() {
        let format = Format::vtu().with(VtuOptions {
            coordinate_precision: precision::INT32,
            ..Default::default()
        });

        assert!(format.validate().is_err());
    }

    #[test]
    fn precision_names_round_trip() {
        for precision in [
            Precision::Float32,
            Precision::Float64,
            Precision::Int8,
            Precision::Int16,
            Precision::Int32,
            Precision::Int64,
            Precision::UInt8,
            Precision::UInt16,
            Precision::UInt32,
            Precision::UInt64,
        ] {
            let name = precision.vtk_name();
            assert_eq!(Precision::from_vtk_name(name.as_bytes()), Some(precision));
        }
    }

    #[test]
    fn header_bytes_have_header_width() {
        assert_eq!(HeaderPrecision::UInt32.header_bytes(12), vec![12, 0, 0, 0]);
        assert_eq!(HeaderPrecision::UInt64.header_bytes(1).len(), 8);
    }
}
