//! Pixel data types
//!
//! `DataType` describes what a dataset stores on disk; `PixelType` is the
//! narrower set of types an image may be saved as.

use std::fmt;
use std::str::FromStr;

use crate::errors::{RasterError, RasterResult};
use crate::tiff::constants::sample_format;

/// Storage type of raster samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    UInt8,
    Int8,
    UInt16,
    Int16,
    UInt32,
    Int32,
    Float32,
    Float64,
}

impl DataType {
    /// Map TIFF BitsPerSample and SampleFormat to a data type
    pub fn from_tiff(bits_per_sample: u16, format: u16) -> RasterResult<Self> {
        match (format, bits_per_sample) {
            (sample_format::UNSIGNED, 8) => Ok(DataType::UInt8),
            (sample_format::UNSIGNED, 16) => Ok(DataType::UInt16),
            (sample_format::UNSIGNED, 32) => Ok(DataType::UInt32),
            (sample_format::SIGNED, 8) => Ok(DataType::Int8),
            (sample_format::SIGNED, 16) => Ok(DataType::Int16),
            (sample_format::SIGNED, 32) => Ok(DataType::Int32),
            (sample_format::IEEEFP, 32) => Ok(DataType::Float32),
            (sample_format::IEEEFP, 64) => Ok(DataType::Float64),
            _ => Err(RasterError::UnsupportedLayout(format!(
                "{}-bit samples with sample format {}", bits_per_sample, format))),
        }
    }

    /// Bytes per sample
    pub fn size_in_bytes(&self) -> usize {
        match self {
            DataType::UInt8 | DataType::Int8 => 1,
            DataType::UInt16 | DataType::Int16 => 2,
            DataType::UInt32 | DataType::Int32 | DataType::Float32 => 4,
            DataType::Float64 => 8,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, DataType::Float32 | DataType::Float64)
    }

    pub fn name(&self) -> &'static str {
        match self {
            DataType::UInt8 => "uint8",
            DataType::Int8 => "int8",
            DataType::UInt16 => "uint16",
            DataType::Int16 => "int16",
            DataType::UInt32 => "uint32",
            DataType::Int32 => "int32",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pixel types an image can be written as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelType {
    Uint8,
    #[default]
    Uint16,
    Float32,
}

impl PixelType {
    pub fn name(&self) -> &'static str {
        match self {
            PixelType::Uint8 => "uint8",
            PixelType::Uint16 => "uint16",
            PixelType::Float32 => "float32",
        }
    }

    /// The storage data type written for this pixel type
    pub fn data_type(&self) -> DataType {
        match self {
            PixelType::Uint8 => DataType::UInt8,
            PixelType::Uint16 => DataType::UInt16,
            PixelType::Float32 => DataType::Float32,
        }
    }

    /// TIFF BitsPerSample value
    pub fn bits_per_sample(&self) -> u16 {
        (self.data_type().size_in_bytes() * 8) as u16
    }

    /// TIFF SampleFormat value
    pub fn sample_format(&self) -> u16 {
        match self {
            PixelType::Uint8 | PixelType::Uint16 => sample_format::UNSIGNED,
            PixelType::Float32 => sample_format::IEEEFP,
        }
    }

    /// Little-endian encoding of one sample
    ///
    /// Integer types round to nearest and saturate at the type bounds; NaN becomes 0.
    pub fn encode_le(&self, value: f64, out: &mut Vec<u8>) {
        match self {
            PixelType::Uint8 => out.push(value.round() as u8),
            PixelType::Uint16 => out.extend_from_slice(&(value.round() as u16).to_le_bytes()),
            PixelType::Float32 => out.extend_from_slice(&(value as f32).to_le_bytes()),
        }
    }
}

impl FromStr for PixelType {
    type Err = RasterError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_lowercase().as_str() {
            "uint8" => Ok(PixelType::Uint8),
            "uint16" => Ok(PixelType::Uint16),
            "float32" => Ok(PixelType::Float32),
            _ => Err(RasterError::UnsupportedPixelType(name.to_string())),
        }
    }
}

impl fmt::Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
