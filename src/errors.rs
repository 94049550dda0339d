//! Custom error types for raster processing

use std::fmt;
use std::io;

/// Errors raised by raster loading, geometry and processing operations
#[derive(Debug)]
pub enum RasterError {
    /// I/O error
    IoError(io::Error),
    /// Geotransform with a zero pixel width or height
    MalformedGeotransform(String),
    /// Band number outside `[1, band_count]`
    BandIndex { band: usize, band_count: usize },
    /// Operation needs more bands than the image has
    InsufficientBands(usize),
    /// Operation needs more input images than were supplied
    InsufficientInput { required: usize, supplied: usize },
    /// Pixel type name not in {uint8, uint16, float32}
    UnsupportedPixelType(String),
    /// Pixel window or polygon with no area
    EmptyExtent(String),
    /// The raster dataset could not be opened
    DatasetOpen { path: String, reason: String },
    /// Arrays or images with incompatible shapes
    ShapeMismatch(String),
    /// Read window lies outside the dataset
    InvalidWindow(String),
    /// Invalid argument value
    InvalidArgument(String),
    /// Invalid TIFF header
    InvalidHeader,
    /// Invalid byte order marker
    InvalidByteOrder(u16),
    /// Tag not found
    TagNotFound(u16),
    /// Unsupported compression method
    UnsupportedCompression(u64),
    /// Sample layout the reader cannot decode
    UnsupportedLayout(String),
    /// No transformation between the two EPSG codes
    UnsupportedTransformation { from: u32, to: u32 },
    /// Configuration error
    Config(String),
    /// Generic error with message
    GenericError(String),
}

impl fmt::Display for RasterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RasterError::IoError(e) => write!(f, "I/O error: {}", e),
            RasterError::MalformedGeotransform(msg) => write!(f, "Malformed geotransform: {}", msg),
            RasterError::BandIndex { band, band_count } => {
                write!(f, "Band number {} outside valid range 1..={}", band, band_count)
            },
            RasterError::InsufficientBands(count) => {
                write!(f, "Image only has {} band(s)", count)
            },
            RasterError::InsufficientInput { required, supplied } => {
                write!(f, "At least {} images required, {} supplied", required, supplied)
            },
            RasterError::UnsupportedPixelType(name) => write!(f, "Unrecognised pixel type: {}", name),
            RasterError::EmptyExtent(msg) => write!(f, "Empty extent: {}", msg),
            RasterError::DatasetOpen { path, reason } => {
                write!(f, "Failed to open dataset {}: {}", path, reason)
            },
            RasterError::ShapeMismatch(msg) => write!(f, "Shape mismatch: {}", msg),
            RasterError::InvalidWindow(msg) => write!(f, "Invalid window: {}", msg),
            RasterError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            RasterError::InvalidHeader => write!(f, "Invalid TIFF header"),
            RasterError::InvalidByteOrder(v) => write!(f, "Invalid byte order marker: {:#06x}", v),
            RasterError::TagNotFound(tag) => write!(f, "Tag not found: {}", tag),
            RasterError::UnsupportedCompression(c) => write!(f, "Unsupported compression method: {}", c),
            RasterError::UnsupportedLayout(msg) => write!(f, "Unsupported sample layout: {}", msg),
            RasterError::UnsupportedTransformation { from, to } => {
                write!(f, "Unsupported coordinate transformation from EPSG:{} to EPSG:{}", from, to)
            },
            RasterError::Config(msg) => write!(f, "Configuration error: {}", msg),
            RasterError::GenericError(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for RasterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RasterError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for RasterError {
    fn from(error: io::Error) -> Self {
        RasterError::IoError(error)
    }
}

impl From<String> for RasterError {
    fn from(msg: String) -> Self {
        RasterError::GenericError(msg)
    }
}

/// Result type for raster operations
pub type RasterResult<T> = Result<T, RasterError>;
