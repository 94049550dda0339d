//! Factory for creating compression handlers

use crate::errors::{RasterError, RasterResult};
use crate::tiff::constants::compression;
use super::handler::CompressionHandler;
use super::uncompressed::UncompressedHandler;
use super::deflate::AdobeDeflateHandler;
use super::zstd::ZstdHandler;

/// Factory for creating compression handlers
pub struct CompressionFactory;

impl CompressionFactory {
    /// Create a handler for a TIFF Compression tag value
    pub fn create_handler(code: u16) -> RasterResult<Box<dyn CompressionHandler>> {
        match code {
            compression::NONE => Ok(Box::new(UncompressedHandler)),
            compression::DEFLATE | compression::OLD_DEFLATE => Ok(Box::new(AdobeDeflateHandler::new())),
            compression::ZSTD => Ok(Box::new(ZstdHandler::new())),
            _ => Err(RasterError::UnsupportedCompression(code as u64))
        }
    }

    /// Create a handler from a user-facing name
    pub fn get_handler_by_name(name: &str) -> RasterResult<Box<dyn CompressionHandler>> {
        match name.trim().to_lowercase().as_str() {
            "uncompressed" | "none" => Ok(Box::new(UncompressedHandler)),
            "deflate" | "zip" | "adobe deflate" => Ok(Box::new(AdobeDeflateHandler::new())),
            "zstd" => Ok(Box::new(ZstdHandler::new())),
            _ => Err(RasterError::InvalidArgument(format!("Unknown compression type: {}", name)))
        }
    }
}
