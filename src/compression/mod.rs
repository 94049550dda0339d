//! Compression handling for GeoTIFF strips and tiles
//!
//! Each supported TIFF compression scheme is a `CompressionHandler`
//! strategy, chosen by tag value when reading and by name when writing.

mod handler;
mod uncompressed;
mod deflate;
mod factory;
mod zstd;

pub use handler::CompressionHandler;
pub use uncompressed::UncompressedHandler;
pub use deflate::AdobeDeflateHandler;
pub use factory::CompressionFactory;
pub use zstd::ZstdHandler;
