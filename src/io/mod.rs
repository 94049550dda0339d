//! I/O utilities for raster file handling
//!
//! This module provides the reader trait and byte order strategies used
//! by the GeoTIFF reader.

pub mod seekable;
pub mod byte_order;
