//! Pixel-level processing: filters, resampling and image fusion

pub mod filters;
pub mod sfim;

pub use self::sfim::{fuse, Sfim};
