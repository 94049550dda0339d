//! Argument helpers shared by the commands

use clap::ArgMatches;

use crate::config::Settings;
use crate::errors::{RasterError, RasterResult};
use crate::raster::{PixelType, RasterImage};
use crate::tiff::GeoTiffDriver;

/// Required positional input file
pub fn input_path(args: &ArgMatches) -> RasterResult<String> {
    args.get_one::<String>("input")
        .cloned()
        .ok_or_else(|| RasterError::InvalidArgument("Missing input file".to_string()))
}

/// Where and how a command writes its GeoTIFF result
#[derive(Debug, Clone)]
pub struct OutputTarget {
    pub path: String,
    pub pixel_type: PixelType,
    pub driver: GeoTiffDriver,
}

impl OutputTarget {
    /// Resolve `-o`, `--pixel-type` and `--compression`, falling back to the settings
    pub fn from_args(args: &ArgMatches, settings: &Settings) -> RasterResult<Self> {
        let path = args.get_one::<String>("output")
            .cloned()
            .ok_or_else(|| RasterError::InvalidArgument("Missing output file path (-o)".to_string()))?;

        let pixel_type = match args.get_one::<String>("pixel-type") {
            Some(name) => name.parse()?,
            None => settings.output.pixel_type,
        };

        let compression = args.get_one::<String>("compression")
            .map(String::as_str)
            .unwrap_or(&settings.output.compression);

        Ok(OutputTarget {
            path,
            pixel_type,
            driver: GeoTiffDriver::with_compression(compression)?,
        })
    }

    pub fn save(&self, image: &RasterImage) -> RasterResult<()> {
        image.save_with(&self.driver, &self.path, self.pixel_type)
    }
}
