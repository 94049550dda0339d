//! PNG quicklook command
//!
//! Normalises the raster and writes bands 1-3 as RGB, or band 1 as
//! greyscale when there are fewer than three bands.

use clap::ArgMatches;
use image::{GrayImage, ImageFormat, Luma, Rgb, RgbImage};
use log::info;
use ndarray::ArrayView2;

use crate::commands::command_traits::Command;
use crate::commands::output::input_path;
use crate::errors::{RasterError, RasterResult};
use crate::raster::{RasterImage, RasterLoader};
use crate::utils::logger::Logger;

/// Command rendering a raster to PNG
pub struct PreviewCommand<'a> {
    input_file: String,
    output_file: String,
    logger: &'a Logger,
}

/// Map a normalised value to a byte; NaN renders black
fn to_byte(value: f64) -> u8 {
    if value.is_nan() {
        0
    } else {
        (value * 255.0).round().clamp(0.0, 255.0) as u8
    }
}

fn pixel(band: &ArrayView2<'_, f64>, x: u32, y: u32) -> u8 {
    to_byte(band[[y as usize, x as usize]])
}

/// Write the quicklook of an image to `path`
pub fn write_preview(image: &RasterImage, path: &str) -> RasterResult<()> {
    let normalised = image.normalise();
    let (width, height) = (normalised.width() as u32, normalised.height() as u32);

    let result = if normalised.band_count() >= 3 {
        let (r, g, b) = (normalised.band(1)?, normalised.band(2)?, normalised.band(3)?);
        RgbImage::from_fn(width, height, |x, y| Rgb([pixel(&r, x, y), pixel(&g, x, y), pixel(&b, x, y)]))
            .save_with_format(path, ImageFormat::Png)
    } else {
        let grey = normalised.band(1)?;
        GrayImage::from_fn(width, height, |x, y| Luma([pixel(&grey, x, y)]))
            .save_with_format(path, ImageFormat::Png)
    };

    result.map_err(|e| RasterError::GenericError(format!("Failed to write preview {}: {}", path, e)))
}

impl<'a> PreviewCommand<'a> {
    pub fn new(args: &ArgMatches, logger: &'a Logger) -> RasterResult<Self> {
        let output_file = args.get_one::<String>("output")
            .cloned()
            .ok_or_else(|| RasterError::InvalidArgument("Missing output PNG path (-o)".to_string()))?;

        Ok(PreviewCommand {
            input_file: input_path(args)?,
            output_file,
            logger,
        })
    }
}

impl<'a> Command for PreviewCommand<'a> {
    fn execute(&self) -> RasterResult<()> {
        let image = RasterLoader::default().load(&self.input_file, None)?;
        write_preview(&image, &self.output_file)?;

        info!("Wrote preview of {} to {}", image, self.output_file);
        self.logger.log(&format!("Previewed {} into {}", self.input_file, self.output_file))?;
        Ok(())
    }
}
