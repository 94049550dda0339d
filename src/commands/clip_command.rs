//! Extent clipping command
//!
//! Loads only the part of a raster covered by a bounding box and writes it
//! with everything outside the box masked.

use clap::ArgMatches;
use log::info;

use crate::commands::command_traits::Command;
use crate::commands::output::{input_path, OutputTarget};
use crate::config::Settings;
use crate::coordinate::{BoundingBox, GeoPolygon};
use crate::errors::{RasterError, RasterResult};
use crate::raster::{PolygonClipper, RasterLoader};
use crate::utils::logger::Logger;

/// Command clipping a raster to a bounding box
pub struct ClipCommand<'a> {
    input_file: String,
    extent: GeoPolygon,
    subtract_holes: bool,
    output: OutputTarget,
    logger: &'a Logger,
}

impl<'a> ClipCommand<'a> {
    pub fn new(args: &ArgMatches, settings: &Settings, logger: &'a Logger) -> RasterResult<Self> {
        let bbox_str = args.get_one::<String>("bbox")
            .ok_or_else(|| RasterError::InvalidArgument("Clipping needs --bbox minx,miny,maxx,maxy".to_string()))?;

        let epsg = match args.get_one::<String>("epsg") {
            Some(code) => code.parse::<u32>()
                .map_err(|_| RasterError::InvalidArgument(format!("Invalid EPSG code: {}", code)))?,
            None => 4326,
        };

        let bbox = BoundingBox::from_string(bbox_str)?.with_epsg(epsg);

        Ok(ClipCommand {
            input_file: input_path(args)?,
            extent: GeoPolygon::from_bbox(&bbox),
            subtract_holes: settings.clip.subtract_holes,
            output: OutputTarget::from_args(args, settings)?,
            logger,
        })
    }
}

impl<'a> Command for ClipCommand<'a> {
    fn execute(&self) -> RasterResult<()> {
        let loader = RasterLoader::default()
            .with_clipper(PolygonClipper::new().with_hole_subtraction(self.subtract_holes));

        let image = loader.load(&self.input_file, Some(&self.extent))?;
        info!("Clipped {} to {}", self.input_file, image);

        self.output.save(&image)?;
        self.logger.log(&format!("Clipped {} into {}", self.input_file, self.output.path))?;
        Ok(())
    }
}
