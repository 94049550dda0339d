//! Raster summary command
//!
//! Prints size, sample type, georeferencing and footprint of a GeoTIFF
//! without reading its pixels.

use clap::ArgMatches;
use log::info;

use crate::commands::command_traits::Command;
use crate::commands::output::input_path;
use crate::coordinate::{authority_code_of, get_mgrs_info, BoundingBox, CoordinateTransformer, GeoPolygon, Geotransform};
use crate::errors::{RasterError, RasterResult};
use crate::raster::{RasterDataset, RasterDriver};
use crate::tiff::GeoTiffDriver;
use crate::utils::logger::Logger;

/// Command describing a raster file
pub struct InfoCommand<'a> {
    input_file: String,
    verbose: bool,
    mgrs: bool,
    logger: &'a Logger,
}

impl<'a> InfoCommand<'a> {
    pub fn new(args: &ArgMatches, logger: &'a Logger) -> RasterResult<Self> {
        Ok(InfoCommand {
            input_file: input_path(args)?,
            verbose: args.get_flag("verbose"),
            mgrs: args.get_flag("mgrs"),
            logger,
        })
    }
}

impl<'a> Command for InfoCommand<'a> {
    fn execute(&self) -> RasterResult<()> {
        let dataset = GeoTiffDriver::new().open(&self.input_file)?;
        let (width, height) = dataset.size();
        let geotransform = Geotransform::from_array(&dataset.geotransform())?;
        let epsg = authority_code_of(&dataset.projection_wkt());

        info!("Raster: {}", self.input_file);
        info!("  Size: {}x{} pixels, {} band(s)", width, height, dataset.band_count());
        info!("  Data type: {}", dataset.data_type());
        info!("  Geotransform: {}", geotransform);
        match epsg {
            Some(code) => info!("  CRS: EPSG:{}", code),
            None => info!("  CRS: unknown"),
        }

        let (x0, y0) = geotransform.pixel_to_world(0.0, 0.0);
        let (x1, y1) = geotransform.pixel_to_world(width as f64, height as f64);
        let mut bounds = BoundingBox::new(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1));
        bounds.epsg = epsg;
        info!("  Bounds: {}", bounds);

        if self.verbose {
            info!("  Format: {}, {}", if dataset.is_big_tiff() { "BigTIFF" } else { "TIFF" }, dataset.byte_order().name());
            info!("  Layout: {:?}, {} compression", dataset.layout(), dataset.compression_name());
            info!("{}", dataset.ifd());
        }

        if self.mgrs {
            let code = epsg.ok_or_else(|| RasterError::InvalidArgument(
                "MGRS lookup needs a raster with a known CRS".to_string()))?;
            let footprint = CoordinateTransformer::new()
                .transform_polygon(&GeoPolygon::from_bbox(&bounds), code, 4326)?;
            let tile = get_mgrs_info(&footprint)?;
            info!("  MGRS tile: {}{}{}", tile.utm_zone, tile.latitude_band, tile.square);
        }

        self.logger.log(&format!("Described {}", self.input_file))?;
        Ok(())
    }
}
