//! SFIM pansharpening command

use clap::ArgMatches;
use log::info;

use crate::commands::command_traits::Command;
use crate::commands::output::{input_path, OutputTarget};
use crate::config::Settings;
use crate::errors::{RasterError, RasterResult};
use crate::processing::Sfim;
use crate::raster::RasterLoader;
use crate::utils::logger::Logger;

/// Command fusing a multispectral raster with a panchromatic band
pub struct FuseCommand<'a> {
    input_file: String,
    pan_file: String,
    sfim: Sfim,
    output: OutputTarget,
    logger: &'a Logger,
}

impl<'a> FuseCommand<'a> {
    pub fn new(args: &ArgMatches, settings: &Settings, logger: &'a Logger) -> RasterResult<Self> {
        let pan_file = args.get_one::<String>("pan")
            .cloned()
            .ok_or_else(|| RasterError::InvalidArgument("Fusion needs a panchromatic image (--pan)".to_string()))?;

        let sigma = match args.get_one::<String>("sigma") {
            Some(value) => value.parse::<f64>()
                .map_err(|_| RasterError::InvalidArgument(format!("Invalid sigma: {}", value)))?,
            None => settings.sfim.sigma,
        };

        Ok(FuseCommand {
            input_file: input_path(args)?,
            pan_file,
            sfim: Sfim::with_sigma(sigma),
            output: OutputTarget::from_args(args, settings)?,
            logger,
        })
    }
}

impl<'a> Command for FuseCommand<'a> {
    fn execute(&self) -> RasterResult<()> {
        let loader = RasterLoader::default();
        let low_resolution = loader.load(&self.input_file, None)?;
        let pan = loader.load(&self.pan_file, None)?;

        info!("Fusing {} with {} (sigma {})", low_resolution, pan, self.sfim.sigma());
        let fused = self.sfim.fuse(&low_resolution, &pan)?;

        self.output.save(&fused)?;
        self.logger.log(&format!("Fused {} and {} into {}", self.input_file, self.pan_file, self.output.path))?;
        Ok(())
    }
}
