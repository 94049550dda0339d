//! Band stacking command

use clap::ArgMatches;
use log::info;

use crate::commands::command_traits::Command;
use crate::commands::output::{input_path, OutputTarget};
use crate::config::Settings;
use crate::errors::RasterResult;
use crate::raster::{RasterImage, RasterLoader};
use crate::utils::logger::Logger;

/// Command concatenating the bands of the input and further rasters
pub struct StackCommand<'a> {
    files: Vec<String>,
    output: OutputTarget,
    logger: &'a Logger,
}

impl<'a> StackCommand<'a> {
    pub fn new(args: &ArgMatches, settings: &Settings, logger: &'a Logger) -> RasterResult<Self> {
        let mut files = vec![input_path(args)?];
        if let Some(others) = args.get_many::<String>("stack") {
            files.extend(others.cloned());
        }

        Ok(StackCommand {
            files,
            output: OutputTarget::from_args(args, settings)?,
            logger,
        })
    }
}

impl<'a> Command for StackCommand<'a> {
    fn execute(&self) -> RasterResult<()> {
        let loader = RasterLoader::default();
        let images = self.files.iter()
            .map(|file| loader.load(file, None))
            .collect::<RasterResult<Vec<_>>>()?;

        let stacked = RasterImage::stack(&images)?;
        info!("Stacked {} rasters: {}", images.len(), stacked);

        self.output.save(&stacked)?;
        self.logger.log(&format!("Stacked {} into {}", self.files.join(", "), self.output.path))?;
        Ok(())
    }
}
