//! Normalised difference index command

use clap::ArgMatches;
use log::info;

use crate::commands::command_traits::Command;
use crate::commands::output::{input_path, OutputTarget};
use crate::config::Settings;
use crate::errors::{RasterError, RasterResult};
use crate::raster::RasterLoader;
use crate::utils::logger::Logger;

/// Command appending `(b1 - b2) / (b1 + b2)` as a new band
pub struct IndexCommand<'a> {
    input_file: String,
    bands: (usize, usize),
    output: OutputTarget,
    logger: &'a Logger,
}

/// Parse a `B1,B2` pair of 1-based band numbers
pub fn parse_band_pair(value: &str) -> RasterResult<(usize, usize)> {
    let invalid = || RasterError::InvalidArgument(format!("Band pair must be B1,B2, got '{}'", value));

    let (first, second) = value.split_once(',').ok_or_else(invalid)?;
    let first = first.trim().parse::<usize>().map_err(|_| invalid())?;
    let second = second.trim().parse::<usize>().map_err(|_| invalid())?;
    Ok((first, second))
}

impl<'a> IndexCommand<'a> {
    pub fn new(args: &ArgMatches, settings: &Settings, logger: &'a Logger) -> RasterResult<Self> {
        let bands = args.get_one::<String>("index")
            .ok_or_else(|| RasterError::InvalidArgument("Missing band pair for --index".to_string()))
            .and_then(|value| parse_band_pair(value))?;

        Ok(IndexCommand {
            input_file: input_path(args)?,
            bands,
            output: OutputTarget::from_args(args, settings)?,
            logger,
        })
    }
}

impl<'a> Command for IndexCommand<'a> {
    fn execute(&self) -> RasterResult<()> {
        let image = RasterLoader::default().load(&self.input_file, None)?;
        let indexed = image.add_index(self.bands.0, self.bands.1)?;
        info!("Index of bands {} and {}: {}", self.bands.0, self.bands.1, indexed);

        self.output.save(&indexed)?;
        self.logger.log(&format!("Indexed {} into {}", self.input_file, self.output.path))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_band_pair() {
        assert_eq!(parse_band_pair("4,3").unwrap(), (4, 3));
        assert_eq!(parse_band_pair(" 1 , 2 ").unwrap(), (1, 2));
        assert!(parse_band_pair("4").is_err());
        assert!(parse_band_pair("a,2").is_err());
        assert!(parse_band_pair("-1,2").is_err());
    }
}
