//! CLI command implementations
//!
//! Each operation of the `remotesensing` binary is a `Command`; the factory
//! picks one from the parsed flags.

pub mod clip_command;
pub mod command_traits;
pub mod fuse_command;
pub mod index_command;
pub mod info_command;
pub mod output;
pub mod preview_command;
pub mod stack_command;

pub use clip_command::ClipCommand;
pub use command_traits::{Command, CommandFactory};
pub use fuse_command::FuseCommand;
pub use index_command::IndexCommand;
pub use info_command::InfoCommand;
pub use preview_command::PreviewCommand;
pub use stack_command::StackCommand;

use clap::{Arg, ArgAction, ArgMatches, Command as ClapCommand};

use crate::config::{Settings, DEFAULT_CONFIG_FILE};
use crate::errors::RasterResult;
use crate::utils::logger::Logger;

/// Command-line interface of the `remotesensing` binary
pub fn build_cli() -> ClapCommand {
    ClapCommand::new("remotesensing")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Inspect, clip, pansharpen and combine georeferenced rasters")
        .arg(
            Arg::new("input")
                .help("Input GeoTIFF file")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("Output file")
                .value_name("FILE"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Settings file")
                .value_name("FILE")
                .default_value(DEFAULT_CONFIG_FILE),
        )
        .arg(
            Arg::new("clip")
                .long("clip")
                .help("Clip the input to --bbox")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("bbox")
                .long("bbox")
                .help("Bounding box for clipping (minx,miny,maxx,maxy)")
                .value_name("BBOX"),
        )
        .arg(
            Arg::new("epsg")
                .long("epsg")
                .help("EPSG code for bounding box coordinates")
                .value_name("CODE")
                .default_value("4326"),
        )
        .arg(
            Arg::new("fuse")
                .long("fuse")
                .help("Pansharpen the input with --pan using SFIM")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("pan")
                .long("pan")
                .help("Panchromatic image for fusion")
                .value_name("FILE"),
        )
        .arg(
            Arg::new("sigma")
                .long("sigma")
                .help("Gaussian sigma of the SFIM low-pass filter")
                .value_name("SIGMA"),
        )
        .arg(
            Arg::new("index")
                .long("index")
                .help("Append the normalised difference of two bands (1-based)")
                .value_name("B1,B2"),
        )
        .arg(
            Arg::new("stack")
                .long("stack")
                .help("Stack the bands of the input and these files")
                .value_name("FILE")
                .num_args(1..),
        )
        .arg(
            Arg::new("preview")
                .long("preview")
                .help("Write a PNG quicklook to --output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("mgrs")
                .long("mgrs")
                .help("Report the MGRS tile of the raster centre")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("pixel-type")
                .long("pixel-type")
                .help("Output pixel type (uint8, uint16, float32)")
                .value_name("TYPE"),
        )
        .arg(
            Arg::new("compression")
                .long("compression")
                .help("Output compression (none, deflate, zstd)")
                .value_name("NAME"),
        )
}

/// Factory for creating command instances based on CLI arguments
pub struct RemoteSensingCommandFactory {
    settings: Settings,
}

impl RemoteSensingCommandFactory {
    pub fn new(settings: Settings) -> Self {
        RemoteSensingCommandFactory { settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

impl<'a> CommandFactory<'a> for RemoteSensingCommandFactory {
    fn create_command(&self, args: &ArgMatches, logger: &'a Logger) -> RasterResult<Box<dyn Command + 'a>> {
        if args.get_flag("fuse") {
            Ok(Box::new(FuseCommand::new(args, &self.settings, logger)?))
        } else if args.get_flag("clip") {
            Ok(Box::new(ClipCommand::new(args, &self.settings, logger)?))
        } else if args.contains_id("index") {
            Ok(Box::new(IndexCommand::new(args, &self.settings, logger)?))
        } else if args.contains_id("stack") {
            Ok(Box::new(StackCommand::new(args, &self.settings, logger)?))
        } else if args.get_flag("preview") {
            Ok(Box::new(PreviewCommand::new(args, logger)?))
        } else {
            Ok(Box::new(InfoCommand::new(args, logger)?))
        }
    }
}
