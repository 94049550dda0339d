use std::process;

use log::{error, warn};

use remotesensing::commands::{build_cli, CommandFactory, RemoteSensingCommandFactory};
use remotesensing::config::{Settings, DEFAULT_CONFIG_FILE};
use remotesensing::utils::logger::Logger;

fn main() {
    let matches = build_cli().get_matches();

    let config_file = matches.get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or(DEFAULT_CONFIG_FILE);
    let settings = match Settings::from_file(config_file) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let mut level = settings.logging.level;
    if matches.get_flag("verbose") {
        level = level.max(log::LevelFilter::Debug);
    }

    if let Err(e) = Logger::init_global_logger(&settings.logging.file, level) {
        env_logger::Builder::new().filter_level(level).init();
        warn!("Logging to console only, cannot create {}: {}", settings.logging.file, e);
    }

    let audit_file = format!("{}.audit", settings.logging.file);
    let logger = Logger::new(&audit_file, level).unwrap_or_else(|e| {
        warn!("No audit log at {}: {}", audit_file, e);
        Logger::disabled()
    });

    let factory = RemoteSensingCommandFactory::new(settings);

    match factory.create_command(&matches, &logger) {
        Ok(command) => {
            if let Err(e) = command.execute() {
                error!("Command execution error: {}", e);
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        },
        Err(e) => {
            error!("Failed to create command: {}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
}
