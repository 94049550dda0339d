//! Application settings
//!
//! Settings are read from a TOML file with `[logging]`, `[output]`, `[sfim]`
//! and `[clip]` tables. Every key is optional; a missing file yields the
//! defaults. Command-line flags override what is loaded here.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use log::{debug, LevelFilter};

use crate::compression::CompressionFactory;
use crate::errors::{RasterError, RasterResult};
use crate::processing::sfim::DEFAULT_SIGMA;
use crate::raster::PixelType;

/// Default settings file name
pub const DEFAULT_CONFIG_FILE: &str = "remotesensing.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub file: String,
    pub level: LevelFilter,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputSettings {
    pub pixel_type: PixelType,
    /// Compression name accepted by `CompressionFactory::get_handler_by_name`
    pub compression: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SfimSettings {
    pub sigma: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClipSettings {
    pub subtract_holes: bool,
}

/// All settings of the command-line tool
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub output: OutputSettings,
    pub sfim: SfimSettings,
    pub clip: ClipSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            logging: LoggingSettings {
                file: "remotesensing.log".to_string(),
                level: LevelFilter::Info,
            },
            output: OutputSettings {
                pixel_type: PixelType::default(),
                compression: "none".to_string(),
            },
            sfim: SfimSettings { sigma: DEFAULT_SIGMA },
            clip: ClipSettings { subtract_holes: false },
        }
    }
}

impl Settings {
    /// Load settings from `path`, falling back to defaults when it does not exist
    pub fn from_file(path: &str) -> RasterResult<Self> {
        if !Path::new(path).exists() {
            debug!("No settings file at {}, using defaults", path);
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(path)?;
        content.parse()
    }

    fn apply(&mut self, root: &toml::Value) -> RasterResult<()> {
        if let Some(file) = get_str(root, "logging", "file")? {
            self.logging.file = file.to_string();
        }
        if let Some(level) = get_str(root, "logging", "level")? {
            self.logging.level = LevelFilter::from_str(level)
                .map_err(|_| RasterError::Config(format!("unknown log level '{}'", level)))?;
        }

        if let Some(pixel_type) = get_str(root, "output", "pixel_type")? {
            self.output.pixel_type = pixel_type.parse()
                .map_err(|e: RasterError| RasterError::Config(e.to_string()))?;
        }
        if let Some(compression) = get_str(root, "output", "compression")? {
            CompressionFactory::get_handler_by_name(compression)
                .map_err(|e| RasterError::Config(e.to_string()))?;
            self.output.compression = compression.to_string();
        }

        if let Some(value) = get(root, "sfim", "sigma") {
            let sigma = value.as_float()
                .or_else(|| value.as_integer().map(|i| i as f64))
                .ok_or_else(|| RasterError::Config("sfim.sigma must be a number".to_string()))?;
            if sigma <= 0.0 {
                return Err(RasterError::Config(format!("sfim.sigma must be positive, got {}", sigma)));
            }
            self.sfim.sigma = sigma;
        }

        if let Some(value) = get(root, "clip", "subtract_holes") {
            self.clip.subtract_holes = value.as_bool()
                .ok_or_else(|| RasterError::Config("clip.subtract_holes must be a boolean".to_string()))?;
        }

        Ok(())
    }
}

impl FromStr for Settings {
    type Err = RasterError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let table: toml::Table = content.parse()
            .map_err(|e: toml::de::Error| RasterError::Config(e.to_string()))?;
        let root = toml::Value::Table(table);

        let mut settings = Settings::default();
        settings.apply(&root)?;
        Ok(settings)
    }
}

fn get<'v>(root: &'v toml::Value, table: &str, key: &str) -> Option<&'v toml::Value> {
    root.get(table).and_then(|t| t.get(key))
}

fn get_str<'v>(root: &'v toml::Value, table: &str, key: &str) -> RasterResult<Option<&'v str>> {
    match get(root, table, key) {
        None => Ok(None),
        Some(value) => value.as_str()
            .map(Some)
            .ok_or_else(|| RasterError::Config(format!("{}.{} must be a string", table, key))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_gives_defaults() {
        let settings: Settings = "".parse().unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.output.pixel_type, PixelType::Uint16);
        assert_eq!(settings.sfim.sigma, 5.0);
        assert!(!settings.clip.subtract_holes);
    }

    #[test]
    fn test_all_tables() {
        let settings: Settings = r#"
            [logging]
            file = "run.log"
            level = "debug"

            [output]
            pixel_type = "float32"
            compression = "zstd"

            [sfim]
            sigma = 3

            [clip]
            subtract_holes = true
        "#.parse().unwrap();

        assert_eq!(settings.logging.file, "run.log");
        assert_eq!(settings.logging.level, LevelFilter::Debug);
        assert_eq!(settings.output.pixel_type, PixelType::Float32);
        assert_eq!(settings.output.compression, "zstd");
        assert_eq!(settings.sfim.sigma, 3.0);
        assert!(settings.clip.subtract_holes);
    }

    #[test]
    fn test_invalid_values() {
        for document in [
            "[output]\npixel_type = \"int64\"",
            "[output]\ncompression = \"lzw\"",
            "[sfim]\nsigma = -1.0",
            "[sfim]\nsigma = \"wide\"",
            "[clip]\nsubtract_holes = 1",
            "[logging]\nlevel = \"loud\"",
            "not toml at all [",
        ] {
            assert!(matches!(document.parse::<Settings>(), Err(RasterError::Config(_))), "{}", document);
        }
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert_eq!(Settings::from_file(path.to_str().unwrap()).unwrap(), Settings::default());
    }
}
