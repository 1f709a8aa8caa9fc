//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the
//! watchface-config.toml file. It covers the tick rate, text templates, the
//! data keys the phone publishes, display geometry, colours, and the two
//! layouts (square and round screens).

use crate::clock::{is_valid_date_format, DEFAULT_DATE_FORMAT};
use crate::format::{DEFAULT_TEMPERATURE_FORMAT, TEMPERATURE_PLACEHOLDER};
use crate::render_loop::INTERACTIVE_UPDATE_RATE_MS;
use crate::weather::SyncKeys;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default configuration file name
pub const CONFIG_FILE: &str = "watchface-config.toml";

/// Application configuration loaded from watchface-config.toml
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    /// Face behaviour and text formats
    pub face: FaceConfig,
    /// Physical display
    pub display: DisplayConfig,
    /// Colours
    pub palette: PaletteConfig,
    /// Per-shape text positions and sizes
    pub layout: LayoutSet,
}

/// Face behaviour and text formats
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct FaceConfig {
    /// Interactive tick interval in milliseconds
    pub update_rate_ms: u64,
    /// Temperature template; `%d` is replaced by the rounded value
    pub temperature_format: String,
    /// chrono strftime pattern for the date line
    pub date_format: String,
    /// Where and under which keys the phone publishes weather
    pub sync: SyncKeys,
}

/// Display geometry
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DisplayConfig {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Round screen; picks `layout.round` before the host reports insets
    pub round: bool,
}

/// Colours as `[r, g, b]`
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PaletteConfig {
    /// Interactive background
    pub background: [u8; 3],
    /// Background after an odd number of taps
    pub background_alt: [u8; 3],
    /// Time, date and temperature text
    pub text: [u8; 3],
    /// Weather icon strokes
    pub icon: [u8; 3],
}

/// Layouts for both screen shapes
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LayoutSet {
    pub square: LayoutConfig,
    pub round: LayoutConfig,
}

/// Text positions and sizes for one screen shape
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct LayoutConfig {
    /// Left edge of the weather row
    pub x_offset: i32,
    /// Baseline of the time line
    pub y_offset: i32,
    /// Pixel height of the time font
    pub text_size: u32,
    /// Pixel height of the date font
    pub date_size: u32,
    /// Pixel height of the temperature font
    pub high_low_size: u32,
    /// Weather icon edge length
    pub icon_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            face: FaceConfig {
                update_rate_ms: INTERACTIVE_UPDATE_RATE_MS,
                temperature_format: DEFAULT_TEMPERATURE_FORMAT.to_string(),
                date_format: DEFAULT_DATE_FORMAT.to_string(),
                sync: SyncKeys::default(),
            },
            display: DisplayConfig {
                width: 320,
                height: 320,
                round: false,
            },
            palette: PaletteConfig {
                background: [0x03, 0xA9, 0xF4],
                background_alt: [0x02, 0x88, 0xD1],
                text: [0xFF, 0xFF, 0xFF],
                icon: [0xFF, 0xFF, 0xFF],
            },
            layout: LayoutSet {
                square: LayoutConfig {
                    x_offset: 60,
                    y_offset: 80,
                    text_size: 20,
                    date_size: 13,
                    high_low_size: 18,
                    icon_size: 40,
                },
                round: LayoutConfig {
                    x_offset: 70,
                    y_offset: 90,
                    text_size: 20,
                    date_size: 13,
                    high_low_size: 18,
                    icon_size: 40,
                },
            },
        }
    }
}

impl LayoutSet {
    /// Layout for the given screen shape
    pub fn for_shape(&self, round: bool) -> LayoutConfig {
        if round {
            self.round
        } else {
            self.square
        }
    }
}

impl Config {
    /// Load configuration from watchface-config.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let config = match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!("Loaded configuration from {}", path.as_ref().display());
                    config
                }
                Err(e) => {
                    warn!("Invalid config file format: {}", e);
                    warn!("Using default configuration");
                    Self::default()
                }
            },
            Err(_) => {
                info!("No config file found, using default configuration");
                Self::default()
            }
        };
        config.validated()
    }

    /// Replace values the face cannot work with by their defaults
    pub fn validated(mut self) -> Self {
        if !self.face.temperature_format.contains(TEMPERATURE_PLACEHOLDER) {
            warn!(
                "temperature_format '{}' has no {} placeholder, using '{}'",
                self.face.temperature_format, TEMPERATURE_PLACEHOLDER, DEFAULT_TEMPERATURE_FORMAT
            );
            self.face.temperature_format = DEFAULT_TEMPERATURE_FORMAT.to_string();
        }
        if !is_valid_date_format(&self.face.date_format) {
            warn!(
                "date_format '{}' is not a valid pattern, using '{}'",
                self.face.date_format, DEFAULT_DATE_FORMAT
            );
            self.face.date_format = DEFAULT_DATE_FORMAT.to_string();
        }
        if self.face.update_rate_ms == 0 {
            warn!("update_rate_ms must be positive, using {}", INTERACTIVE_UPDATE_RATE_MS);
            self.face.update_rate_ms = INTERACTIVE_UPDATE_RATE_MS;
        }
        self
    }

    /// Save current configuration to watchface-config.toml
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.save_to_path(CONFIG_FILE)
    }

    /// Save current configuration to the specified path
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, contents)?;
        info!("Configuration saved to {}", path.as_ref().display());
        Ok(())
    }
}
