use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::logging::LogConfig;
use crate::models::Coords;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where the workout list is mirrored
    pub data_file: PathBuf,

    /// Application metadata
    pub metadata: ConfigMetadata,

    /// Map behaviour
    pub map: MapSettings,

    /// Logging output
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// Map view settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapSettings {
    /// Zoom used when centering on the user or a workout
    pub zoom_level: u8,

    /// Padding in pixels around the overview bounds
    pub overview_padding: [u32; 2],

    /// Position reported as the current location; no map without it
    pub home: Option<Coords>,
}

impl Default for MapSettings {
    fn default() -> Self {
        MapSettings {
            zoom_level: 13,
            overview_padding: [100, 100],
            home: None,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();

        AppConfig {
            data_file: Self::default_data_dir().join("workouts.json"),
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            map: MapSettings::default(),
            logging: LogConfig::default(),
        }
    }
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    fn default_data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".trailog")
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        Self::default_data_dir().join("config.toml")
    }

    /// Load configuration with fallback to defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load_from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!(error = %e, "Using default configuration");
                Self::default()
            }
        }
    }

    /// Keys understood by [`get`](Self::get) and [`set`](Self::set)
    pub const KEYS: [&'static str; 6] = [
        "data_file",
        "map.zoom_level",
        "map.overview_padding",
        "map.home",
        "logging.level",
        "logging.format",
    ];

    /// Read a setting as text
    pub fn get(&self, key: &str) -> Option<String> {
        let value = match key {
            "data_file" => self.data_file.display().to_string(),
            "map.zoom_level" => self.map.zoom_level.to_string(),
            "map.overview_padding" => {
                format!("{},{}", self.map.overview_padding[0], self.map.overview_padding[1])
            }
            "map.home" => self
                .map
                .home
                .map(|c| format!("{},{}", c.lat(), c.lng()))
                .unwrap_or_else(|| "unset".to_string()),
            "logging.level" => self.logging.level.to_filter(),
            "logging.format" => format!("{:?}", self.logging.format).to_lowercase(),
            _ => return None,
        };
        Some(value)
    }

    /// Update a setting from text
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "data_file" => self.data_file = PathBuf::from(value),
            "map.zoom_level" => {
                self.map.zoom_level = value
                    .parse()
                    .with_context(|| format!("Invalid zoom level: {}", value))?
            }
            "map.overview_padding" => {
                let [x, y] = parse_pair(value)?;
                self.map.overview_padding = [x as u32, y as u32];
            }
            "map.home" => {
                self.map.home = match value {
                    "unset" | "" => None,
                    _ => {
                        let [lat, lng] = parse_pair(value)?;
                        Some(Coords::new(lat, lng))
                    }
                }
            }
            "logging.level" => {
                self.logging.level = value.parse().map_err(|e: String| anyhow::anyhow!(e))?
            }
            "logging.format" => {
                self.logging.format = value.parse().map_err(|e: String| anyhow::anyhow!(e))?
            }
            _ => return Err(anyhow::anyhow!("Unknown configuration key: {}", key)),
        }
        self.metadata.updated_at = Utc::now();
        Ok(())
    }
}

/// Parse `"a,b"` into two numbers
pub fn parse_pair(value: &str) -> Result<[f64; 2]> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    if parts.len() != 2 {
        return Err(anyhow::anyhow!("Expected two comma-separated numbers: {}", value));
    }
    let first: f64 = parts[0]
        .parse()
        .with_context(|| format!("Invalid number: {}", parts[0]))?;
    let second: f64 = parts[1]
        .parse()
        .with_context(|| format!("Invalid number: {}", parts[1]))?;
    Ok([first, second])
}
