//! Per-rectangle geometry persistence.
//!
//! The store is a TOML file with one table per rectangle section:
//!
//! ```toml
//! [rectA]
//! x = 860
//! y = 515
//! width = 200
//! height = 50
//! screen = 0
//! ```
//!
//! A missing file, a missing section or a missing key all fall back to the
//! defaults of [`RectRecord`]. Every save re-reads the file, replaces one
//! section and rewrites the whole document, so sections owned by other
//! rectangles (or hand-written ones) survive.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::rect::{DEFAULT_HEIGHT, DEFAULT_WIDTH};

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "OVERLAY_MIRROR_CONFIG";

const APP_DIR: &str = "overlay-mirror";
const FILE_NAME: &str = "overlays.toml";

/// Error type for config file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoConfigDir,

    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Persisted geometry of one rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RectRecord {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// Monitor index the rectangle was last shown on
    pub screen: i32,
}

impl Default for RectRecord {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            screen: 0,
        }
    }
}

/// Reads and writes [`RectRecord`]s by section name
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Pick the config path: explicit argument, then `OVERLAY_MIRROR_CONFIG`,
    /// then the platform config directory.
    pub fn resolve(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Ok(Self::new(path));
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::new(path));
        }
        Ok(Self::new(Self::default_path()?))
    }

    /// `<config dir>/overlay-mirror/overlays.toml`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(dir.join(APP_DIR).join(FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load a section, recovering from every failure with defaults.
    pub fn load(&self, section: &str) -> RectRecord {
        match self.try_load(section) {
            Ok(Some(record)) => {
                debug!("Loaded [{}] from {:?}: {:?}", section, self.path, record);
                record
            }
            Ok(None) => {
                debug!("No [{}] in {:?}, using defaults", section, self.path);
                RectRecord::default()
            }
            Err(e) => {
                warn!("Could not load [{}]: {}; using defaults", section, e);
                RectRecord::default()
            }
        }
    }

    /// Load a section. `Ok(None)` when the file or the section does not exist.
    pub fn try_load(&self, section: &str) -> Result<Option<RectRecord>, ConfigError> {
        let table = self.read_table()?;
        match table.get(section) {
            Some(value) => Ok(Some(value.clone().try_into()?)),
            None => Ok(None),
        }
    }

    /// Replace one section and rewrite the whole file.
    pub fn save(&self, section: &str, record: &RectRecord) -> Result<(), ConfigError> {
        let mut table = self.read_table()?;
        table.insert(section.to_string(), toml::Value::try_from(record)?);

        let contents = toml::to_string(&table)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&self.path, contents).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })?;

        debug!("Saved [{}] to {:?}: {:?}", section, self.path, record);
        Ok(())
    }

    fn read_table(&self) -> Result<toml::Table, ConfigError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(contents.parse::<toml::Table>()?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("Config file {:?} does not exist yet", self.path);
                Ok(toml::Table::new())
            }
            Err(source) => Err(ConfigError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}
