use directories::ProjectDirs;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::scoring::ReferencePhrase;

pub const DEFAULT_PHRASE: &str = "hi only few people can read this";
pub const TEST_DURATION: Duration = Duration::from_secs(5);
pub const TICK_RATE: Duration = Duration::from_millis(1);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write config {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("malformed config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to serialize config for {path}: {source}")]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("reference phrase has no words")]
    EmptyPhrase,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Theme {
    pub title: Color,
    pub primary: Color,
    pub secondary: Color,
    pub correct: Color,
    pub incorrect: Color,
    pub cursor: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            title: Color::Rgb(0xee, 0xee, 0xee),
            primary: Color::Rgb(0x62, 0x62, 0x62),
            secondary: Color::Rgb(0x4a, 0x4a, 0x4a),
            correct: Color::Rgb(0xff, 0xff, 0xff),
            incorrect: Color::Rgb(0xff, 0x00, 0x00),
            cursor: Color::Rgb(0xff, 0xff, 0xff),
        }
    }
}

/// Settings fixed for the lifetime of the process. Duration and tick rate are
/// constants and never read from disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub phrase: String,
    pub theme: Theme,
    #[serde(skip, default = "default_test_duration")]
    pub test_duration: Duration,
    #[serde(skip, default = "default_tick_rate")]
    pub tick_rate: Duration,
}

fn default_test_duration() -> Duration {
    TEST_DURATION
}

fn default_tick_rate() -> Duration {
    TICK_RATE
}

impl Default for Config {
    fn default() -> Self {
        Self {
            phrase: DEFAULT_PHRASE.to_string(),
            theme: Theme::default(),
            test_duration: TEST_DURATION,
            tick_rate: TICK_RATE,
        }
    }
}

impl Config {
    pub fn with_phrase(mut self, phrase: impl Into<String>) -> Self {
        self.phrase = phrase.into();
        self
    }

    pub fn reference(&self) -> ReferencePhrase {
        ReferencePhrase::new(&self.phrase)
    }

    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.reference().is_empty() {
            return Err(ConfigError::EmptyPhrase);
        }
        Ok(self)
    }
}

pub trait ConfigStore {
    fn load(&self) -> Result<Config, ConfigError>;
    fn save(&self, cfg: &Config) -> Result<(), ConfigError>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "tt") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("tt_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    /// A missing file yields the defaults.
    fn load(&self) -> Result<Config, ConfigError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Config::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_slice::<Config>(&bytes)
            .map_err(|source| ConfigError::Parse {
                path: self.path.clone(),
                source,
            })?
            .validate()
    }

    fn save(&self, cfg: &Config) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: self.path.clone(),
            source,
        };

        let data = serde_json::to_vec_pretty(cfg).map_err(|source| ConfigError::Serialize {
            path: self.path.clone(),
            source,
        })?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(&self.path, data).map_err(write_err)
    }
}
