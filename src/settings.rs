// src/settings.rs

use std::path::{Path, PathBuf};

use clap::Parser;
use config::{builder::DefaultState, ConfigBuilder, ConfigError, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;
use tracing::Level;

use crate::{
    interest::{RatingSource, Weight, DEFAULT_WEIGHT, FIXED_WEIGHT},
    render::{DisplayLimits, MAX_CITIES, MAX_EVENTS},
};

const DEFAULT_BACKEND: &str = "http://127.0.0.1:5000";
const CONFIG_FILE: &str = "config.toml";

#[derive(Parser, Debug)]
#[command(version)]
pub struct Args {
    /// Path to the local configuration TOML file.
    #[arg(short, value_name = "CONFIG_PATH")]
    pub config: Option<PathBuf>,

    /// Base URL of the events backend, overriding the configuration.
    #[arg(long, value_name = "URL")]
    pub backend: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Backend {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct Display {
    pub max_events: usize,
    pub max_cities: usize,
}

impl Display {
    pub fn limits(&self) -> DisplayLimits {
        DisplayLimits {
            events: self.max_events,
            cities: self.max_cities,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingMode {
    Explicit,
    Fixed,
}

#[derive(Debug, Deserialize)]
pub struct Interests {
    pub rating: RatingMode,
    pub default_weight: i64,
    pub fixed_weight: i64,
}

impl Interests {
    pub fn rating_source(&self) -> RatingSource {
        match self.rating {
            RatingMode::Explicit => RatingSource::Explicit,
            RatingMode::Fixed => RatingSource::Fixed(Weight::clamped(self.fixed_weight)),
        }
    }

    pub fn default_weight(&self) -> Weight {
        Weight::clamped(self.default_weight)
    }
}

#[derive(Debug, Deserialize)]
pub struct Log {
    #[serde(deserialize_with = "deserialize_level")]
    pub level: Level,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub backend: Backend,
    pub display: Display,
    pub interests: Interests,
    pub log: Log,
}

impl Settings {
    /// Load settings from the given TOML file, with sane defaults.
    #[allow(dead_code)]
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::build(Some(path), true, None)
    }

    /// Load settings for the command line: the file named by `-c` must exist,
    /// the one in the platform config directory is read only if present.
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        match &args.config {
            Some(path) => Self::build(Some(path), true, args.backend.clone()),
            None => Self::build(default_path().as_deref(), false, args.backend.clone()),
        }
    }

    fn build(
        path: Option<&Path>,
        required: bool,
        backend: Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::<DefaultState>::default()
            .set_default("backend.url", DEFAULT_BACKEND)?
            .set_default("display.max_events", to_i64(MAX_EVENTS))?
            .set_default("display.max_cities", to_i64(MAX_CITIES))?
            .set_default("interests.rating", "explicit")?
            .set_default("interests.default_weight", i64::from(DEFAULT_WEIGHT))?
            .set_default("interests.fixed_weight", i64::from(FIXED_WEIGHT))?
            .set_default("log.level", "info")?;

        if let Some(path) = path {
            builder = builder.add_source(
                File::from(path)
                    .format(FileFormat::Toml)
                    .required(required),
            );
        }

        let cfg = builder.set_override_option("backend.url", backend)?.build()?;

        cfg.try_deserialize()
    }
}

fn default_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", env!("CARGO_PKG_NAME")).map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

fn to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn deserialize_level<'de, D>(deserializer: D) -> Result<Level, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
}
