use chrono::{Duration, NaiveTime};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::datetime;
use crate::error::Result;

/// Tunables for the import and slot-layout paths. Values are explicit
/// and passed where needed; there is no process-wide registry.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub import: ImportConfig,
    pub slots: SlotConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Minutes assumed for an entry that states only its start.
    pub default_duration_mins: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SlotConfig {
    /// Display rows available per day.
    pub capacity: usize,
    /// Reference time slot offsets are measured from.
    pub anchor: String,
    /// Initial ceiling relative to the anchor, in seconds.
    pub ceiling_secs: i64,
    /// Height of one slot band, in seconds.
    pub step_secs: i64,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            import: ImportConfig::default(),
            slots: SlotConfig::default(),
        }
    }
}

impl Default for ImportConfig {
    fn default() -> ImportConfig {
        ImportConfig {
            default_duration_mins: 10,
        }
    }
}

impl Default for SlotConfig {
    fn default() -> SlotConfig {
        SlotConfig {
            capacity: 3,
            anchor: "08:00".to_owned(),
            ceiling_secs: 36_000,
            step_secs: 9_000,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Config> {
        let raw = fs::read_to_string(path)?;
        let config = toml::from_str(&raw)?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }
}

impl ImportConfig {
    pub fn default_duration(&self) -> Duration {
        Duration::minutes(self.default_duration_mins)
    }
}

impl SlotConfig {
    pub fn anchor_time(&self) -> Result<NaiveTime> {
        datetime::parse_time(&self.anchor)
    }
}
