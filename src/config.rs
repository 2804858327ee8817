use std::fmt;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::limits::*;
use crate::model::Minute;
use crate::slots;

/// Per-venue settings. Hard limits that never vary live in [`crate::limits`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VenueConfig {
    pub opening_time: NaiveTime,
    pub closing_time: NaiveTime,
    pub slot_interval_minutes: Minute,
    pub booking_duration_minutes: Minute,
    pub max_party_size: u32,
    /// Seat counts a table may be created with.
    pub table_sizes: Vec<u32>,
}

impl Default for VenueConfig {
    fn default() -> Self {
        Self {
            opening_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap_or_default(),
            closing_time: NaiveTime::from_hms_opt(23, 0, 0).unwrap_or_default(),
            slot_interval_minutes: DEFAULT_SLOT_INTERVAL_MINUTES,
            booking_duration_minutes: DEFAULT_BOOKING_DURATION_MINUTES,
            max_party_size: DEFAULT_MAX_PARTY_SIZE,
            table_sizes: DEFAULT_TABLE_SIZES.to_vec(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Invalid { key: &'static str, value: String },
    ClosingNotAfterOpening,
    NotPositive(&'static str),
    NoTableSizes,
    Json(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid { key, value } => write!(f, "invalid {key} value: {value:?}"),
            ConfigError::ClosingNotAfterOpening => {
                write!(f, "closing time should be after opening time")
            }
            ConfigError::NotPositive(field) => write!(f, "{field} must be positive"),
            ConfigError::NoTableSizes => write!(f, "at least one non-zero table size is required"),
            ConfigError::Json(e) => write!(f, "config JSON: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl VenueConfig {
    /// Read `TAVOLA_*` environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            opening_time: load(&lookup, "TAVOLA_OPENING_TIME", defaults.opening_time, parse_time)?,
            closing_time: load(&lookup, "TAVOLA_CLOSING_TIME", defaults.closing_time, parse_time)?,
            slot_interval_minutes: load(
                &lookup,
                "TAVOLA_SLOT_INTERVAL_MINUTES",
                defaults.slot_interval_minutes,
                |s| s.parse().ok(),
            )?,
            booking_duration_minutes: load(
                &lookup,
                "TAVOLA_BOOKING_DURATION_MINUTES",
                defaults.booking_duration_minutes,
                |s| s.parse().ok(),
            )?,
            max_party_size: load(
                &lookup,
                "TAVOLA_MAX_PARTY_SIZE",
                defaults.max_party_size,
                |s| s.parse().ok(),
            )?,
            table_sizes: load(&lookup, "TAVOLA_TABLE_SIZES", defaults.table_sizes, parse_sizes)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(ConfigError::Json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.closing_time <= self.opening_time {
            return Err(ConfigError::ClosingNotAfterOpening);
        }
        if self.slot_interval_minutes <= 0 {
            return Err(ConfigError::NotPositive("slot_interval_minutes"));
        }
        if self.booking_duration_minutes <= 0 {
            return Err(ConfigError::NotPositive("booking_duration_minutes"));
        }
        if self.max_party_size == 0 {
            return Err(ConfigError::NotPositive("max_party_size"));
        }
        if self.table_sizes.is_empty() || self.table_sizes.contains(&0) {
            return Err(ConfigError::NoTableSizes);
        }
        Ok(())
    }

    pub fn booking_slots(&self) -> Vec<NaiveTime> {
        slots::booking_slots(
            self.opening_time,
            self.closing_time,
            self.slot_interval_minutes,
        )
    }
}

fn load<T: fmt::Debug>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => {
            info!("{key} not set, using default: {default:?}");
            Ok(default)
        }
        Some(raw) => parse(raw.trim()).ok_or_else(|| {
            warn!("Invalid {key} value: {raw}");
            ConfigError::Invalid { key, value: raw }
        }),
    }
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .ok()
}

fn parse_sizes(s: &str) -> Option<Vec<u32>> {
    s.split(',').map(|part| part.trim().parse().ok()).collect()
}
