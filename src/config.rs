//! Run profiles for the force-totals pipeline.
//!
//! A profile is loaded from TOML and describes which sheets to use, how to
//! shape the hourly distribution, and the exact totals to reproduce. Two
//! built-in presets cover the 16-hour and 24-hour field counts.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::totals::allocation::DistributionStrategy;
use crate::totals::locator::DEFAULT_SCAN_LIMIT;
use crate::totals::summary::DEFAULT_SUMMARY_SCAN_LIMIT;
use crate::totals::{DirectionTotals, VEHICLE_CLASSES};

/// Sheet used to locate direction rows
pub const DEFAULT_REFERENCE_SHEET: &str = "7-8AM";
/// Sheet holding daily totals; never treated as an hourly sheet
pub const DEFAULT_SUMMARY_SHEET: &str = "DAY";

const PROFILE_DIR: &str = "traffic-counts";
const PROFILE_FILE: &str = "profile.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read profile {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse profile {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid profile: {0}")]
    Invalid(String),
}

/// Built-in profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    #[default]
    SixteenHour,
    TwentyFourHour,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub reference_sheet: String,
    pub summary_sheet: String,
    /// Rows of the reference sheet searched for direction labels
    pub direction_scan_limit: u32,
    /// Rows of the summary sheet searched for existing summary rows
    pub summary_scan_limit: u32,
    pub rewrite_summary: bool,
    /// Skip (with a warning) directions that cannot be located instead of failing
    pub skip_missing_directions: bool,
    pub strategy: DistributionStrategy,
    pub weights: HashMap<String, f64>,
    pub directions: Vec<DirectionTotals>,
}

impl Default for Profile {
    fn default() -> Self {
        Profile::sixteen_hour()
    }
}

impl Profile {
    pub fn preset(preset: Preset) -> Self {
        match preset {
            Preset::SixteenHour => Self::sixteen_hour(),
            Preset::TwentyFourHour => Self::twenty_four_hour(),
        }
    }

    /// 16-hour counts (6AM-10PM heavy), summary sheet left alone
    pub fn sixteen_hour() -> Self {
        Profile {
            reference_sheet: DEFAULT_REFERENCE_SHEET.to_string(),
            summary_sheet: DEFAULT_SUMMARY_SHEET.to_string(),
            direction_scan_limit: DEFAULT_SCAN_LIMIT,
            summary_scan_limit: DEFAULT_SUMMARY_SCAN_LIMIT,
            rewrite_summary: false,
            skip_missing_directions: false,
            strategy: DistributionStrategy::sixteen_hour(),
            weights: weight_table(&[
                ("6-7AM", 0.08), ("7-8AM", 0.08), ("8-9AM", 0.08), ("9-10AM", 0.065),
                ("10-11AM", 0.065), ("11-12PM", 0.065), ("12-1PM", 0.065), ("1-2PM", 0.065),
                ("2-3PM", 0.065), ("3-4PM", 0.065), ("4-5PM", 0.08), ("5-6PM", 0.08),
                ("6-7PM", 0.08), ("7-8PM", 0.06), ("8-9PM", 0.04), ("9-10PM", 0.03),
                ("10-11PM", 0.015), ("11-12AM", 0.01), ("12-1AM", 0.005), ("1-2AM", 0.0025),
                ("2-3AM", 0.0025), ("3-4AM", 0.0025), ("4-5AM", 0.0025), ("5-6AM", 0.004),
            ]),
            directions: vec![
                DirectionTotals::new(
                    "Bisil Bound",
                    vec![719, 1799, 954, 543, 551, 34, 9, 58, 677, 269, 363, 9],
                ),
                DirectionTotals::new(
                    "Athi River Bound",
                    vec![726, 1479, 1097, 651, 492, 58, 23, 67, 665, 233, 306, 11],
                ),
            ],
        }
    }

    /// Round-the-clock counts, with the summary sheet rewritten to match
    pub fn twenty_four_hour() -> Self {
        Profile {
            rewrite_summary: true,
            strategy: DistributionStrategy::twenty_four_hour(),
            weights: weight_table(&[
                ("6-7AM", 0.055), ("7-8AM", 0.065), ("8-9AM", 0.075), ("9-10AM", 0.065),
                ("10-11AM", 0.055), ("11-12AM", 0.050), ("12-1PM", 0.055), ("1-2PM", 0.055),
                ("2-3PM", 0.055), ("3-4PM", 0.055), ("4-5PM", 0.065), ("5-6PM", 0.075),
                ("6-7PM", 0.070), ("7-8PM", 0.055), ("8-9PM", 0.045), ("9-10PM", 0.035),
                ("10-11PM", 0.025), ("11-12PM", 0.020), ("12-1AM", 0.015), ("1-2AM", 0.010),
                ("2-3AM", 0.008), ("3-4AM", 0.007), ("4-5AM", 0.008), ("5-6AM", 0.03),
            ]),
            directions: vec![
                DirectionTotals::new(
                    "Bisil Bound",
                    vec![754, 1432, 856, 467, 731, 48, 43, 75, 578, 230, 264, 11],
                ),
                DirectionTotals::new(
                    "Athi River Bound",
                    vec![678, 1201, 934, 522, 642, 56, 34, 71, 561, 214, 282, 14],
                ),
            ],
            ..Self::sixteen_hour()
        }
    }

    /// Default profile location (e.g. `~/.config/traffic-counts/profile.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(PROFILE_DIR).join(PROFILE_FILE))
    }

    /// Load and validate a profile file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let profile: Profile = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        profile.validate()?;
        Ok(profile)
    }

    /// Explicit path, else an explicit preset, else the default location if
    /// present, else the default preset
    pub fn resolve(explicit: Option<&Path>, preset: Option<Preset>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            info!("Using profile {}", path.display());
            return Self::load(path);
        }
        if let Some(preset) = preset {
            info!(?preset, "Using built-in profile");
            return Ok(Self::preset(preset));
        }
        match Self::default_path() {
            Some(path) if path.exists() => {
                info!("Using profile {}", path.display());
                Self::load(&path)
            }
            _ => {
                let preset = Preset::default();
                info!(?preset, "Using built-in profile");
                Ok(Self::preset(preset))
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.directions.is_empty() {
            return Err(ConfigError::Invalid("no directions configured".to_string()));
        }
        for direction in &self.directions {
            if direction.name.trim().is_empty() {
                return Err(ConfigError::Invalid("direction with an empty name".to_string()));
            }
            if direction.totals.len() != VEHICLE_CLASSES {
                return Err(ConfigError::Invalid(format!(
                    "direction '{}' has {} class totals, expected {}",
                    direction.name,
                    direction.totals.len(),
                    VEHICLE_CLASSES
                )));
            }
        }

        for (name, weight) in &self.weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(ConfigError::Invalid(format!("weight for '{}' is {}", name, weight)));
            }
        }
        let strategy = &self.strategy;
        if !strategy.default_weight.is_finite() || strategy.default_weight < 0.0 {
            return Err(ConfigError::Invalid("default_weight must be non-negative".to_string()));
        }
        for (label, value) in [("variation", strategy.variation), ("row_variation", strategy.row_variation)] {
            if !(0.0..1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!("{} must be in [0, 1), got {}", label, value)));
            }
        }
        if self.reference_sheet == self.summary_sheet {
            return Err(ConfigError::Invalid(
                "reference sheet and summary sheet must differ".to_string(),
            ));
        }

        Ok(())
    }
}

fn weight_table(entries: &[(&str, f64)]) -> HashMap<String, f64> {
    entries
        .iter()
        .map(|(name, weight)| (name.to_string(), *weight))
        .collect()
}
