use chrono::NaiveDate;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

pub const ANNUAL_METRICS_FILE: &str = "Annual_Metrics.csv";
pub const MONTHLY_METRICS_FILE: &str = "Monthly_Metrics.csv";
/// Appended to every chart title unless `TITLE_SUFFIX` is set (blank disables it)
pub const DEFAULT_TITLE_SUFFIX: &str = "Field";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid date for {key}: '{value}' (expected YYYY-MM-DD)")]
    InvalidDate { key: &'static str, value: String },

    #[error("Invalid number for {key}: '{value}'")]
    InvalidNumber { key: &'static str, value: String },

    #[error("Clip window is empty: {start} is after {end}")]
    EmptyClipWindow { start: NaiveDate, end: NaiveDate },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub clip_start: NaiveDate,
    pub clip_end: NaiveDate,
    pub daily_window_months: u32,
    pub title_suffix: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            clip_start: default_clip_start(),
            clip_end: default_clip_end(),
            daily_window_months: 60,
            title_suffix: Some(DEFAULT_TITLE_SUFFIX.to_string()),
        }
    }
}

fn default_clip_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(1969, 10, 1).unwrap_or_default()
}

fn default_clip_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2019, 9, 30).unwrap_or_default()
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|_| {})
    }

    /// Read the environment, apply `overrides`, then validate the result
    pub fn from_env_with<O>(overrides: O) -> Result<Self, ConfigError>
    where
        O: FnOnce(&mut Config),
    {
        Self::from_lookup_with(|key| env::var(key).ok(), overrides)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::from_lookup_with(lookup, |_| {})
    }

    /// Build from any key lookup. Unset keys take their defaults; set but
    /// unparseable values are errors. The window is checked only after
    /// `overrides` has run.
    pub fn from_lookup_with<F, O>(lookup: F, overrides: O) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
        O: FnOnce(&mut Config),
    {
        let defaults = Config::default();

        let clip_start = match lookup("CLIP_START") {
            Some(value) => parse_date("CLIP_START", &value)?,
            None => defaults.clip_start,
        };
        let clip_end = match lookup("CLIP_END") {
            Some(value) => parse_date("CLIP_END", &value)?,
            None => defaults.clip_end,
        };
        let daily_window_months = match lookup("DAILY_WINDOW_MONTHS") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidNumber {
                    key: "DAILY_WINDOW_MONTHS",
                    value,
                })?,
            None => defaults.daily_window_months,
        };

        let mut config = Config {
            data_dir: lookup("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            output_dir: lookup("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            clip_start,
            clip_end,
            daily_window_months,
            title_suffix: match lookup("TITLE_SUFFIX") {
                Some(suffix) => Some(suffix).filter(|s| !s.trim().is_empty()),
                None => defaults.title_suffix,
            },
        };
        overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.clip_start > self.clip_end {
            return Err(ConfigError::EmptyClipWindow {
                start: self.clip_start,
                end: self.clip_end,
            });
        }
        Ok(())
    }

    pub fn raw_path(&self, raw_file: &str) -> PathBuf {
        self.data_dir.join(raw_file)
    }

    pub fn annual_metrics_path(&self) -> PathBuf {
        self.data_dir.join(ANNUAL_METRICS_FILE)
    }

    pub fn monthly_metrics_path(&self) -> PathBuf {
        self.data_dir.join(MONTHLY_METRICS_FILE)
    }
}

pub fn parse_date(key: &'static str, value: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| ConfigError::InvalidDate {
        key,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.clip_start, NaiveDate::from_ymd_opt(1969, 10, 1).unwrap());
        assert_eq!(config.clip_end, NaiveDate::from_ymd_opt(2019, 9, 30).unwrap());
        assert_eq!(config.daily_window_months, 60);
        assert_eq!(config.title_suffix.as_deref(), Some("Field"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("DATA_DIR", "/data"),
            ("OUTPUT_DIR", "/out"),
            ("CLIP_START", "1980-10-01"),
            ("CLIP_END", "2010-09-30"),
            ("DAILY_WINDOW_MONTHS", "24"),
            ("TITLE_SUFFIX", "Field"),
        ]))
        .unwrap();
        assert_eq!(config.annual_metrics_path(), PathBuf::from("/data/Annual_Metrics.csv"));
        assert_eq!(config.monthly_metrics_path(), PathBuf::from("/data/Monthly_Metrics.csv"));
        assert_eq!(config.output_dir, PathBuf::from("/out"));
        assert_eq!(config.daily_window_months, 24);
        assert_eq!(config.title_suffix.as_deref(), Some("Field"));
    }

    #[test]
    fn test_blank_title_suffix_disables_default() {
        let config = Config::from_lookup(lookup(&[("TITLE_SUFFIX", "   ")])).unwrap();
        assert!(config.title_suffix.is_none());
    }

    #[test]
    fn test_invalid_date_is_an_error() {
        let err = Config::from_lookup(lookup(&[("CLIP_START", "10/01/1969")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDate { key: "CLIP_START", .. }));
    }

    #[test]
    fn test_invalid_window_months_is_an_error() {
        let err = Config::from_lookup(lookup(&[("DAILY_WINDOW_MONTHS", "five")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { .. }));
    }

    #[test]
    fn test_reversed_clip_window_is_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("CLIP_START", "2019-09-30"),
            ("CLIP_END", "1969-10-01"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyClipWindow { .. }));
    }

    #[test]
    fn test_overrides_can_repair_reversed_window() {
        let config = Config::from_lookup_with(
            lookup(&[("CLIP_START", "2019-09-30"), ("CLIP_END", "1969-10-01")]),
            |config| {
                config.clip_start = NaiveDate::from_ymd_opt(1969, 10, 1).unwrap();
                config.clip_end = NaiveDate::from_ymd_opt(2019, 9, 30).unwrap();
            },
        )
        .unwrap();
        assert!(config.clip_start < config.clip_end);
    }

    #[test]
    fn test_overrides_are_validated() {
        let err = Config::from_lookup_with(lookup(&[]), |config| {
            config.clip_end = NaiveDate::from_ymd_opt(1950, 1, 1).unwrap();
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyClipWindow { .. }));
    }

    #[test]
    #[serial]
    fn test_from_env_reads_process_environment() {
        env::set_var("DAILY_WINDOW_MONTHS", "12");
        let config = Config::from_env();
        env::remove_var("DAILY_WINDOW_MONTHS");
        assert_eq!(config.unwrap().daily_window_months, 12);
    }
}
