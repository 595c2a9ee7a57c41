use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const SCHEDULE_ENV: &str = "CREATOR_PAYOUTS_SCHEDULE";

/// Rates and caps of the payment model. Defaults are the published
/// creator terms; a JSON file may override any subset of fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayoutSchedule {
    /// Dollars per qualified active user per week.
    pub base_rate: f64,
    /// Dollars per new platform signup attributed to the creator.
    pub signup_bonus: f64,
    pub platform_multiplier: f64,
    pub external_multiplier: f64,
    pub weekly_cap: f64,
    pub monthly_cap: f64,
    /// Share of peak QAU a week must keep for the streak to continue.
    pub streak_threshold: f64,
}

impl Default for PayoutSchedule {
    fn default() -> Self {
        Self {
            base_rate: 2.0,
            signup_bonus: 2.0,
            platform_multiplier: 1.5,
            external_multiplier: 1.0,
            weekly_cap: 2000.0,
            monthly_cap: 5000.0,
            streak_threshold: 0.7,
        }
    }
}

impl PayoutSchedule {
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read payout schedule {}", path.display()))?;
        let schedule = serde_json::from_str(&raw)
            .with_context(|| format!("invalid payout schedule in {}", path.display()))?;
        Ok(schedule)
    }

    /// Loads from `path` if given, else from the file named by
    /// `CREATOR_PAYOUTS_SCHEDULE`, else the defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = path {
            return Self::from_json_file(path);
        }
        match std::env::var_os(SCHEDULE_ENV) {
            Some(value) if !value.is_empty() => Self::from_json_file(Path::new(&value)),
            _ => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "weekly_cap": 1500, "base_rate": 2.5 }}"#).unwrap();

        let schedule = PayoutSchedule::load(Some(file.path())).unwrap();
        assert_eq!(schedule.weekly_cap, 1500.0);
        assert_eq!(schedule.base_rate, 2.5);
        assert_eq!(schedule.monthly_cap, 5000.0);
        assert_eq!(schedule.platform_multiplier, 1.5);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "weekly_cap = 1500").unwrap();

        let err = PayoutSchedule::from_json_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("invalid payout schedule"));
    }

    // Only test that touches CREATOR_PAYOUTS_SCHEDULE.
    #[test]
    fn env_variable_names_the_schedule_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "monthly_cap": 4000 }}"#).unwrap();

        std::env::set_var(SCHEDULE_ENV, file.path());
        let from_env = PayoutSchedule::load(None);
        std::env::set_var(SCHEDULE_ENV, "");
        let from_empty = PayoutSchedule::load(None);
        std::env::remove_var(SCHEDULE_ENV);
        let from_unset = PayoutSchedule::load(None);

        let from_env = from_env.unwrap();
        assert_eq!(from_env.monthly_cap, 4000.0);
        assert_eq!(from_env.weekly_cap, 2000.0);
        assert_eq!(from_empty.unwrap(), PayoutSchedule::default());
        assert_eq!(from_unset.unwrap(), PayoutSchedule::default());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.json");
        assert!(PayoutSchedule::from_json_file(&path).is_err());
    }
}
