use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{self, InputError};

/// Traffic-quality snapshot for one app, or a creator's aggregate, over a
/// reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UsageMetrics {
    pub same_ip_percent: f64,
    pub bounce_rate: f64,
    pub avg_session_seconds: f64,
}

impl UsageMetrics {
    pub fn validate(&self) -> Result<(), InputError> {
        error::check_percent("same_ip_percent", self.same_ip_percent)?;
        error::check_percent("bounce_rate", self.bounce_rate)?;
        error::check_non_negative("avg_session_seconds", self.avg_session_seconds)
    }
}

/// Arguments to the weighted weekly calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeeklyInput {
    pub qau: f64,
    pub streak_week: i64,
    pub platform_percent: f64,
    pub new_signups: f64,
}

impl WeeklyInput {
    pub const DEFAULT_PLATFORM_PERCENT: f64 = 60.0;

    pub fn new(qau: f64, streak_week: i64) -> Self {
        Self {
            qau,
            streak_week,
            platform_percent: Self::DEFAULT_PLATFORM_PERCENT,
            new_signups: 0.0,
        }
    }

    pub fn validate(&self) -> Result<(), InputError> {
        error::check_non_negative("qau", self.qau)?;
        error::check_percent("platform_percent", self.platform_percent)?;
        error::check_non_negative("new_signups", self.new_signups)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeeklyEarnings {
    pub base_earnings: f64,
    pub effective_qau: f64,
    pub multiplier: f64,
    pub platform_bonus: f64,
    pub signup_bonus: f64,
    pub subtotal: f64,
    pub capped: f64,
    pub cap_applied: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyEarnings {
    pub total: f64,
    pub capped: f64,
    pub cap_applied: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreakTier {
    Starter,
    Rising,
    Trending,
    Elite,
}

/// Distance to the next streak tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TierProgress {
    pub next_week: i64,
    pub next_multiplier: f64,
    pub weeks_to_go: i64,
    pub progress_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Eligible,
    AtRisk,
    UnderReview,
}

/// Points taken off the base score of 100, per metric. Each value is zero
/// or negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyBreakdown {
    pub session: i32,
    pub bounce: i32,
    pub same_ip: i32,
}

impl PenaltyBreakdown {
    pub fn total(&self) -> i32 {
        self.session + self.bounce + self.same_ip
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthScore {
    pub score: i32,
    pub status: HealthStatus,
    pub penalties: PenaltyBreakdown,
}

/// Categorical traffic tag raised by the backend's own detection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TrafficFlag {
    SameIpCluster,
    HighBounceRate,
    LowSessionTime,
    Other(String),
}

impl TrafficFlag {
    pub fn as_str(&self) -> &str {
        match self {
            TrafficFlag::SameIpCluster => "same_ip_cluster",
            TrafficFlag::HighBounceRate => "high_bounce_rate",
            TrafficFlag::LowSessionTime => "low_session_time",
            TrafficFlag::Other(tag) => tag,
        }
    }

    /// The tag with underscores turned into spaces.
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl From<String> for TrafficFlag {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "same_ip_cluster" => TrafficFlag::SameIpCluster,
            "high_bounce_rate" => TrafficFlag::HighBounceRate,
            "low_session_time" => TrafficFlag::LowSessionTime,
            _ => TrafficFlag::Other(tag),
        }
    }
}

impl From<&str> for TrafficFlag {
    fn from(tag: &str) -> Self {
        TrafficFlag::from(tag.to_string())
    }
}

impl From<TrafficFlag> for String {
    fn from(flag: TrafficFlag) -> Self {
        flag.as_str().to_string()
    }
}

impl fmt::Display for TrafficFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score, metrics and backend flags for one app or creator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub score: i32,
    pub status: HealthStatus,
    pub penalties: PenaltyBreakdown,
    pub metrics: UsageMetrics,
    pub flags: Vec<TrafficFlag>,
}

/// One per-app-per-week row as returned by the earnings backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyEarningsEntry {
    pub week_start: NaiveDate,
    pub app_id: String,
    pub app_name: String,
    pub qau: f64,
    pub gross: f64,
    pub capped: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekTotal {
    pub week_start: NaiveDate,
    pub qau: f64,
    pub gross: f64,
    pub capped: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatorRecord {
    pub id: String,
    pub name: String,
    pub app_name: String,
    pub category: String,
    /// Last eight weeks, oldest first.
    pub weekly_qau: Vec<f64>,
    pub streak_week: i64,
    pub platform_percent: f64,
    pub health_score: i32,
    pub flags: Vec<TrafficFlag>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Week,
    Month,
    All,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardRow {
    pub rank: usize,
    pub creator_id: String,
    pub name: String,
    pub app_name: String,
    pub qau: f64,
    pub streak_week: i64,
    pub multiplier: f64,
    pub tier_label: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_flags_parse_and_unknown_tags_survive() {
        assert_eq!(TrafficFlag::from("same_ip_cluster"), TrafficFlag::SameIpCluster);
        assert_eq!(
            TrafficFlag::from("vpn_burst"),
            TrafficFlag::Other("vpn_burst".to_string())
        );
        assert_eq!(TrafficFlag::from("vpn_burst").as_str(), "vpn_burst");
        assert_eq!(TrafficFlag::HighBounceRate.label(), "high bounce rate");
    }

    #[test]
    fn flags_serialize_as_plain_tags() {
        let flags = vec![TrafficFlag::LowSessionTime, TrafficFlag::from("bot_ua")];
        let json = serde_json::to_string(&flags).unwrap();
        assert_eq!(json, r#"["low_session_time","bot_ua"]"#);
        let back: Vec<TrafficFlag> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, flags);
    }

    #[test]
    fn status_uses_backend_spelling() {
        let json = serde_json::to_string(&HealthStatus::UnderReview).unwrap();
        assert_eq!(json, r#""under_review""#);
    }

    #[test]
    fn weekly_input_defaults_match_dashboard() {
        let input = WeeklyInput::new(120.0, 3);
        assert_eq!(input.platform_percent, 60.0);
        assert_eq!(input.new_signups, 0.0);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn validation_rejects_out_of_range_values() {
        let mut input = WeeklyInput::new(-5.0, 1);
        assert!(matches!(
            input.validate(),
            Err(InputError::Negative { field: "qau", .. })
        ));
        input.qau = 10.0;
        input.platform_percent = 140.0;
        assert!(matches!(
            input.validate(),
            Err(InputError::PercentOutOfRange {
                field: "platform_percent",
                ..
            })
        ));

        let metrics = UsageMetrics {
            same_ip_percent: 12.0,
            bounce_rate: 30.0,
            avg_session_seconds: -1.0,
        };
        assert!(metrics.validate().is_err());
    }
}
