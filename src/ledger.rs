use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use tracing::info;

use crate::config::PayoutSchedule;
use crate::earnings::{streak_multiplier, streak_tier_label};
use crate::models::{
    CreatorRecord, LeaderboardRow, MonthlyEarnings, Period, TrafficFlag, WeekTotal,
    WeeklyEarningsEntry, WeeklyInput,
};

const LIST_SEPARATOR: char = ';';

pub const LEADERBOARD_SIZE: usize = 20;

#[derive(serde::Serialize, serde::Deserialize)]
struct CreatorCsvRow {
    id: String,
    name: String,
    app_name: String,
    category: String,
    weekly_qau: String,
    streak_week: Option<i64>,
    platform_percent: Option<f64>,
    health_score: i32,
    #[serde(default)]
    flags: String,
}

pub fn read_earnings_csv(csv_path: &Path) -> anyhow::Result<Vec<WeeklyEarningsEntry>> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut entries = Vec::new();

    for (line, result) in reader.deserialize::<WeeklyEarningsEntry>().enumerate() {
        let entry = result.with_context(|| {
            format!("bad earnings row {} in {}", line + 1, csv_path.display())
        })?;
        entries.push(entry);
    }

    info!(rows = entries.len(), path = %csv_path.display(), "loaded earnings rows");
    Ok(entries)
}

/// Reads creator rows. `weekly_qau` and `flags` are `;`-separated; a
/// missing `streak_week` is worked out from the QAU history and a missing
/// `platform_percent` falls back to the calculator default.
pub fn read_creators_csv(
    csv_path: &Path,
    schedule: &PayoutSchedule,
) -> anyhow::Result<Vec<CreatorRecord>> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut creators = Vec::new();

    for (line, result) in reader.deserialize::<CreatorCsvRow>().enumerate() {
        let row = result.with_context(|| {
            format!("bad creator row {} in {}", line + 1, csv_path.display())
        })?;
        let weekly_qau = parse_qau_list(&row.weekly_qau)
            .with_context(|| format!("bad weekly_qau for creator {}", row.id))?;
        let streak_week = row
            .streak_week
            .unwrap_or_else(|| schedule.streak_from_history(&weekly_qau));

        creators.push(CreatorRecord {
            id: row.id,
            name: row.name,
            app_name: row.app_name,
            category: row.category,
            weekly_qau,
            streak_week,
            platform_percent: row
                .platform_percent
                .unwrap_or(WeeklyInput::DEFAULT_PLATFORM_PERCENT),
            health_score: row.health_score,
            flags: parse_flags(&row.flags),
        });
    }

    info!(rows = creators.len(), path = %csv_path.display(), "loaded creators");
    Ok(creators)
}

pub fn write_creators_csv(csv_path: &Path, creators: &[CreatorRecord]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(csv_path)
        .with_context(|| format!("failed to create {}", csv_path.display()))?;

    for creator in creators {
        writer.serialize(CreatorCsvRow {
            id: creator.id.clone(),
            name: creator.name.clone(),
            app_name: creator.app_name.clone(),
            category: creator.category.clone(),
            weekly_qau: join_list(creator.weekly_qau.iter()),
            streak_week: Some(creator.streak_week),
            platform_percent: Some(creator.platform_percent),
            health_score: creator.health_score,
            flags: join_list(creator.flags.iter()),
        })?;
    }

    writer.flush()?;
    info!(rows = creators.len(), path = %csv_path.display(), "wrote creators");
    Ok(())
}

fn parse_qau_list(raw: &str) -> anyhow::Result<Vec<f64>> {
    raw.split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| {
            value
                .parse::<f64>()
                .with_context(|| format!("not a number: {value:?}"))
        })
        .collect()
}

fn parse_flags(raw: &str) -> Vec<TrafficFlag> {
    raw.split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(TrafficFlag::from)
        .collect()
}

fn join_list<T: ToString>(values: impl Iterator<Item = T>) -> String {
    values
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(&LIST_SEPARATOR.to_string())
}

/// The beta cohort used when no backend data is available.
pub fn seed_creators(schedule: &PayoutSchedule) -> Vec<CreatorRecord> {
    let cohort: [(&str, &str, &str, &str, [f64; 8], f64, f64, i32, &[&str]); 9] = [
        ("1", "Maya Chen", "StudyMatch", "Education", [0.0, 0.0, 0.0, 0.0, 0.0, 0.4, 0.7, 1.0], 68.0, 55.0, 91, &[]),
        ("2", "Jordan Wright", "CampusEats", "Food", [0.0, 0.0, 0.0, 0.0, 0.0, 0.5, 0.8, 0.9], 52.0, 70.0, 88, &[]),
        ("3", "Priya Patel", "RideShare Cal", "Transport", [0.0, 0.0, 0.0, 0.0, 0.0, 0.3, 0.6, 1.0], 85.0, 45.0, 95, &[]),
        ("4", "Marcus Johnson", "GymBuddy", "Fitness", [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.5, 0.8], 38.0, 60.0, 86, &[]),
        ("5", "Aisha Okafor", "NoteSwap", "Education", [0.0, 0.0, 0.0, 0.0, 0.0, 0.5, 0.75, 1.0], 94.0, 65.0, 93, &[]),
        ("6", "Tyler Kim", "PartyRadar", "Social", [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.9, 0.4], 30.0, 35.0, 58, &["high_bounce_rate"]),
        ("7", "Emma Rodriguez", "CampusConfessions", "Social", [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.6, 1.0], 47.0, 80.0, 84, &[]),
        ("8", "Sam Fisher", "ParkingSpot", "Utility", [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0], 12.0, 50.0, 70, &[]),
        ("9", "David Chikly", "SecretCrush", "Social", [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.6, 1.0], 78.0, 75.0, 94, &[]),
    ];

    cohort
        .into_iter()
        .map(
            |(id, name, app_name, category, pattern, peak, platform_percent, health_score, flags)| {
                let weekly_qau: Vec<f64> = pattern.iter().map(|p| (peak * p).round()).collect();
                CreatorRecord {
                    id: id.to_string(),
                    name: name.to_string(),
                    app_name: app_name.to_string(),
                    category: category.to_string(),
                    streak_week: schedule.streak_from_history(&weekly_qau),
                    weekly_qau,
                    platform_percent,
                    health_score,
                    flags: flags.iter().copied().map(TrafficFlag::from).collect(),
                }
            },
        )
        .collect()
}

/// Keeps rows whose app id or app name equals `app`; `None` keeps all.
pub fn entries_for_app(entries: &[WeeklyEarningsEntry], app: Option<&str>) -> Vec<WeeklyEarningsEntry> {
    match app {
        Some(app) => entries
            .iter()
            .filter(|entry| entry.app_id == app || entry.app_name == app)
            .cloned()
            .collect(),
        None => entries.to_vec(),
    }
}

/// Merges per-app rows that share a week, oldest week first.
pub fn aggregate_by_week(entries: &[WeeklyEarningsEntry]) -> Vec<WeekTotal> {
    let mut weeks: BTreeMap<chrono::NaiveDate, WeekTotal> = BTreeMap::new();

    for entry in entries {
        let week = weeks.entry(entry.week_start).or_insert_with(|| WeekTotal {
            week_start: entry.week_start,
            qau: 0.0,
            gross: 0.0,
            capped: 0.0,
        });
        week.qau += entry.qau;
        week.gross += entry.gross;
        week.capped += entry.capped;
    }

    weeks.into_values().collect()
}

/// Monthly cap over the payouts of the last four weeks.
pub fn monthly_from_weeks(weeks: &[WeekTotal], schedule: &PayoutSchedule) -> MonthlyEarnings {
    let start = weeks.len().saturating_sub(4);
    let payouts: Vec<f64> = weeks[start..].iter().map(|week| week.capped).collect();
    schedule.monthly(&payouts)
}

pub fn period_qau(weekly_qau: &[f64], period: Period) -> f64 {
    match period {
        Period::Week => weekly_qau.last().copied().unwrap_or(0.0),
        Period::Month => {
            let start = weekly_qau.len().saturating_sub(4);
            weekly_qau[start..].iter().sum()
        }
        Period::All => weekly_qau.iter().sum(),
    }
}

/// Creators ranked by QAU over `period`. Ties keep input order.
pub fn leaderboard(creators: &[CreatorRecord], period: Period, limit: usize) -> Vec<LeaderboardRow> {
    let mut ranked: Vec<(&CreatorRecord, f64)> = creators
        .iter()
        .map(|creator| (creator, period_qau(&creator.weekly_qau, period)))
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    ranked
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(index, (creator, qau))| LeaderboardRow {
            rank: index + 1,
            creator_id: creator.id.clone(),
            name: creator.name.clone(),
            app_name: creator.app_name.clone(),
            qau,
            streak_week: creator.streak_week,
            multiplier: streak_multiplier(creator.streak_week),
            tier_label: streak_tier_label(creator.streak_week),
        })
        .collect()
}
