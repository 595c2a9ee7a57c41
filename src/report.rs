use std::fmt::Write;

use crate::config::PayoutSchedule;
use crate::format::{format_currency, format_number, format_session_time, percent_change};
use crate::ledger;
use crate::models::{HealthReport, WeeklyEarningsEntry};

#[derive(Debug, Clone, PartialEq)]
pub struct AppSummary {
    pub app_id: String,
    pub app_name: String,
    pub weeks: usize,
    pub qau: f64,
    pub payout: f64,
}

/// Lifetime totals per app, busiest first.
pub fn summarize_by_app(entries: &[WeeklyEarningsEntry]) -> Vec<AppSummary> {
    let mut map: std::collections::HashMap<String, AppSummary> = std::collections::HashMap::new();

    for entry in entries {
        let summary = map.entry(entry.app_id.clone()).or_insert_with(|| AppSummary {
            app_id: entry.app_id.clone(),
            app_name: entry.app_name.clone(),
            weeks: 0,
            qau: 0.0,
            payout: 0.0,
        });
        summary.weeks += 1;
        summary.qau += entry.qau;
        summary.payout += entry.capped;
    }

    let mut summaries: Vec<AppSummary> = map.into_values().collect();
    summaries.sort_by(|a, b| {
        b.qau
            .partial_cmp(&a.qau)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.app_id.cmp(&b.app_id))
    });
    summaries
}

pub fn build_report(
    app_label: Option<&str>,
    entries: &[WeeklyEarningsEntry],
    health: Option<&HealthReport>,
    schedule: &PayoutSchedule,
) -> String {
    let weeks = ledger::aggregate_by_week(entries);
    let apps = summarize_by_app(entries);
    let month = ledger::monthly_from_weeks(&weeks, schedule);

    let mut output = String::new();
    let label = app_label.unwrap_or("all apps");

    let _ = writeln!(output, "# Creator Earnings Report");
    let _ = writeln!(output, "Generated for {label}");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Weekly Payouts");

    if weeks.is_empty() {
        let _ = writeln!(output, "No earnings recorded yet.");
    } else {
        let _ = writeln!(output, "| Week | QAU | Gross | Payout |");
        let _ = writeln!(output, "|------|-----|-------|--------|");
        for week in weeks.iter() {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} |",
                week.week_start,
                format_number(week.qau),
                format_currency(week.gross),
                format_currency(week.capped)
            );
        }

        if let [.., previous, current] = weeks.as_slice() {
            let _ = writeln!(output);
            let _ = writeln!(
                output,
                "QAU week over week: {:+}%",
                percent_change(current.qau, previous.qau)
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Last Four Weeks");
    let _ = writeln!(
        output,
        "- Earned {} of a {} monthly cap",
        format_currency(month.total),
        format_currency(schedule.monthly_cap)
    );
    let _ = writeln!(output, "- Paid out {}", format_currency(month.capped));
    if month.cap_applied {
        let _ = writeln!(
            output,
            "- Monthly cap reached; {} above the cap is not paid",
            format_currency(month.total - month.capped)
        );
    }

    if apps.len() > 1 {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Apps");
        for app in apps.iter() {
            let _ = writeln!(
                output,
                "- {}: {} QAU over {} weeks, {} paid",
                app.app_name,
                format_number(app.qau),
                app.weeks,
                format_currency(app.payout)
            );
        }
    }

    if let Some(health) = health {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Traffic Health");
        let _ = writeln!(
            output,
            "Score {}/100 ({})",
            health.score,
            health.status.label()
        );
        let _ = writeln!(
            output,
            "- Same IP: {}%",
            format_number(health.metrics.same_ip_percent)
        );
        let _ = writeln!(
            output,
            "- Bounce rate: {}%",
            format_number(health.metrics.bounce_rate)
        );
        let _ = writeln!(
            output,
            "- Avg session: {}",
            format_session_time(health.metrics.avg_session_seconds)
        );

        if health.flags.is_empty() {
            let _ = writeln!(output, "- No flags raised");
        } else {
            let labels: Vec<String> = health.flags.iter().map(|flag| flag.label()).collect();
            let _ = writeln!(output, "- Flags: {}", labels.join(", "));
        }
    }

    output
}
