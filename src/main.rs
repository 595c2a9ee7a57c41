use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use creator_payouts::earnings;
use creator_payouts::format::{format_currency, format_multiplier, format_number};
use creator_payouts::health::compute_health_score;
use creator_payouts::ledger;
use creator_payouts::models::{HealthReport, Period, TrafficFlag, UsageMetrics, WeeklyInput};
use creator_payouts::report;
use creator_payouts::PayoutSchedule;

#[derive(Parser)]
#[command(name = "creator-payouts")]
#[command(about = "Creator earnings and traffic health calculator", long_about = None)]
struct Cli {
    /// JSON file overriding payout rates and caps
    #[arg(long, global = true)]
    schedule: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate one week's payout
    Weekly {
        #[arg(long)]
        qau: f64,
        #[arg(long, default_value_t = 1)]
        streak_week: i64,
        #[arg(long, default_value_t = WeeklyInput::DEFAULT_PLATFORM_PERCENT)]
        platform_percent: f64,
        #[arg(long, default_value_t = 0.0)]
        new_signups: f64,
        /// Flat rate per QAU, no streak or platform weighting
        #[arg(long)]
        simple: bool,
        #[arg(long)]
        json: bool,
    },
    /// Apply the monthly cap to a run of weekly payouts
    Monthly {
        #[arg(required = true)]
        weeks: Vec<f64>,
        #[arg(long)]
        json: bool,
    },
    /// Score traffic quality
    Health {
        #[arg(long)]
        same_ip: f64,
        #[arg(long)]
        bounce_rate: f64,
        #[arg(long)]
        avg_session: f64,
        /// Flag raised by the backend, repeatable
        #[arg(long = "flag")]
        flags: Vec<String>,
        #[arg(long)]
        json: bool,
    },
    /// Write the beta cohort as a creators CSV
    Seed {
        #[arg(long, default_value = "creators.csv")]
        out: PathBuf,
    },
    /// Rank creators by QAU
    Leaderboard {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, value_enum, default_value_t = PeriodArg::Week)]
        period: PeriodArg,
        #[arg(long, default_value_t = ledger::LEADERBOARD_SIZE)]
        limit: usize,
    },
    /// Generate a markdown earnings report
    Report {
        #[arg(long)]
        csv: PathBuf,
        /// App id or name; all apps when omitted
        #[arg(long)]
        app: Option<String>,
        #[arg(long, requires_all = ["bounce_rate", "avg_session"])]
        same_ip: Option<f64>,
        #[arg(long, requires_all = ["same_ip", "avg_session"])]
        bounce_rate: Option<f64>,
        #[arg(long, requires_all = ["same_ip", "bounce_rate"])]
        avg_session: Option<f64>,
        #[arg(long = "flag")]
        flags: Vec<String>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PeriodArg {
    Week,
    Month,
    All,
}

impl From<PeriodArg> for Period {
    fn from(period: PeriodArg) -> Self {
        match period {
            PeriodArg::Week => Period::Week,
            PeriodArg::Month => Period::Month,
            PeriodArg::All => Period::All,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let schedule = PayoutSchedule::load(cli.schedule.as_deref())
        .context("failed to load payout schedule")?;

    match cli.command {
        Commands::Weekly {
            qau,
            streak_week,
            platform_percent,
            new_signups,
            simple,
            json,
        } => {
            let input = WeeklyInput {
                qau,
                streak_week,
                platform_percent,
                new_signups,
            };
            input.validate()?;

            let week = if simple {
                schedule.simple_weekly(qau)
            } else {
                schedule.weighted_weekly(&input)
            };
            if week.cap_applied {
                warn!(subtotal = week.subtotal, cap = schedule.weekly_cap, "weekly cap applied");
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&week)?);
                return Ok(());
            }

            println!("QAU {} ({} effective)", format_number(qau), format_number(week.effective_qau));
            if !simple {
                println!(
                    "Streak week {} ({}, {})",
                    streak_week,
                    earnings::streak_tier_label(streak_week),
                    format_multiplier(week.multiplier)
                );
                if let Some(next) = earnings::next_tier(streak_week) {
                    println!(
                        "Next tier at week {} ({}), {} weeks to go",
                        next.next_week,
                        format_multiplier(next.next_multiplier),
                        next.weeks_to_go
                    );
                }
            }
            println!("Base {}", format_currency(week.base_earnings));
            println!("Platform bonus {}", format_currency(week.platform_bonus));
            println!("Signup bonus {}", format_currency(week.signup_bonus));
            println!("Subtotal {}", format_currency(week.subtotal));
            println!(
                "Payout {}{}",
                format_currency(week.capped),
                if week.cap_applied { " (weekly cap)" } else { "" }
            );

            let projection = schedule.monthly(&[week.capped; 4]);
            println!(
                "Monthly projection {}{}",
                format_currency(projection.capped),
                if projection.cap_applied { " (monthly cap)" } else { "" }
            );
        }
        Commands::Monthly { weeks, json } => {
            let month = schedule.monthly(&weeks);
            if month.cap_applied {
                warn!(total = month.total, cap = schedule.monthly_cap, "monthly cap applied");
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&month)?);
            } else {
                println!("Total {}", format_currency(month.total));
                println!(
                    "Payout {}{}",
                    format_currency(month.capped),
                    if month.cap_applied { " (monthly cap)" } else { "" }
                );
            }
        }
        Commands::Health {
            same_ip,
            bounce_rate,
            avg_session,
            flags,
            json,
        } => {
            let metrics = UsageMetrics {
                same_ip_percent: same_ip,
                bounce_rate,
                avg_session_seconds: avg_session,
            };
            metrics.validate()?;
            let flags: Vec<TrafficFlag> = flags.into_iter().map(TrafficFlag::from).collect();

            if json {
                let report = HealthReport::from_metrics(metrics, flags);
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }

            let health = compute_health_score(&metrics);
            println!("Score {}/100 ({})", health.score, health.status.label());
            println!("- Session penalty {}", health.penalties.session);
            println!("- Bounce penalty {}", health.penalties.bounce);
            println!("- Same IP penalty {}", health.penalties.same_ip);
            for flag in flags.iter() {
                println!("- Flag: {}", flag.label());
            }
        }
        Commands::Seed { out } => {
            let creators = ledger::seed_creators(&schedule);
            ledger::write_creators_csv(&out, &creators)?;
            println!("Wrote {} creators to {}.", creators.len(), out.display());
        }
        Commands::Leaderboard { csv, period, limit } => {
            let creators = ledger::read_creators_csv(&csv, &schedule)?;
            let rows = ledger::leaderboard(&creators, period.into(), limit);

            if rows.is_empty() {
                println!("No creators found in {}.", csv.display());
                return Ok(());
            }

            println!("Top creators by QAU:");
            for row in rows.iter() {
                println!(
                    "{:>2}. {} ({}) {} QAU, {} {}",
                    row.rank,
                    row.name,
                    row.app_name,
                    format_number(row.qau),
                    row.tier_label,
                    format_multiplier(row.multiplier)
                );
            }
        }
        Commands::Report {
            csv,
            app,
            same_ip,
            bounce_rate,
            avg_session,
            flags,
            out,
        } => {
            let entries = ledger::read_earnings_csv(&csv)?;
            let entries = ledger::entries_for_app(&entries, app.as_deref());

            let health = match (same_ip, bounce_rate, avg_session) {
                (Some(same_ip_percent), Some(bounce_rate), Some(avg_session_seconds)) => {
                    let metrics = UsageMetrics {
                        same_ip_percent,
                        bounce_rate,
                        avg_session_seconds,
                    };
                    metrics.validate()?;
                    let flags = flags.into_iter().map(TrafficFlag::from).collect();
                    Some(HealthReport::from_metrics(metrics, flags))
                }
                _ => None,
            };

            let report = report::build_report(app.as_deref(), &entries, health.as_ref(), &schedule);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            info!(path = %out.display(), rows = entries.len(), "report written");
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
