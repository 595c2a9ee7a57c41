//! Weekly and monthly payout arithmetic.
//!
//! A creator earns the base rate per qualified active user, with users who
//! arrived through in-platform discovery weighted up, the whole amount
//! scaled by the streak multiplier, plus a flat bonus per attributed
//! signup. Weeks are capped individually and then again per month.

use tracing::debug;

use crate::config::PayoutSchedule;
use crate::models::{MonthlyEarnings, StreakTier, TierProgress, WeeklyEarnings, WeeklyInput};

impl StreakTier {
    pub fn for_week(streak_week: i64) -> Self {
        match streak_week {
            i64::MIN..=2 => StreakTier::Starter,
            3..=4 => StreakTier::Rising,
            5..=8 => StreakTier::Trending,
            _ => StreakTier::Elite,
        }
    }

    pub fn multiplier(self) -> f64 {
        match self {
            StreakTier::Starter => 1.0,
            StreakTier::Rising => 1.3,
            StreakTier::Trending => 1.6,
            StreakTier::Elite => 2.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StreakTier::Starter => "Starter",
            StreakTier::Rising => "Rising",
            StreakTier::Trending => "Trending",
            StreakTier::Elite => "Elite",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            StreakTier::Starter => "#94a3b8",
            StreakTier::Rising => "#3b82f6",
            StreakTier::Trending => "#8b5cf6",
            StreakTier::Elite => "#f59e0b",
        }
    }

    /// Last week of the previous tier, i.e. where progress toward this
    /// tier's successor starts counting.
    fn window_start(self) -> i64 {
        match self {
            StreakTier::Starter => 0,
            StreakTier::Rising => 2,
            StreakTier::Trending => 4,
            StreakTier::Elite => 8,
        }
    }

    fn next(self) -> Option<(StreakTier, i64)> {
        match self {
            StreakTier::Starter => Some((StreakTier::Rising, 3)),
            StreakTier::Rising => Some((StreakTier::Trending, 5)),
            StreakTier::Trending => Some((StreakTier::Elite, 9)),
            StreakTier::Elite => None,
        }
    }
}

pub fn streak_multiplier(streak_week: i64) -> f64 {
    StreakTier::for_week(streak_week).multiplier()
}

pub fn streak_tier_label(streak_week: i64) -> &'static str {
    StreakTier::for_week(streak_week).label()
}

pub fn streak_tier_color(streak_week: i64) -> &'static str {
    StreakTier::for_week(streak_week).color()
}

/// How far a creator is from the next multiplier step. `None` once the
/// top tier is reached.
pub fn next_tier(streak_week: i64) -> Option<TierProgress> {
    let tier = StreakTier::for_week(streak_week);
    let (next, next_week) = tier.next()?;
    let start = tier.window_start();
    let progress = (streak_week.max(0) - start) as f64 / (next_week - start) as f64 * 100.0;

    Some(TierProgress {
        next_week,
        next_multiplier: next.multiplier(),
        weeks_to_go: next_week - streak_week.max(0),
        progress_percent: progress.clamp(0.0, 100.0),
    })
}

impl PayoutSchedule {
    pub fn effective_qau(&self, total_qau: f64, platform_percent: f64) -> f64 {
        let platform_fraction = platform_percent / 100.0;
        let platform_qau = total_qau * platform_fraction * self.platform_multiplier;
        let external_qau = total_qau * (1.0 - platform_fraction) * self.external_multiplier;
        platform_qau + external_qau
    }

    /// Streak- and platform-weighted payout for one week.
    ///
    /// `platform_bonus` is reported after the streak multiplier, so
    /// `base_earnings + platform_bonus` only matches `subtotal` (minus the
    /// signup bonus) when the multiplier is 1.0.
    pub fn weighted_weekly(&self, input: &WeeklyInput) -> WeeklyEarnings {
        let multiplier = streak_multiplier(input.streak_week);
        let effective_qau = self.effective_qau(input.qau, input.platform_percent);
        let base_earnings = input.qau * self.base_rate;
        let platform_bonus = (effective_qau - input.qau) * self.base_rate;
        let signup_bonus = input.new_signups * self.signup_bonus;
        let subtotal = effective_qau * self.base_rate * multiplier + signup_bonus;
        let capped = subtotal.min(self.weekly_cap);
        let cap_applied = subtotal > self.weekly_cap;

        debug!(
            qau = input.qau,
            streak_week = input.streak_week,
            effective_qau,
            multiplier,
            subtotal,
            cap_applied,
            "weekly earnings computed"
        );

        WeeklyEarnings {
            base_earnings,
            effective_qau,
            multiplier,
            platform_bonus: platform_bonus * multiplier,
            signup_bonus,
            subtotal,
            capped,
            cap_applied,
        }
    }

    /// Flat `qau * rate` payout with no streak or platform adjustment.
    pub fn simple_weekly(&self, qau: f64) -> WeeklyEarnings {
        let earnings = qau * self.base_rate;
        WeeklyEarnings {
            base_earnings: earnings,
            effective_qau: qau,
            multiplier: 1.0,
            platform_bonus: 0.0,
            signup_bonus: 0.0,
            subtotal: earnings,
            capped: earnings.min(self.weekly_cap),
            cap_applied: earnings > self.weekly_cap,
        }
    }

    pub fn monthly(&self, weekly_capped: &[f64]) -> MonthlyEarnings {
        let total: f64 = weekly_capped.iter().sum();
        MonthlyEarnings {
            total,
            capped: total.min(self.monthly_cap),
            cap_applied: total > self.monthly_cap,
        }
    }

    pub fn is_streak_maintained(&self, current_qau: f64, peak_qau: f64) -> bool {
        if peak_qau == 0.0 {
            return current_qau > 0.0;
        }
        current_qau >= peak_qau * self.streak_threshold
    }

    /// Length of the streak running into the latest week of `weekly_qau`
    /// (oldest first). A week below the threshold restarts the count, and
    /// a week with no users ends it.
    pub fn streak_from_history(&self, weekly_qau: &[f64]) -> i64 {
        let mut streak = 0;
        let mut peak = 0.0_f64;

        for &qau in weekly_qau {
            if qau <= 0.0 {
                streak = 0;
                peak = 0.0;
            } else if self.is_streak_maintained(qau, peak) {
                streak += 1;
                peak = peak.max(qau);
            } else {
                streak = 1;
                peak = qau;
            }
        }

        streak
    }
}

pub fn effective_qau(total_qau: f64, platform_percent: f64) -> f64 {
    PayoutSchedule::default().effective_qau(total_qau, platform_percent)
}

pub fn weighted_weekly_earnings(
    qau: f64,
    streak_week: i64,
    platform_percent: f64,
    new_signups: f64,
) -> WeeklyEarnings {
    PayoutSchedule::default().weighted_weekly(&WeeklyInput {
        qau,
        streak_week,
        platform_percent,
        new_signups,
    })
}

pub fn simple_weekly_earnings(qau: f64) -> WeeklyEarnings {
    PayoutSchedule::default().simple_weekly(qau)
}

pub fn monthly_earnings(weekly_capped: &[f64]) -> MonthlyEarnings {
    PayoutSchedule::default().monthly(weekly_capped)
}

/// Month estimate assuming four weeks like this one.
pub fn monthly_projection(weekly_capped: f64) -> MonthlyEarnings {
    monthly_earnings(&[weekly_capped; 4])
}

pub fn is_streak_maintained(current_qau: f64, peak_qau: f64) -> bool {
    PayoutSchedule::default().is_streak_maintained(current_qau, peak_qau)
}

pub fn streak_from_history(weekly_qau: &[f64]) -> i64 {
    PayoutSchedule::default().streak_from_history(weekly_qau)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn multipliers_follow_expected_tiers() {
        assert_eq!(streak_multiplier(-3), 1.0);
        assert_eq!(streak_multiplier(0), 1.0);
        assert_eq!(streak_multiplier(1), 1.0);
        assert_eq!(streak_multiplier(2), 1.0);
        assert_eq!(streak_multiplier(3), 1.3);
        assert_eq!(streak_multiplier(4), 1.3);
        assert_eq!(streak_multiplier(5), 1.6);
        assert_eq!(streak_multiplier(8), 1.6);
        assert_eq!(streak_multiplier(9), 2.0);
        assert_eq!(streak_multiplier(52), 2.0);
    }

    #[test]
    fn labels_and_colors_change_at_the_same_weeks() {
        assert_eq!(streak_tier_label(2), "Starter");
        assert_eq!(streak_tier_label(3), "Rising");
        assert_eq!(streak_tier_label(8), "Trending");
        assert_eq!(streak_tier_label(9), "Elite");
        assert_eq!(streak_tier_color(2), "#94a3b8");
        assert_eq!(streak_tier_color(3), "#3b82f6");
        assert_eq!(streak_tier_color(5), "#8b5cf6");
        assert_eq!(streak_tier_color(9), "#f59e0b");
    }

    #[test]
    fn effective_qau_endpoints() {
        assert!(close(effective_qau(400.0, 0.0), 400.0));
        assert!(close(effective_qau(400.0, 100.0), 600.0));
        assert!(close(effective_qau(400.0, 50.0), 500.0));
    }

    #[test]
    fn weighted_week_hits_the_cap() {
        let week = weighted_weekly_earnings(500.0, 5, 60.0, 0.0);
        assert_eq!(week.multiplier, 1.6);
        assert!(close(week.effective_qau, 650.0));
        assert!(close(week.base_earnings, 1000.0));
        assert!(close(week.subtotal, 2080.0));
        assert_eq!(week.capped, 2000.0);
        assert!(week.cap_applied);
    }

    #[test]
    fn platform_bonus_carries_the_multiplier() {
        let week = weighted_weekly_earnings(100.0, 3, 100.0, 10.0);
        // (150 - 100) * $2 = $100 before the 1.3x streak bonus.
        assert!(close(week.platform_bonus, 130.0));
        assert!(close(week.signup_bonus, 20.0));
        assert!(close(week.subtotal, 150.0 * 2.0 * 1.3 + 20.0));
        assert!(!week.cap_applied);
        assert!(close(week.capped, week.subtotal));
    }

    #[test]
    fn simple_week_ignores_streak_and_platform() {
        let week = simple_weekly_earnings(100.0);
        assert_eq!(week.subtotal, 200.0);
        assert_eq!(week.capped, 200.0);
        assert!(!week.cap_applied);
        assert_eq!(week.multiplier, 1.0);

        let big = simple_weekly_earnings(1500.0);
        assert_eq!(big.subtotal, 3000.0);
        assert_eq!(big.capped, 2000.0);
        assert!(big.cap_applied);
    }

    #[test]
    fn simple_and_weighted_differ_for_same_qau() {
        let simple = simple_weekly_earnings(300.0);
        let weighted = weighted_weekly_earnings(300.0, 1, 60.0, 0.0);
        assert!(weighted.capped > simple.capped);
    }

    #[test]
    fn month_is_capped() {
        let month = monthly_earnings(&[2000.0, 2000.0, 1500.0, 0.0]);
        assert_eq!(month.total, 5500.0);
        assert_eq!(month.capped, 5000.0);
        assert!(month.cap_applied);

        let short = monthly_earnings(&[100.0, 250.0]);
        assert_eq!(short.total, 350.0);
        assert!(!short.cap_applied);

        assert_eq!(monthly_earnings(&[]).total, 0.0);
    }

    #[test]
    fn exactly_at_cap_is_not_flagged() {
        let month = monthly_earnings(&[1250.0; 4]);
        assert_eq!(month.capped, 5000.0);
        assert!(!month.cap_applied);

        let week = simple_weekly_earnings(1000.0);
        assert_eq!(week.capped, 2000.0);
        assert!(!week.cap_applied);
    }

    #[test]
    fn projection_uses_four_weeks() {
        let month = monthly_projection(1400.0);
        assert_eq!(month.total, 5600.0);
        assert_eq!(month.capped, 5000.0);
        assert!(month.cap_applied);
    }

    #[test]
    fn streak_threshold_is_seventy_percent_of_peak() {
        assert!(is_streak_maintained(70.0, 100.0));
        assert!(!is_streak_maintained(69.0, 100.0));
        assert!(is_streak_maintained(1.0, 0.0));
        assert!(!is_streak_maintained(0.0, 0.0));
    }

    #[test]
    fn streak_counts_trailing_run() {
        assert_eq!(streak_from_history(&[0.0, 0.0, 27.0, 48.0, 68.0]), 3);
        // 12 < 0.7 * 27 restarts the run at that week.
        assert_eq!(streak_from_history(&[0.0, 27.0, 12.0]), 1);
        assert_eq!(streak_from_history(&[10.0, 20.0, 0.0]), 0);
        assert_eq!(streak_from_history(&[]), 0);
        assert_eq!(streak_from_history(&[50.0, 40.0, 36.0, 36.0]), 4);
    }

    #[test]
    fn next_tier_progress() {
        let starter = next_tier(1).unwrap();
        assert_eq!(starter.next_week, 3);
        assert_eq!(starter.next_multiplier, 1.3);
        assert_eq!(starter.weeks_to_go, 2);
        assert!(close(starter.progress_percent, 100.0 / 3.0));

        let rising = next_tier(4).unwrap();
        assert_eq!(rising.next_week, 5);
        assert!(close(rising.progress_percent, 200.0 / 3.0));

        let trending = next_tier(6).unwrap();
        assert_eq!(trending.next_week, 9);
        assert_eq!(trending.weeks_to_go, 3);
        assert!(close(trending.progress_percent, 40.0));

        assert!(next_tier(9).is_none());
        assert_eq!(next_tier(-2).unwrap().progress_percent, 0.0);
    }

    #[test]
    fn custom_schedule_changes_caps() {
        let schedule = PayoutSchedule {
            weekly_cap: 500.0,
            ..PayoutSchedule::default()
        };
        let week = schedule.simple_weekly(300.0);
        assert_eq!(week.capped, 500.0);
        assert!(week.cap_applied);
    }

    proptest! {
        #[test]
        fn multiplier_never_decreases(week in -10i64..200) {
            let m = streak_multiplier(week);
            prop_assert!([1.0, 1.3, 1.6, 2.0].contains(&m));
            prop_assert!(streak_multiplier(week + 1) >= m);
        }

        #[test]
        fn effective_qau_is_bounded_by_its_endpoints(q in 0.0f64..1e6, p in 0.0f64..=100.0) {
            let eff = effective_qau(q, p);
            prop_assert!(eff >= q - 1e-6);
            prop_assert!(eff <= 1.5 * q + 1e-6);
            prop_assert!((effective_qau(q, 0.0) - q).abs() < 1e-6);
            prop_assert!((effective_qau(q, 100.0) - 1.5 * q).abs() < 1e-6);
        }

        #[test]
        fn weekly_cap_is_consistent(
            q in 0.0f64..5000.0,
            week in 0i64..20,
            p in 0.0f64..=100.0,
            s in 0.0f64..500.0,
        ) {
            let e = weighted_weekly_earnings(q, week, p, s);
            prop_assert!(e.capped <= 2000.0);
            prop_assert_eq!(e.cap_applied, e.subtotal > 2000.0);
            prop_assert_eq!(e.capped, e.subtotal.min(2000.0));
        }

        #[test]
        fn monthly_cap_is_consistent(weeks in prop::collection::vec(0.0f64..2000.0, 0..6)) {
            let m = monthly_earnings(&weeks);
            prop_assert!(m.capped <= 5000.0);
            prop_assert_eq!(m.cap_applied, m.total > 5000.0);
        }
    }
}
