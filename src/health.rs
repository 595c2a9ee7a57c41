use crate::models::{HealthReport, HealthScore, HealthStatus, PenaltyBreakdown, TrafficFlag, UsageMetrics};

const BASE_SCORE: i32 = 100;

pub fn session_penalty(avg_session_seconds: f64) -> i32 {
    if avg_session_seconds < 30.0 {
        -25
    } else if avg_session_seconds < 60.0 {
        -10
    } else {
        0
    }
}

pub fn bounce_penalty(bounce_rate: f64) -> i32 {
    if bounce_rate > 60.0 {
        -25
    } else if bounce_rate > 40.0 {
        -10
    } else {
        0
    }
}

pub fn same_ip_penalty(same_ip_percent: f64) -> i32 {
    if same_ip_percent > 30.0 {
        -30
    } else if same_ip_percent > 15.0 {
        -10
    } else {
        0
    }
}

pub fn compute_health_score(metrics: &UsageMetrics) -> HealthScore {
    let penalties = PenaltyBreakdown {
        session: session_penalty(metrics.avg_session_seconds),
        bounce: bounce_penalty(metrics.bounce_rate),
        same_ip: same_ip_penalty(metrics.same_ip_percent),
    };
    let score = (BASE_SCORE + penalties.total()).clamp(0, 100);

    HealthScore {
        score,
        status: HealthStatus::from_score(score),
        penalties,
    }
}

impl HealthStatus {
    pub fn from_score(score: i32) -> Self {
        match score {
            80.. => HealthStatus::Eligible,
            50..=79 => HealthStatus::AtRisk,
            _ => HealthStatus::UnderReview,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HealthStatus::Eligible => "eligible",
            HealthStatus::AtRisk => "at_risk",
            HealthStatus::UnderReview => "under_review",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HealthStatus::Eligible => "Eligible for payouts",
            HealthStatus::AtRisk => "At risk, improve the metrics below",
            HealthStatus::UnderReview => "Under review, fix flagged issues",
        }
    }
}

impl HealthReport {
    /// Scores `metrics` locally. `flags` come from the backend's detection
    /// and are kept as given, even when they disagree with the penalties.
    pub fn from_metrics(metrics: UsageMetrics, flags: Vec<TrafficFlag>) -> Self {
        let health = compute_health_score(&metrics);
        Self {
            score: health.score,
            status: health.status,
            penalties: health.penalties,
            metrics,
            flags,
        }
    }
}
