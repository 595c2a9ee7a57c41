use thiserror::Error;

/// Rejected calculator inputs.
///
/// The engine itself computes on whatever it is given; these checks exist
/// for callers that want to refuse nonsense before showing a payout.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("{field} must be a finite number, got {value}")]
    NotFinite { field: &'static str, value: f64 },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} must be between 0 and 100, got {value}")]
    PercentOutOfRange { field: &'static str, value: f64 },
}

pub(crate) fn check_non_negative(field: &'static str, value: f64) -> Result<(), InputError> {
    if !value.is_finite() {
        return Err(InputError::NotFinite { field, value });
    }
    if value < 0.0 {
        return Err(InputError::Negative { field, value });
    }
    Ok(())
}

pub(crate) fn check_percent(field: &'static str, value: f64) -> Result<(), InputError> {
    if !value.is_finite() {
        return Err(InputError::NotFinite { field, value });
    }
    if !(0.0..=100.0).contains(&value) {
        return Err(InputError::PercentOutOfRange { field, value });
    }
    Ok(())
}
