//! Payout and traffic-health calculations for mini-app creators.

pub mod config;
pub mod earnings;
pub mod error;
pub mod format;
pub mod health;
pub mod ledger;
pub mod models;
pub mod report;

pub use config::PayoutSchedule;
pub use error::InputError;
