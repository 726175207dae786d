//! Queries derived from the catalog, the event log and the scheduler.

mod basic;
mod convergence;
mod delinquency;
mod health;

pub use basic::basic_schedule;
pub use convergence::{convergence, DEFAULT_CONVERGENCE_DAYS};
pub use delinquency::{delinquent, is_delinquent};
pub use health::{health_check, health_history, HealthScore, DEFAULT_HEALTH_DAYS};
