//! Convergence date: when every rhythm has been placed at least once.

use chrono::NaiveDate;

use crate::capacity::CapacityMap;
use crate::error::ValidationError;
use crate::event::EventLog;
use crate::rhythm::Rhythm;
use crate::scheduler::{horizon, Scheduler};

/// Look-ahead used when none is configured.
pub const DEFAULT_CONVERGENCE_DAYS: u32 = 365;

/// Latest first-assignment date over all rhythms, scheduling `[today, today + days)`.
///
/// A rhythm that never appears in the look-ahead contributes `today`, as does an empty catalog.
///
/// # Errors
/// Returns [`ValidationError::HorizonOutOfRange`] when the look-ahead runs past the calendar.
pub fn convergence(
    rhythms: &[Rhythm],
    events: &EventLog,
    capacity: &CapacityMap,
    today: NaiveDate,
    days: u32,
) -> Result<NaiveDate, ValidationError> {
    let limit =
        horizon(today, days).ok_or(ValidationError::HorizonOutOfRange { from: today, days })?;
    let schedule = Scheduler::new(rhythms, events, capacity).schedule(today, limit);
    Ok(rhythms
        .iter()
        .map(|r| schedule.first_assignment(r.id()).unwrap_or(today))
        .max()
        .unwrap_or(today))
}
