//! Rhythms that have fallen behind a reference date.

use chrono::NaiveDate;

use crate::event::EventLog;
use crate::rhythm::Rhythm;

/// Never done, or last done strictly before `reference`.
pub fn is_delinquent(rhythm: &Rhythm, events: &EventLog, reference: NaiveDate) -> bool {
    match events.latest_done(rhythm.id()) {
        Some(done) => done < reference,
        None => true,
    }
}

/// Delinquent rhythms relative to `reference`, in catalog order.
pub fn delinquent<'a>(
    rhythms: &'a [Rhythm],
    events: &EventLog,
    reference: NaiveDate,
) -> Vec<&'a Rhythm> {
    rhythms
        .iter()
        .filter(|r| is_delinquent(r, events, reference))
        .collect()
}
