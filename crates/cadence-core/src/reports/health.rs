//! Accumulated lateness across the catalog.

use std::fmt;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::event::EventLog;
use crate::rhythm::Rhythm;

/// Trailing window used when none is configured.
pub const DEFAULT_HEALTH_DAYS: u32 = 30;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthScore {
    /// Days by which overdue rhythms have missed their next beat, summed.
    pub delay_days: u64,
    /// Rhythms with no completion before the reference date.
    pub never_done: u64,
}

impl fmt::Display for HealthScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "delay: {}, never done: {}", self.delay_days, self.never_done)
    }
}

/// Health as of `boundary`, counting only completions strictly before it.
pub fn health_check(rhythms: &[Rhythm], events: &EventLog, boundary: NaiveDate) -> HealthScore {
    let mut score = HealthScore::default();
    for rhythm in rhythms {
        let Some(done) = events.latest_done_before(rhythm.id(), boundary) else {
            score.never_done += 1;
            continue;
        };
        let next = rhythm.next_beat(done);
        if next < boundary {
            score.delay_days += (boundary - next).num_days() as u64;
        }
    }
    score
}

/// [`health_check`] for each of the `days` dates ending the day before `limit`, oldest first.
pub fn health_history(
    rhythms: &[Rhythm],
    events: &EventLog,
    limit: NaiveDate,
    days: u32,
) -> Vec<(NaiveDate, HealthScore)> {
    (1..=days as u64)
        .rev()
        .filter_map(|back| limit.checked_sub_days(Days::new(back)))
        .map(|date| (date, health_check(rhythms, events, date)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Event, EventKind};
    use crate::rhythm::{Daily, Monthly, RhythmId, Slider};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn catalog() -> (Vec<Rhythm>, EventLog) {
        let daily = RhythmId::parse("d").unwrap();
        let monthly = RhythmId::parse("m").unwrap();
        let rhythms = vec![
            Rhythm::Daily(Daily::new(daily.clone(), "floss")),
            Rhythm::Monthly(Monthly::new(monthly, "rent", 18, Slider::default()).unwrap()),
            Rhythm::Daily(Daily::new(RhythmId::parse("n").unwrap(), "never")),
        ];
        let events: EventLog = vec![
            Event::new(daily.clone(), EventKind::Done, date(2022, 11, 10)),
            Event::new(RhythmId::parse("m").unwrap(), EventKind::Done, date(2022, 10, 18)),
        ]
        .into_iter()
        .collect();
        (rhythms, events)
    }

    #[test]
    fn delay_sums_days_past_next_beat() {
        let (rhythms, events) = catalog();
        // Daily next beat 11-11, nine days late; monthly next beat 11-18, two days late.
        let score = health_check(&rhythms, &events, date(2022, 11, 20));
        assert_eq!(score, HealthScore { delay_days: 11, never_done: 1 });
        assert_eq!(score.to_string(), "delay: 11, never done: 1");
    }

    #[test]
    fn completions_on_the_boundary_are_ignored() {
        let (rhythms, events) = catalog();
        let score = health_check(&rhythms, &events, date(2022, 11, 10));
        // The daily's 11-10 completion is not strictly before the boundary.
        assert_eq!(score.never_done, 2);
        assert_eq!(score.delay_days, 0);
    }

    #[test]
    fn history_ends_the_day_before_limit() {
        let (rhythms, events) = catalog();
        let history = health_history(&rhythms, &events, date(2022, 11, 21), 3);
        let dates: Vec<NaiveDate> = history.iter().map(|(d, _)| *d).collect();
        assert_eq!(dates, vec![date(2022, 11, 18), date(2022, 11, 19), date(2022, 11, 20)]);
        assert_eq!(history[2].1.delay_days, 11);
    }
}
