//! Unsmoothed schedule.

use chrono::NaiveDate;

use crate::event::EventLog;
use crate::rhythm::Rhythm;
use crate::scheduler::{continuing_beat, Schedule};

/// Each rhythm on its raw beats over `[start, limit)`, ignoring sliders and capacity.
///
/// A rhythm is left off the dates it was deferred on; dailies are also left off dates already
/// marked done.
pub fn basic_schedule(
    rhythms: &[Rhythm],
    events: &EventLog,
    start: NaiveDate,
    limit: NaiveDate,
) -> Schedule {
    let mut schedule = Schedule::empty(start, limit);
    if start >= limit {
        return schedule;
    }
    for rhythm in rhythms {
        let id = rhythm.id();
        let mut beat = continuing_beat(rhythm, start, events.latest_done(id));
        while beat < limit {
            let skipped =
                events.is_deferred(id, beat) || (rhythm.is_daily() && events.is_done_on(id, beat));
            if !skipped {
                schedule.days.entry(beat).or_default().push(rhythm.clone());
            }
            beat = rhythm.next_beat(beat);
        }
    }
    schedule
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Event, EventKind};
    use crate::rhythm::{Daily, RhythmId, Slider, WeekDaily};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn id(raw: &str) -> RhythmId {
        RhythmId::parse(raw).unwrap()
    }

    fn saturday(raw: &str) -> Rhythm {
        Rhythm::WeekDaily(WeekDaily::new(id(raw), raw, 5, Slider::new(2, 1)).unwrap())
    }

    fn ids(rhythms: &[Rhythm]) -> Vec<&str> {
        rhythms.iter().map(|r| r.id().as_str()).collect()
    }

    #[test]
    fn raw_beats_pile_up_without_capacity() {
        let rhythms = vec![
            Rhythm::Daily(Daily::new(id("d"), "d")),
            saturday("w1"),
            saturday("w2"),
        ];
        let schedule = basic_schedule(&rhythms, &EventLog::new(), date(2022, 11, 20), date(2022, 12, 4));
        assert_eq!(ids(schedule.on(date(2022, 11, 26))), vec!["d", "w1", "w2"]);
        assert_eq!(ids(schedule.on(date(2022, 11, 25))), vec!["d"]);
        assert_eq!(schedule.days.len(), 14);
    }

    #[test]
    fn deferred_and_done_dates_stay_empty() {
        let rhythms = vec![Rhythm::Daily(Daily::new(id("d"), "d")), saturday("w")];
        let events: EventLog = vec![
            Event::new(id("d"), EventKind::Done, date(2022, 11, 21)),
            Event::new(id("w"), EventKind::Defer, date(2022, 11, 26)),
        ]
        .into_iter()
        .collect();
        let schedule = basic_schedule(&rhythms, &events, date(2022, 11, 20), date(2022, 12, 4));
        assert!(schedule.on(date(2022, 11, 21)).is_empty());
        assert_eq!(ids(schedule.on(date(2022, 11, 26))), vec!["d"]);
        assert_eq!(ids(schedule.on(date(2022, 12, 3))), vec!["d", "w"]);
    }
}
