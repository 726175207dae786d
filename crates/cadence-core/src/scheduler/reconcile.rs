//! Turning an event history into the next due beat.

use chrono::{Days, NaiveDate};

use crate::event::EventLog;
use crate::rhythm::Rhythm;

/// The first beat on or after `start` that follows the last completion.
///
/// With no completion the rhythm simply starts at `start_beat(start)`. A Monthly or WeekDaily
/// beat that lands within `slider.before` days of the last completion is treated as already
/// satisfied by an early slide and skipped.
pub fn continuing_beat(rhythm: &Rhythm, start: NaiveDate, last_done: Option<NaiveDate>) -> NaiveDate {
    let Some(last_done) = last_done else {
        return rhythm.start_beat(start);
    };
    let mut beat = rhythm.next_beat(last_done);
    if rhythm.skip_beat_within_slider()
        && (beat - last_done).num_days() < rhythm.slider().before as i64
    {
        beat = rhythm.next_beat(beat);
    }
    while beat < start {
        beat = rhythm.next_beat(beat);
    }
    beat
}

/// The first due beat for a scheduling pass, stepping one day past each deferred date.
pub fn initial_beat(rhythm: &Rhythm, start: NaiveDate, events: &EventLog) -> NaiveDate {
    let id = rhythm.id();
    let mut beat = continuing_beat(rhythm, start, events.latest_done(id));
    while events.is_deferred(id, beat) {
        beat = beat + Days::new(1);
    }
    beat
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Event, EventKind};
    use crate::rhythm::{Daily, EveryNDays, Monthly, RhythmId, Slider, WeekDaily};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn id() -> RhythmId {
        RhythmId::parse("id").unwrap()
    }

    fn monthly() -> Rhythm {
        Rhythm::Monthly(Monthly::new(id(), "some monthly rhythm", 18, Slider::new(7, 3)).unwrap())
    }

    #[test]
    fn daily_continues_at_start() {
        let daily = Rhythm::Daily(Daily::new(id(), "some daily rhythm"));
        let beat = continuing_beat(&daily, date(2022, 11, 20), Some(date(2022, 11, 19)));
        assert_eq!(beat, date(2022, 11, 20));
    }

    #[test]
    fn monthly_done_early_skips_the_absorbed_beat() {
        // Done on 10-20; the 11-18 beat is not absorbed but falls before start.
        let beat = continuing_beat(&monthly(), date(2022, 11, 20), Some(date(2022, 10, 20)));
        assert_eq!(beat, date(2022, 12, 18));
    }

    #[test]
    fn monthly_lands_on_start_when_due() {
        let beat = continuing_beat(&monthly(), date(2022, 11, 18), Some(date(2022, 10, 17)));
        assert_eq!(beat, date(2022, 11, 18));
    }

    #[test]
    fn monthly_slid_early_completion_skips_a_beat() {
        // Done on 11-13, five days before the 11-18 beat and within slider.before = 7.
        let beat = continuing_beat(&monthly(), date(2022, 11, 14), Some(date(2022, 11, 13)));
        assert_eq!(beat, date(2022, 12, 18));
    }

    #[test]
    fn week_daily_slid_early_completion_skips_a_beat() {
        let saturday =
            Rhythm::WeekDaily(WeekDaily::new(id(), "trash", 5, Slider::new(2, 1)).unwrap());
        // Done Friday 11-18; Saturday 11-19 is one day later and within slider.before = 2.
        let beat = continuing_beat(&saturday, date(2022, 11, 19), Some(date(2022, 11, 18)));
        assert_eq!(beat, date(2022, 11, 26));
    }

    #[test]
    fn every_n_days_follows_history_without_skipping() {
        let every =
            Rhythm::EveryNDays(EveryNDays::new(id(), "water", 5, Slider::new(4, 0)).unwrap());
        let beat = continuing_beat(&every, date(2022, 11, 20), Some(date(2022, 11, 18)));
        assert_eq!(beat, date(2022, 11, 23));
    }

    #[test]
    fn never_done_uses_start_beat() {
        let beat = continuing_beat(&monthly(), date(2022, 11, 19), None);
        assert_eq!(beat, date(2022, 12, 18));
    }

    #[test]
    fn initial_beat_steps_past_deferrals() {
        let every = Rhythm::EveryNDays(EveryNDays::new(id(), "water", 14, Slider::default()).unwrap());
        let events: EventLog = vec![
            Event::new(id(), EventKind::Defer, date(2022, 11, 20)),
            Event::new(id(), EventKind::Defer, date(2022, 11, 21)),
        ]
        .into_iter()
        .collect();
        assert_eq!(initial_beat(&every, date(2022, 11, 20), &events), date(2022, 11, 22));
    }
}
