//! Capacity-aware rhythm scheduler.
//!
//! Distributes every due rhythm across the days of a window `[start, limit)`:
//! - Daily rhythms land on every day they are not done or deferred, outside any budget
//! - Periodic rhythms compete for each day's slot budget (see [`crate::capacity`])
//! - A beat that does not fit may slide within its [`SmoothingWindow`]
//! - A beat that cannot fit anywhere raises the watermarks of its window and the whole pass
//!   starts over
//!
//! The watermark map only grows, so the restart loop terminates.

mod reconcile;
mod window;

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BinaryHeap};

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::capacity::{slot_budget, CapacityMap, Watermarks};
use crate::event::EventLog;
use crate::rhythm::{Rhythm, RhythmId};

pub use reconcile::{continuing_beat, initial_beat};
pub use window::{candidates, SmoothingWindow};

/// Iterate the days of `[start, limit)`.
pub fn days_between(start: NaiveDate, limit: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d < limit)
}

/// The scheduler's output: the rhythms assigned to each day of `[start, limit)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub start: NaiveDate,
    pub limit: NaiveDate,
    pub days: BTreeMap<NaiveDate, Vec<Rhythm>>,
    /// Number of rebalancing restarts needed to produce this schedule.
    #[serde(default)]
    pub restarts: usize,
}

impl Schedule {
    /// A schedule with every day of `[start, limit)` present and empty.
    pub fn empty(start: NaiveDate, limit: NaiveDate) -> Self {
        Self {
            start,
            limit,
            days: days_between(start, limit).map(|d| (d, Vec::new())).collect(),
            restarts: 0,
        }
    }

    /// Rhythms assigned to `date`, empty outside the window.
    pub fn on(&self, date: NaiveDate) -> &[Rhythm] {
        self.days.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Earliest date `id` is assigned to.
    pub fn first_assignment(&self, id: &RhythmId) -> Option<NaiveDate> {
        self.days
            .iter()
            .find(|(_, rhythms)| rhythms.iter().any(|r| r.id() == id))
            .map(|(date, _)| *date)
    }

    /// Every date `id` is assigned to, in order.
    pub fn assignments(&self, id: &RhythmId) -> Vec<NaiveDate> {
        self.days
            .iter()
            .filter(|(_, rhythms)| rhythms.iter().any(|r| r.id() == id))
            .map(|(date, _)| *date)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.days.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A periodic rhythm waiting in the scheduling queue.
struct Pending<'a> {
    rhythm: &'a Rhythm,
    window: SmoothingWindow,
}

impl<'a> Pending<'a> {
    fn new(rhythm: &'a Rhythm, beat: NaiveDate, start: NaiveDate, limit: NaiveDate) -> Self {
        Self {
            rhythm,
            window: SmoothingWindow::new(rhythm, beat, start, limit),
        }
    }

    // Earliest date first, then the most constrained window, then the longest period.
    fn key(&self) -> (NaiveDate, usize, Reverse<u32>, &RhythmId) {
        (
            self.window.key_date(),
            self.window.remaining_choices().len(),
            Reverse(self.rhythm.approximate_periodicity()),
            self.rhythm.id(),
        )
    }
}

impl PartialEq for Pending<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Pending<'_> {}

impl PartialOrd for Pending<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

enum PassOutcome {
    Complete(BTreeMap<NaiveDate, Vec<Rhythm>>),
    /// A beat could not be placed; these are its option dates.
    Rebalance(Vec<NaiveDate>),
}

/// Smoothing scheduler over one catalog, event log and capacity map.
pub struct Scheduler<'a> {
    rhythms: &'a [Rhythm],
    events: &'a EventLog,
    capacity: &'a CapacityMap,
}

impl<'a> Scheduler<'a> {
    pub fn new(rhythms: &'a [Rhythm], events: &'a EventLog, capacity: &'a CapacityMap) -> Self {
        Self {
            rhythms,
            events,
            capacity,
        }
    }

    /// Schedule every rhythm over `[start, limit)`.
    ///
    /// Deterministic: the same inputs always yield the same schedule. An empty or inverted
    /// window yields an empty schedule.
    pub fn schedule(&self, start: NaiveDate, limit: NaiveDate) -> Schedule {
        if start >= limit {
            return Schedule::empty(start, limit);
        }
        let mut watermarks = Watermarks::new();
        let mut restarts = 0;
        loop {
            match self.pass(start, limit, &watermarks) {
                PassOutcome::Complete(days) => {
                    tracing::debug!(%start, %limit, restarts, "schedule complete");
                    return Schedule {
                        start,
                        limit,
                        days,
                        restarts,
                    };
                }
                PassOutcome::Rebalance(options) => {
                    let water = watermarks.flood(&options);
                    restarts += 1;
                    tracing::debug!(
                        restarts,
                        water,
                        first = ?options.first(),
                        last = ?options.last(),
                        "raised watermarks; restarting pass"
                    );
                }
            }
        }
    }

    fn pass(&self, start: NaiveDate, limit: NaiveDate, watermarks: &Watermarks) -> PassOutcome {
        let mut days = self.lay_down_dailies(start, limit);
        let mut load: BTreeMap<NaiveDate, usize> = BTreeMap::new();
        let mut queue: BinaryHeap<Reverse<Pending<'_>>> = self
            .rhythms
            .iter()
            .filter(|r| !r.is_daily())
            .map(|r| {
                let beat = initial_beat(r, start, self.events);
                Reverse(Pending::new(r, beat, start, limit))
            })
            .collect();

        while let Some(Reverse(mut pending)) = queue.pop() {
            if !pending.window.is_within(start, limit) {
                tracing::trace!(id = %pending.rhythm.id(), "beat falls outside the window");
                continue;
            }
            let date = pending.window.key_date();
            let rhythm = pending.rhythm;
            let id = rhythm.id();
            let budget = slot_budget(watermarks.base(date), self.capacity.spoons_on(date));
            let used = load.entry(date).or_insert(0);

            if self.events.is_deferred(id, date) {
                let moved = pending.window.defer_current();
                tracing::trace!(%id, %date, %moved, "deferred");
                queue.push(Reverse(pending));
            } else if *used < budget {
                *used += 1;
                days.entry(date).or_default().push(pending.rhythm.clone());
                tracing::trace!(%id, %date, budget, "assigned");
                let next = continuing_beat(pending.rhythm, start, Some(date));
                queue.push(Reverse(Pending::new(pending.rhythm, next, start, limit)));
            } else if pending.window.has_remaining() {
                let moved = pending.window.shift_one();
                tracing::trace!(%id, %date, %moved, budget, "day full; sliding");
                queue.push(Reverse(pending));
            } else {
                tracing::trace!(%id, %date, budget, "no room left in smoothing window");
                return PassOutcome::Rebalance(pending.window.option_dates());
            }
        }
        PassOutcome::Complete(days)
    }

    fn lay_down_dailies(&self, start: NaiveDate, limit: NaiveDate) -> BTreeMap<NaiveDate, Vec<Rhythm>> {
        let mut days = BTreeMap::new();
        for date in days_between(start, limit) {
            let slot: Vec<Rhythm> = self
                .rhythms
                .iter()
                .filter(|r| r.is_daily())
                .filter(|r| !self.events.is_done_on(r.id(), date))
                .filter(|r| !self.events.is_deferred(r.id(), date))
                .cloned()
                .collect();
            days.insert(date, slot);
        }
        days
    }
}

/// `date + days`, or `None` past the end of the calendar.
pub fn horizon(date: NaiveDate, days: u32) -> Option<NaiveDate> {
    date.checked_add_days(Days::new(days as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Event, EventKind};
    use crate::rhythm::{Daily, EveryNDays, Monthly, Slider, WeekDaily};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn id(raw: &str) -> RhythmId {
        RhythmId::parse(raw).unwrap()
    }

    fn daily(raw: &str) -> Rhythm {
        Rhythm::Daily(Daily::new(id(raw), raw))
    }

    fn saturday(raw: &str, slider: Slider) -> Rhythm {
        Rhythm::WeekDaily(WeekDaily::new(id(raw), raw, 5, slider).unwrap())
    }

    fn ids(rhythms: &[Rhythm]) -> Vec<&str> {
        rhythms.iter().map(|r| r.id().as_str()).collect()
    }

    // Sunday 2022-11-20 through Saturday 2022-12-03.
    fn window() -> (NaiveDate, NaiveDate) {
        (date(2022, 11, 20), date(2022, 12, 4))
    }

    #[test]
    fn every_day_is_a_key() {
        let (start, limit) = window();
        let schedule = Scheduler::new(&[], &EventLog::new(), &CapacityMap::default())
            .schedule(start, limit);
        assert_eq!(schedule.days.len(), 14);
        assert!(schedule.is_empty());
    }

    #[test]
    fn dailies_skip_done_and_deferred_days() {
        let (start, limit) = window();
        let rhythms = vec![daily("a"), daily("b")];
        let events: EventLog = vec![
            Event::new(id("a"), EventKind::Done, date(2022, 11, 21)),
            Event::new(id("b"), EventKind::Defer, date(2022, 11, 22)),
        ]
        .into_iter()
        .collect();
        let schedule = Scheduler::new(&rhythms, &events, &CapacityMap::default()).schedule(start, limit);
        assert_eq!(ids(schedule.on(date(2022, 11, 20))), vec!["a", "b"]);
        assert_eq!(ids(schedule.on(date(2022, 11, 21))), vec!["b"]);
        assert_eq!(ids(schedule.on(date(2022, 11, 22))), vec!["a"]);
    }

    #[test]
    fn week_daily_lands_on_its_weekday() {
        let (start, limit) = window();
        let rhythms = vec![saturday("w", Slider::new(2, 1))];
        let schedule = Scheduler::new(&rhythms, &EventLog::new(), &CapacityMap::default())
            .schedule(start, limit);
        assert_eq!(
            schedule.assignments(&id("w")),
            vec![date(2022, 11, 26), date(2022, 12, 3)]
        );
        assert_eq!(schedule.restarts, 0);
    }

    #[test]
    fn crowded_day_slides_within_slider() {
        let (start, limit) = window();
        let rhythms = vec![
            saturday("w1", Slider::new(2, 1)),
            saturday("w2", Slider::new(2, 1)),
        ];
        let schedule = Scheduler::new(&rhythms, &EventLog::new(), &CapacityMap::default())
            .schedule(start, limit);
        // One slot per day: w1 keeps Saturday, w2 slides to Friday.
        assert_eq!(ids(schedule.on(date(2022, 11, 26))), vec!["w1"]);
        assert_eq!(ids(schedule.on(date(2022, 11, 25))), vec!["w2"]);
        // The slid occurrence does not retrigger on the Saturday right after it.
        assert_eq!(
            schedule.assignments(&id("w2")),
            vec![date(2022, 11, 25), date(2022, 12, 2)]
        );
    }

    #[test]
    fn extra_spoons_open_a_second_slot() {
        let (start, limit) = window();
        let rhythms = vec![
            saturday("w1", Slider::new(2, 1)),
            saturday("w2", Slider::new(2, 1)),
        ];
        let mut capacity = CapacityMap::default();
        capacity.set(date(2022, 11, 26), 10);
        let schedule = Scheduler::new(&rhythms, &EventLog::new(), &capacity).schedule(start, limit);
        assert_eq!(ids(schedule.on(date(2022, 11, 26))), vec!["w1", "w2"]);
    }

    #[test]
    fn unslidable_collision_rebalances() {
        let (start, limit) = window();
        let rhythms = vec![
            saturday("w1", Slider::default()),
            saturday("w2", Slider::default()),
            saturday("w3", Slider::default()),
        ];
        let schedule = Scheduler::new(&rhythms, &EventLog::new(), &CapacityMap::default())
            .schedule(start, limit);
        assert_eq!(ids(schedule.on(date(2022, 11, 26))), vec!["w1", "w2", "w3"]);
        assert_eq!(ids(schedule.on(date(2022, 12, 3))), vec!["w1", "w2", "w3"]);
        assert!(schedule.restarts > 0);
        assert!(schedule.restarts <= rhythms.len() * 14);
    }

    #[test]
    fn deferral_pushes_a_beat_one_day() {
        let (start, limit) = window();
        let rhythms = vec![saturday("w", Slider::new(2, 1))];
        let events: EventLog = vec![Event::new(id("w"), EventKind::Defer, date(2022, 11, 26))]
            .into_iter()
            .collect();
        let schedule = Scheduler::new(&rhythms, &events, &CapacityMap::default()).schedule(start, limit);
        assert_eq!(schedule.first_assignment(&id("w")), Some(date(2022, 11, 27)));
    }

    #[test]
    fn deferral_past_the_limit_drops_the_beat() {
        let start = date(2022, 11, 20);
        let limit = date(2022, 11, 27);
        let rhythms = vec![saturday("w", Slider::default())];
        let events: EventLog = vec![Event::new(id("w"), EventKind::Defer, date(2022, 11, 26))]
            .into_iter()
            .collect();
        let schedule = Scheduler::new(&rhythms, &events, &CapacityMap::default()).schedule(start, limit);
        assert_eq!(schedule.first_assignment(&id("w")), None);
    }

    #[test]
    fn deferral_at_the_limit_slides_back_within_the_window() {
        let start = date(2022, 11, 20);
        let limit = date(2022, 11, 27);
        let rhythms = vec![saturday("w", Slider::new(2, 0))];
        let events: EventLog = vec![Event::new(id("w"), EventKind::Defer, date(2022, 11, 26))]
            .into_iter()
            .collect();
        let schedule = Scheduler::new(&rhythms, &events, &CapacityMap::default()).schedule(start, limit);
        assert_eq!(schedule.assignments(&id("w")), vec![date(2022, 11, 25)]);
    }

    #[test]
    fn queue_prefers_longer_periods_on_ties() {
        // Both due on Sunday 11-20 with one slot and no slider: the monthly is placed first.
        let start = date(2022, 11, 20);
        let limit = date(2022, 11, 21);
        let rhythms = vec![
            Rhythm::EveryNDays(EveryNDays::new(id("e"), "e", 14, Slider::default()).unwrap()),
            Rhythm::Monthly(Monthly::new(id("m"), "m", 20, Slider::default()).unwrap()),
        ];
        let schedule = Scheduler::new(&rhythms, &EventLog::new(), &CapacityMap::default())
            .schedule(start, limit);
        // Rebalancing makes room for both; the pop order still puts the monthly first.
        assert_eq!(ids(schedule.on(start)), vec!["m", "e"]);
    }

    #[test]
    fn inverted_window_is_empty() {
        let schedule = Scheduler::new(&[daily("a")], &EventLog::new(), &CapacityMap::default())
            .schedule(date(2022, 11, 20), date(2022, 11, 20));
        assert!(schedule.days.is_empty());
    }
}
