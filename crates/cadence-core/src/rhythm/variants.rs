//! The four recurrence kinds and their beat arithmetic.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{RhythmId, Slider};
use crate::error::ValidationError;

/// Upper bound on either side of any slider.
pub const MAX_SLIDER: u32 = 89;
/// Upper bound on either side of a monthly slider.
pub const MAX_MONTHLY_SLIDER: u32 = 28;
/// Upper bound on either side of a week-daily slider.
pub const MAX_WEEK_DAILY_SLIDER: u32 = 6;

pub const MIN_DOTM: u32 = 1;
pub const MAX_DOTM: u32 = 31;
pub const MIN_DOTW: u32 = 0;
pub const MAX_DOTW: u32 = 6;
pub const MIN_EVERY_N: u32 = 2;
pub const MAX_EVERY_N: u32 = 90;

fn succ(date: NaiveDate) -> NaiveDate {
    date + Days::new(1)
}

fn pred(date: NaiveDate) -> NaiveDate {
    date - Days::new(1)
}

/// Day of the week with Monday = 0.
pub fn weekday_index(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_monday()
}

fn check_slider(slider: Slider, max: u32) -> Result<(), ValidationError> {
    let max = max.min(MAX_SLIDER) as i64;
    ValidationError::check_range("slider.before", slider.before as i64, 0, max)?;
    ValidationError::check_range("slider.after", slider.after as i64, 0, max)?;
    Ok(())
}

// Advance (or retreat) one day at a time until `matches` holds, always moving at least one day.
fn step_until(date: NaiveDate, forward: bool, matches: impl Fn(NaiveDate) -> bool) -> NaiveDate {
    let step = if forward { succ } else { pred };
    let mut date = step(date);
    while !matches(date) {
        date = step(date);
    }
    date
}

/////////////////////////////////////////////// Daily //////////////////////////////////////////////

/// A rhythm that must be done each day.
///
/// Dailies can only be skipped, never slid: every other day already carries the same daily.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Daily {
    pub id: RhythmId,
    pub description: String,
}

impl Daily {
    pub fn new(id: RhythmId, description: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
        }
    }

    pub fn start_beat(&self, date: NaiveDate) -> NaiveDate {
        date
    }

    pub fn next_beat(&self, date: NaiveDate) -> NaiveDate {
        succ(date)
    }

    pub fn prev_beat(&self, date: NaiveDate) -> NaiveDate {
        pred(date)
    }
}

////////////////////////////////////////////// Monthly /////////////////////////////////////////////

/// A rhythm due once per month on a fixed day of the month.
///
/// Months without day `dotm` (e.g. the 31st in April) carry no beat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monthly {
    pub id: RhythmId,
    pub description: String,
    /// Day of the month, 1-indexed.
    pub dotm: u32,
    pub slider: Slider,
}

impl Monthly {
    /// Create a monthly rhythm, validating the day of the month and the slider.
    pub fn new(
        id: RhythmId,
        description: impl Into<String>,
        dotm: u32,
        slider: Slider,
    ) -> Result<Self, ValidationError> {
        let monthly = Self {
            id,
            description: description.into(),
            dotm,
            slider,
        };
        monthly.validate()?;
        Ok(monthly)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::check_range("dotm", self.dotm as i64, MIN_DOTM as i64, MAX_DOTM as i64)?;
        check_slider(self.slider, MAX_MONTHLY_SLIDER)
    }

    fn is_beat(&self, date: NaiveDate) -> bool {
        date.day() == self.dotm
    }

    pub fn start_beat(&self, date: NaiveDate) -> NaiveDate {
        if self.is_beat(date) {
            date
        } else {
            self.next_beat(date)
        }
    }

    pub fn next_beat(&self, date: NaiveDate) -> NaiveDate {
        step_until(date, true, |d| self.is_beat(d))
    }

    pub fn prev_beat(&self, date: NaiveDate) -> NaiveDate {
        step_until(date, false, |d| self.is_beat(d))
    }
}

///////////////////////////////////////////// WeekDaily ////////////////////////////////////////////

/// A rhythm due on a particular day of the week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekDaily {
    pub id: RhythmId,
    pub description: String,
    /// Day of the week, Monday = 0 through Sunday = 6.
    pub dotw: u32,
    pub slider: Slider,
}

impl WeekDaily {
    /// Create a week-daily rhythm, validating the day of the week and the slider.
    pub fn new(
        id: RhythmId,
        description: impl Into<String>,
        dotw: u32,
        slider: Slider,
    ) -> Result<Self, ValidationError> {
        let week_daily = Self {
            id,
            description: description.into(),
            dotw,
            slider,
        };
        week_daily.validate()?;
        Ok(week_daily)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::check_range("dotw", self.dotw as i64, MIN_DOTW as i64, MAX_DOTW as i64)?;
        check_slider(self.slider, MAX_WEEK_DAILY_SLIDER)
    }

    fn is_beat(&self, date: NaiveDate) -> bool {
        weekday_index(date) == self.dotw
    }

    pub fn start_beat(&self, date: NaiveDate) -> NaiveDate {
        if self.is_beat(date) {
            date
        } else {
            self.next_beat(date)
        }
    }

    pub fn next_beat(&self, date: NaiveDate) -> NaiveDate {
        step_until(date, true, |d| self.is_beat(d))
    }

    pub fn prev_beat(&self, date: NaiveDate) -> NaiveDate {
        step_until(date, false, |d| self.is_beat(d))
    }
}

//////////////////////////////////////////// EveryNDays ////////////////////////////////////////////

/// A flexible rhythm recurring roughly every `n` days.
///
/// The phase follows the completion history; only a never-done rhythm needs an origin, see
/// [`EveryNDays::start_beat`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EveryNDays {
    pub id: RhythmId,
    pub description: String,
    pub n: u32,
    pub slider: Slider,
}

impl EveryNDays {
    /// Create an every-n-days rhythm, validating `n` and the slider.
    pub fn new(
        id: RhythmId,
        description: impl Into<String>,
        n: u32,
        slider: Slider,
    ) -> Result<Self, ValidationError> {
        let every_n = Self {
            id,
            description: description.into(),
            n,
            slider,
        };
        every_n.validate()?;
        Ok(every_n)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::check_range("n", self.n as i64, MIN_EVERY_N as i64, MAX_EVERY_N as i64)?;
        check_slider(self.slider, self.n.saturating_sub(1))
    }

    /// Earliest beat on or after `date`.
    ///
    /// For `n < 7` the phase is locked to the most recent weekday numbered `n` within the prior
    /// week, so different start dates agree on the same recurring phase.
    pub fn start_beat(&self, date: NaiveDate) -> NaiveDate {
        if self.n >= 7 {
            return date;
        }
        let mut anchor = date - Days::new(7);
        while weekday_index(anchor) != self.n {
            anchor = succ(anchor);
        }
        while anchor < date {
            anchor = anchor + Days::new(self.n as u64);
        }
        anchor
    }

    pub fn next_beat(&self, date: NaiveDate) -> NaiveDate {
        date + Days::new(self.n as u64)
    }

    pub fn prev_beat(&self, date: NaiveDate) -> NaiveDate {
        date - Days::new(self.n as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn id() -> RhythmId {
        RhythmId::parse("test").unwrap()
    }

    #[test]
    fn daily_steps_one_day() {
        let daily = Daily::new(id(), "some daily rhythm");
        assert_eq!(daily.next_beat(date(2022, 11, 20)), date(2022, 11, 21));
        assert_eq!(daily.prev_beat(date(2022, 11, 20)), date(2022, 11, 19));
        assert_eq!(daily.start_beat(date(2022, 11, 20)), date(2022, 11, 20));
    }

    #[test]
    fn monthly_next_and_prev() {
        let monthly = Monthly::new(id(), "some monthly rhythm", 18, Slider::new(7, 3)).unwrap();
        assert_eq!(monthly.next_beat(date(2022, 11, 18)), date(2022, 12, 18));
        assert_eq!(monthly.next_beat(date(2022, 11, 20)), date(2022, 12, 18));
        assert_eq!(monthly.prev_beat(date(2022, 11, 18)), date(2022, 10, 18));
        assert_eq!(monthly.prev_beat(date(2022, 11, 17)), date(2022, 10, 18));
    }

    #[test]
    fn monthly_start_beat_does_not_advance_on_a_beat() {
        let monthly = Monthly::new(id(), "rent", 18, Slider::default()).unwrap();
        assert_eq!(monthly.start_beat(date(2022, 11, 18)), date(2022, 11, 18));
        assert_eq!(monthly.start_beat(date(2022, 11, 19)), date(2022, 12, 18));
    }

    #[test]
    fn monthly_on_the_31st_skips_short_months() {
        let monthly = Monthly::new(id(), "end of month", 31, Slider::default()).unwrap();
        assert_eq!(monthly.next_beat(date(2023, 3, 31)), date(2023, 5, 31));
        assert_eq!(monthly.prev_beat(date(2023, 5, 31)), date(2023, 3, 31));
    }

    #[test]
    fn week_daily_next_and_prev() {
        let saturday = WeekDaily::new(id(), "some week daily", 5, Slider::new(2, 1)).unwrap();
        assert_eq!(saturday.next_beat(date(2022, 11, 19)), date(2022, 11, 26));
        assert_eq!(saturday.next_beat(date(2022, 11, 20)), date(2022, 11, 26));
        assert_eq!(saturday.prev_beat(date(2022, 11, 19)), date(2022, 11, 12));
        assert_eq!(saturday.prev_beat(date(2022, 11, 18)), date(2022, 11, 12));
        assert_eq!(saturday.start_beat(date(2022, 11, 19)), date(2022, 11, 19));
    }

    #[test]
    fn every_n_days_next_and_prev() {
        let every = EveryNDays::new(id(), "every five", 5, Slider::new(1, 2)).unwrap();
        assert_eq!(every.next_beat(date(2022, 11, 20)), date(2022, 11, 25));
        assert_eq!(every.prev_beat(date(2022, 11, 20)), date(2022, 11, 15));
    }

    #[test]
    fn every_n_days_long_period_starts_immediately() {
        let every = EveryNDays::new(id(), "fortnightly", 14, Slider::default()).unwrap();
        assert_eq!(every.start_beat(date(2022, 11, 20)), date(2022, 11, 20));
    }

    #[test]
    fn every_n_days_short_period_is_phase_locked() {
        // n = 3: anchored to the most recent Thursday before the start date.
        let every = EveryNDays::new(id(), "every three", 3, Slider::default()).unwrap();
        // 2022-11-20 is a Sunday; the prior Thursday is 2022-11-17, then 11-20.
        assert_eq!(every.start_beat(date(2022, 11, 20)), date(2022, 11, 20));
        // Start on Monday 11-21: anchor 11-17, steps 11-20, 11-23.
        assert_eq!(every.start_beat(date(2022, 11, 21)), date(2022, 11, 23));
        // Start on Tuesday 11-22 agrees with the same phase.
        assert_eq!(every.start_beat(date(2022, 11, 22)), date(2022, 11, 23));
    }

    #[test]
    fn validation_rejects_out_of_range_parameters() {
        assert!(Monthly::new(id(), "x", 0, Slider::default()).is_err());
        assert!(Monthly::new(id(), "x", 32, Slider::default()).is_err());
        assert!(WeekDaily::new(id(), "x", 7, Slider::default()).is_err());
        assert!(EveryNDays::new(id(), "x", 1, Slider::default()).is_err());
        assert!(EveryNDays::new(id(), "x", 91, Slider::default()).is_err());
    }

    #[test]
    fn validation_bounds_sliders_per_kind() {
        assert!(Monthly::new(id(), "x", 5, Slider::new(28, 28)).is_ok());
        assert!(Monthly::new(id(), "x", 5, Slider::new(29, 0)).is_err());
        assert!(WeekDaily::new(id(), "x", 2, Slider::new(6, 6)).is_ok());
        assert!(WeekDaily::new(id(), "x", 2, Slider::new(0, 7)).is_err());
        assert!(EveryNDays::new(id(), "x", 5, Slider::new(4, 4)).is_ok());
        assert!(EveryNDays::new(id(), "x", 5, Slider::new(5, 0)).is_err());
        assert!(EveryNDays::new(id(), "x", 90, Slider::new(89, 89)).is_ok());
    }
}
