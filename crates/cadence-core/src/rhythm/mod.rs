//! Rhythm recurrence model.
//!
//! A [`Rhythm`] is a recurring obligation. The variant set is closed: every consumer matches
//! exhaustively over [`Rhythm`] rather than extending it.

mod id;
mod variants;

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use id::{RhythmId, GENERATED_ID_LEN};
pub use variants::{
    weekday_index, Daily, EveryNDays, Monthly, WeekDaily, MAX_DOTM, MAX_DOTW, MAX_EVERY_N,
    MAX_MONTHLY_SLIDER, MAX_SLIDER, MAX_WEEK_DAILY_SLIDER, MIN_DOTM, MIN_DOTW, MIN_EVERY_N,
};

/// How many days a beat may be pulled earlier (`before`) or pushed later (`after`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slider {
    pub before: u32,
    pub after: u32,
}

impl Slider {
    pub fn new(before: u32, after: u32) -> Self {
        Self { before, after }
    }
}

impl fmt::Display for Slider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.before, self.after)
    }
}

/// Discriminant of a [`Rhythm`], in catalog listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RhythmKind {
    Daily,
    Monthly,
    WeekDaily,
    EveryNDays,
}

impl RhythmKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RhythmKind::Daily => "daily",
            RhythmKind::Monthly => "monthly",
            RhythmKind::WeekDaily => "week-daily",
            RhythmKind::EveryNDays => "every-n-days",
        }
    }
}

impl fmt::Display for RhythmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RhythmKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(RhythmKind::Daily),
            "monthly" => Ok(RhythmKind::Monthly),
            "week-daily" => Ok(RhythmKind::WeekDaily),
            "every-n-days" => Ok(RhythmKind::EveryNDays),
            other => Err(format!("unknown rhythm kind: {other}")),
        }
    }
}

/// A recurring obligation with a recurrence rule and a smoothing slider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Rhythm {
    Daily(Daily),
    Monthly(Monthly),
    WeekDaily(WeekDaily),
    EveryNDays(EveryNDays),
}

impl Rhythm {
    pub fn id(&self) -> &RhythmId {
        match self {
            Rhythm::Daily(r) => &r.id,
            Rhythm::Monthly(r) => &r.id,
            Rhythm::WeekDaily(r) => &r.id,
            Rhythm::EveryNDays(r) => &r.id,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Rhythm::Daily(r) => &r.description,
            Rhythm::Monthly(r) => &r.description,
            Rhythm::WeekDaily(r) => &r.description,
            Rhythm::EveryNDays(r) => &r.description,
        }
    }

    pub fn kind(&self) -> RhythmKind {
        match self {
            Rhythm::Daily(_) => RhythmKind::Daily,
            Rhythm::Monthly(_) => RhythmKind::Monthly,
            Rhythm::WeekDaily(_) => RhythmKind::WeekDaily,
            Rhythm::EveryNDays(_) => RhythmKind::EveryNDays,
        }
    }

    pub fn is_daily(&self) -> bool {
        matches!(self, Rhythm::Daily(_))
    }

    /// The variant parameter: dotm, dotw or n. Dailies have none.
    pub fn parameter(&self) -> Option<u32> {
        match self {
            Rhythm::Daily(_) => None,
            Rhythm::Monthly(r) => Some(r.dotm),
            Rhythm::WeekDaily(r) => Some(r.dotw),
            Rhythm::EveryNDays(r) => Some(r.n),
        }
    }

    /// Earliest valid beat on or after `date`.
    pub fn start_beat(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Rhythm::Daily(r) => r.start_beat(date),
            Rhythm::Monthly(r) => r.start_beat(date),
            Rhythm::WeekDaily(r) => r.start_beat(date),
            Rhythm::EveryNDays(r) => r.start_beat(date),
        }
    }

    /// First valid beat strictly after `date`.
    pub fn next_beat(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Rhythm::Daily(r) => r.next_beat(date),
            Rhythm::Monthly(r) => r.next_beat(date),
            Rhythm::WeekDaily(r) => r.next_beat(date),
            Rhythm::EveryNDays(r) => r.next_beat(date),
        }
    }

    /// Last valid beat strictly before `date`.
    pub fn prev_beat(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Rhythm::Daily(r) => r.prev_beat(date),
            Rhythm::Monthly(r) => r.prev_beat(date),
            Rhythm::WeekDaily(r) => r.prev_beat(date),
            Rhythm::EveryNDays(r) => r.prev_beat(date),
        }
    }

    pub fn slider(&self) -> Slider {
        match self {
            Rhythm::Daily(_) => Slider::default(),
            Rhythm::Monthly(r) => r.slider,
            Rhythm::WeekDaily(r) => r.slider,
            Rhythm::EveryNDays(r) => r.slider,
        }
    }

    /// Rough period in days; an ordering hint only.
    pub fn approximate_periodicity(&self) -> u32 {
        match self {
            Rhythm::Daily(_) => 1,
            Rhythm::Monthly(_) => 31,
            Rhythm::WeekDaily(_) => 7,
            Rhythm::EveryNDays(r) => r.n,
        }
    }

    /// Whether a beat landing within `slider.before` days of the last completion was already
    /// absorbed by an earlier slide and must be skipped.
    pub fn skip_beat_within_slider(&self) -> bool {
        match self {
            Rhythm::Daily(_) | Rhythm::EveryNDays(_) => false,
            Rhythm::Monthly(_) | Rhythm::WeekDaily(_) => true,
        }
    }

    /// Re-check the variant's range constraints.
    pub fn validate(&self) -> Result<(), crate::error::ValidationError> {
        match self {
            Rhythm::Daily(_) => Ok(()),
            Rhythm::Monthly(r) => r.validate(),
            Rhythm::WeekDaily(r) => r.validate(),
            Rhythm::EveryNDays(r) => r.validate(),
        }
    }

    /// One-line human description, e.g. `pay rent every 18 day of the month`.
    pub fn human_line(&self) -> String {
        match self {
            Rhythm::Daily(r) => format!("{} every day", r.description),
            Rhythm::Monthly(r) => format!("{} every {} day of the month", r.description, r.dotm),
            Rhythm::WeekDaily(r) => format!("{} every {}", r.description, weekday_name(r.dotw)),
            Rhythm::EveryNDays(r) => format!("{} every {} days", r.description, r.n),
        }
    }
}

impl fmt::Display for Rhythm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rhythm::Daily(r) => write!(f, "{} {}", r.id, r.description),
            Rhythm::Monthly(r) => write!(
                f,
                "{} dotm:{} slider:{} {}",
                r.id, r.dotm, r.slider, r.description
            ),
            Rhythm::WeekDaily(r) => write!(
                f,
                "{} dotw:{} slider:{} {}",
                r.id, r.dotw, r.slider, r.description
            ),
            Rhythm::EveryNDays(r) => {
                write!(f, "{} n:{} slider:{} {}", r.id, r.n, r.slider, r.description)
            }
        }
    }
}

/// English name of a week-daily `dotw` value (Monday = 0).
pub fn weekday_name(dotw: u32) -> &'static str {
    match dotw {
        0 => "Monday",
        1 => "Tuesday",
        2 => "Wednesday",
        3 => "Thursday",
        4 => "Friday",
        5 => "Saturday",
        _ => "Sunday",
    }
}

/// Parse a day of the week as `0`-`6` (Monday = 0) or an English name/abbreviation.
pub fn parse_weekday(raw: &str) -> Option<u32> {
    let lower = raw.trim().to_lowercase();
    match lower.as_str() {
        "0" | "mon" | "monday" => Some(0),
        "1" | "tue" | "tuesday" => Some(1),
        "2" | "wed" | "wednesday" => Some(2),
        "3" | "thu" | "thursday" => Some(3),
        "4" | "fri" | "friday" => Some(4),
        "5" | "sat" | "saturday" => Some(5),
        "6" | "sun" | "sunday" => Some(6),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> RhythmId {
        RhythmId::parse(raw).unwrap()
    }

    fn catalog() -> Vec<Rhythm> {
        vec![
            Rhythm::Daily(Daily::new(id("d"), "stretch")),
            Rhythm::Monthly(Monthly::new(id("m"), "pay rent", 18, Slider::new(7, 3)).unwrap()),
            Rhythm::WeekDaily(WeekDaily::new(id("w"), "trash", 5, Slider::new(2, 1)).unwrap()),
            Rhythm::EveryNDays(EveryNDays::new(id("e"), "water", 5, Slider::new(1, 2)).unwrap()),
        ]
    }

    #[test]
    fn daily_slider_is_always_zero() {
        let daily = Rhythm::Daily(Daily::new(id("d"), "stretch"));
        assert_eq!(daily.slider(), Slider::new(0, 0));
    }

    #[test]
    fn periodicity_and_skip_flags() {
        let periods: Vec<u32> = catalog().iter().map(Rhythm::approximate_periodicity).collect();
        assert_eq!(periods, vec![1, 31, 7, 5]);
        let skips: Vec<bool> = catalog().iter().map(Rhythm::skip_beat_within_slider).collect();
        assert_eq!(skips, vec![false, true, true, false]);
    }

    #[test]
    fn display_matches_listing_format() {
        let listed: Vec<String> = catalog().iter().map(|r| r.to_string()).collect();
        assert_eq!(listed[0], "d stretch");
        assert_eq!(listed[1], "m dotm:18 slider:7,3 pay rent");
        assert_eq!(listed[2], "w dotw:5 slider:2,1 trash");
        assert_eq!(listed[3], "e n:5 slider:1,2 water");
    }

    #[test]
    fn human_line_names_the_weekday() {
        assert_eq!(catalog()[2].human_line(), "trash every Saturday");
    }

    #[test]
    fn serde_tags_the_variant() {
        let json = serde_json::to_value(&catalog()[1]).unwrap();
        assert_eq!(json["type"], "monthly");
        assert_eq!(json["dotm"], 18);
        let back: Rhythm = serde_json::from_value(json).unwrap();
        assert_eq!(back, catalog()[1]);
    }

    #[test]
    fn kind_round_trips_through_strings() {
        for rhythm in catalog() {
            let kind = rhythm.kind();
            assert_eq!(kind.as_str().parse::<RhythmKind>().unwrap(), kind);
        }
        assert!("hourly".parse::<RhythmKind>().is_err());
    }

    #[test]
    fn parse_weekday_accepts_names_and_numbers() {
        assert_eq!(parse_weekday("sat"), Some(5));
        assert_eq!(parse_weekday("Monday"), Some(0));
        assert_eq!(parse_weekday("6"), Some(6));
        assert_eq!(parse_weekday("7"), None);
    }
}
