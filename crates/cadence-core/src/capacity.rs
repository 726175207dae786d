//! Per-day capacity: spoons overrides and watermark floors.
//!
//! A day's slot budget for periodic rhythms is `ceil(base * 2^((s - 5) / 5))`, where `base` is
//! the day's watermark and `s` its spoons value. Five spoons leave the base unchanged, ten double
//! it and zero halve it.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const MIN_SPOONS: u8 = 0;
pub const MAX_SPOONS: u8 = 10;
pub const DEFAULT_SPOONS: u8 = 5;
/// Watermark assumed for a date the rebalancer never touched.
pub const DEFAULT_WATERMARK: u32 = 1;

/// Reject spoons values outside `[0, 10]`.
pub fn validate_spoons(value: i64) -> Result<u8, ValidationError> {
    ValidationError::check_range("spoons", value, MIN_SPOONS as i64, MAX_SPOONS as i64)?;
    Ok(value as u8)
}

/// Number of periodic rhythms a day may hold.
pub fn slot_budget(base: u32, spoons: u8) -> usize {
    let s = spoons.clamp(MIN_SPOONS, MAX_SPOONS) as f64;
    let scale = 2f64.powf((s - DEFAULT_SPOONS as f64) / 5.0);
    (base as f64 * scale).ceil() as usize
}

/// User-declared spoons per day, with a default for days without an override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityMap {
    overrides: BTreeMap<NaiveDate, u8>,
    default_spoons: u8,
}

impl Default for CapacityMap {
    fn default() -> Self {
        Self {
            overrides: BTreeMap::new(),
            default_spoons: DEFAULT_SPOONS,
        }
    }
}

impl CapacityMap {
    pub fn new(overrides: BTreeMap<NaiveDate, u8>) -> Self {
        Self {
            overrides,
            default_spoons: DEFAULT_SPOONS,
        }
    }

    pub fn with_default(mut self, default_spoons: u8) -> Self {
        self.default_spoons = default_spoons.clamp(MIN_SPOONS, MAX_SPOONS);
        self
    }

    pub fn set(&mut self, date: NaiveDate, spoons: u8) {
        self.overrides.insert(date, spoons);
    }

    pub fn spoons_on(&self, date: NaiveDate) -> u8 {
        self.overrides
            .get(&date)
            .copied()
            .unwrap_or(self.default_spoons)
    }

    pub fn overrides(&self) -> &BTreeMap<NaiveDate, u8> {
        &self.overrides
    }

    pub fn default_spoons(&self) -> u8 {
        self.default_spoons
    }

    /// Effective spoons for `days` consecutive dates starting at `start`.
    pub fn calendar(&self, start: NaiveDate, days: u32) -> BTreeMap<NaiveDate, u8> {
        (0..days as u64)
            .map(|offset| {
                let date = start + Days::new(offset);
                (date, self.spoons_on(date))
            })
            .collect()
    }
}

/// Per-date slot floors raised by the rebalancer. Values never decrease.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Watermarks {
    floors: BTreeMap<NaiveDate, u32>,
}

impl Watermarks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Base slot count for `date`.
    pub fn base(&self, date: NaiveDate) -> u32 {
        self.floors.get(&date).copied().unwrap_or(DEFAULT_WATERMARK)
    }

    pub fn get(&self, date: NaiveDate) -> Option<u32> {
        self.floors.get(&date).copied()
    }

    /// Raise every date in `dates` to at least one more than the lowest floor among them
    /// (unset dates count as zero). Returns the new water level.
    ///
    /// All option dates are raised, not only the contended one.
    pub fn flood(&mut self, dates: &[NaiveDate]) -> u32 {
        let lowest = dates
            .iter()
            .map(|d| self.get(*d).unwrap_or(0))
            .min()
            .unwrap_or(0);
        let water = lowest + 1;
        for date in dates {
            let floor = self.floors.entry(*date).or_insert(0);
            if *floor < water {
                *floor = water;
            }
        }
        water
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn budget_scales_geometrically_with_spoons() {
        assert_eq!(slot_budget(1, 5), 1);
        assert_eq!(slot_budget(1, 10), 2);
        assert_eq!(slot_budget(1, 0), 1);
        assert_eq!(slot_budget(4, 0), 2);
        assert_eq!(slot_budget(4, 10), 8);
        assert_eq!(slot_budget(3, 5), 3);
        // 2^(1/5) ~= 1.1487
        assert_eq!(slot_budget(5, 6), 6);
        assert_eq!(slot_budget(10, 4), 9);
    }

    #[test]
    fn budget_clamps_spoons() {
        assert_eq!(slot_budget(2, 200), slot_budget(2, 10));
    }

    #[test]
    fn spoons_default_to_five() {
        let mut capacity = CapacityMap::default();
        capacity.set(date(2022, 11, 20), 2);
        assert_eq!(capacity.spoons_on(date(2022, 11, 20)), 2);
        assert_eq!(capacity.spoons_on(date(2022, 11, 21)), 5);
    }

    #[test]
    fn calendar_fills_defaults_around_overrides() {
        let mut capacity = CapacityMap::default().with_default(7);
        capacity.set(date(2022, 11, 21), 0);
        let calendar = capacity.calendar(date(2022, 11, 20), 3);
        let values: Vec<u8> = calendar.values().copied().collect();
        assert_eq!(values, vec![7, 0, 7]);
    }

    #[test]
    fn validate_spoons_rejects_out_of_range() {
        assert_eq!(validate_spoons(10).unwrap(), 10);
        assert!(validate_spoons(11).is_err());
        assert!(validate_spoons(-1).is_err());
    }

    #[test]
    fn flood_raises_all_dates_to_min_plus_one() {
        let mut marks = Watermarks::new();
        let dates = [date(2022, 11, 20), date(2022, 11, 21)];
        assert_eq!(marks.flood(&dates), 1);
        assert_eq!(marks.get(dates[0]), Some(1));
        assert_eq!(marks.flood(&dates), 2);
        assert_eq!(marks.base(dates[1]), 2);
        // A date that is already higher keeps its floor.
        let wider = [date(2022, 11, 21), date(2022, 11, 22)];
        assert_eq!(marks.flood(&wider), 1);
        assert_eq!(marks.get(dates[1]), Some(2));
        assert_eq!(marks.get(wider[1]), Some(1));
    }

    #[test]
    fn untouched_dates_use_default_base() {
        let marks = Watermarks::new();
        assert_eq!(marks.base(date(2022, 11, 20)), DEFAULT_WATERMARK);
        assert_eq!(marks.get(date(2022, 11, 20)), None);
    }
}
