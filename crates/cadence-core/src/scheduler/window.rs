//! Slider-derived candidate dates for one beat.

use std::collections::VecDeque;

use chrono::{Days, NaiveDate};

use crate::rhythm::{Rhythm, Slider};

/// Candidate dates for `original`, in priority order: the beat itself, then earlier days
/// nearest first, then later days nearest first.
pub fn candidates(original: NaiveDate, slider: Slider) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(1 + slider.before as usize + slider.after as usize);
    dates.push(original);
    dates.extend((1..=slider.before as u64).map(|i| original - Days::new(i)));
    dates.extend((1..=slider.after as u64).map(|i| original + Days::new(i)));
    dates
}

/// The smoothing window of one beat within a scheduling window `[start, limit)`.
///
/// The window holds the candidate currently offered to the scheduler, the candidates not yet
/// tried, and those already tried and rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmoothingWindow {
    original: NaiveDate,
    current: Option<NaiveDate>,
    remaining: VecDeque<NaiveDate>,
    passed_over: Vec<NaiveDate>,
    limit: NaiveDate,
}

impl SmoothingWindow {
    pub fn new(rhythm: &Rhythm, original: NaiveDate, start: NaiveDate, limit: NaiveDate) -> Self {
        let mut remaining: VecDeque<NaiveDate> = candidates(original, rhythm.slider())
            .into_iter()
            .filter(|d| *d >= start && *d < limit)
            .collect();
        let current = remaining.pop_front();
        Self {
            original,
            current,
            remaining,
            passed_over: Vec::new(),
            limit,
        }
    }

    /// Candidate currently offered; `None` when no candidate fell inside the scheduling window.
    pub fn current(&self) -> Option<NaiveDate> {
        self.current
    }

    /// Date used to order this window in the scheduling queue.
    pub fn key_date(&self) -> NaiveDate {
        self.current.unwrap_or(self.original)
    }

    pub fn remaining_choices(&self) -> &VecDeque<NaiveDate> {
        &self.remaining
    }

    pub fn passed_over_choices(&self) -> &[NaiveDate] {
        &self.passed_over
    }

    pub fn has_remaining(&self) -> bool {
        !self.remaining.is_empty()
    }

    /// Whether the current candidate lies inside `[start, limit)`.
    pub fn is_within(&self, start: NaiveDate, limit: NaiveDate) -> bool {
        self.current.is_some_and(|d| d >= start && d < limit)
    }

    /// Reject the current candidate and move to the next remaining one.
    ///
    /// # Panics
    /// Panics when no choices remain; callers check [`SmoothingWindow::has_remaining`] first.
    pub fn shift_one(&mut self) -> NaiveDate {
        let Some(next) = self.remaining.pop_front() else {
            panic!(
                "shift_one called on exhausted smoothing window for beat {}",
                self.original
            );
        };
        if let Some(current) = self.current.replace(next) {
            self.passed_over.push(current);
        }
        next
    }

    /// Reject the current candidate in favour of an arbitrary date, outside the slider order.
    pub fn jump_to(&mut self, date: NaiveDate) {
        if let Some(current) = self.current.replace(date) {
            self.passed_over.push(current);
        }
    }

    /// Move past a deferral on the current candidate: to the following day unless that day is
    /// still a pending choice, in which case to the next pending choice.
    ///
    /// A following day at or past the scheduling limit falls back to the next pending choice.
    /// With none left the window ends up outside `[start, limit)`.
    pub fn defer_current(&mut self) -> NaiveDate {
        let current = self.key_date();
        let following = current + Days::new(1);
        if self.remaining.contains(&following)
            || (following >= self.limit && self.has_remaining())
        {
            self.shift_one()
        } else {
            self.jump_to(following);
            following
        }
    }

    /// Every date this window has offered or may still offer, sorted and deduplicated.
    pub fn option_dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self
            .current
            .iter()
            .chain(self.remaining.iter())
            .chain(self.passed_over.iter())
            .copied()
            .collect();
        dates.sort();
        dates.dedup();
        dates
    }
}
