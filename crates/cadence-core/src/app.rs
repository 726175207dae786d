//! The `Cadence` facade: one user's catalog, history and capacity behind the operations a
//! front end needs.
//!
//! "Today" is resolved once when the facade is built and passed explicitly to every query.

use std::collections::BTreeMap;

use chrono::{Local, NaiveDate};

use crate::capacity::{validate_spoons, CapacityMap};
use crate::error::{CoreError, Result, ValidationError};
use crate::event::{Event, EventKind};
use crate::reports::{self, HealthScore};
use crate::rhythm::{Daily, EveryNDays, Monthly, Rhythm, RhythmId, RhythmKind, Slider, WeekDaily};
use crate::scheduler::{horizon, Schedule, Scheduler};
use crate::storage::{Config, RhythmDb};

/// Fields of a daily rhythm to change; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct DailyEdit {
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MonthlyEdit {
    pub description: Option<String>,
    pub dotm: Option<u32>,
    pub slider_before: Option<u32>,
    pub slider_after: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct WeekDailyEdit {
    pub description: Option<String>,
    pub dotw: Option<u32>,
    pub slider_before: Option<u32>,
    pub slider_after: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct EveryNDaysEdit {
    pub description: Option<String>,
    pub n: Option<u32>,
    pub slider_before: Option<u32>,
    pub slider_after: Option<u32>,
}

fn merge_slider(current: Slider, before: Option<u32>, after: Option<u32>) -> Slider {
    Slider::new(before.unwrap_or(current.before), after.unwrap_or(current.after))
}

/// Pick "today": an explicit override, else the pinned config date, else the local clock.
pub fn resolve_today(config: &Config, today: Option<NaiveDate>) -> NaiveDate {
    today
        .or(config.clock.today)
        .unwrap_or_else(|| Local::now().date_naive())
}

pub struct Cadence {
    db: RhythmDb,
    config: Config,
    today: NaiveDate,
}

impl Cadence {
    pub fn new(db: RhythmDb, config: Config, today: NaiveDate) -> Self {
        Self { db, config, today }
    }

    /// Open the store under the data directory for the configured namespace.
    pub fn open(config: Config, today: Option<NaiveDate>) -> Result<Self> {
        let db = RhythmDb::open(&config.user.namespace)?;
        let today = resolve_today(&config, today);
        tracing::debug!(namespace = %config.user.namespace, %today, "opened cadence");
        Ok(Self::new(db, config, today))
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // === Catalog ===

    /// Daily, then monthly, then week-daily, then every-n-days, each in insertion order.
    pub fn list_rhythms(&self) -> Result<Vec<Rhythm>> {
        self.db.list_rhythms()
    }

    pub fn rhythm(&self, id: &RhythmId) -> Result<Rhythm> {
        self.db.get_rhythm(id)?.ok_or_else(|| CoreError::NotFound {
            id: id.to_string(),
        })
    }

    fn add(&self, rhythm: Rhythm) -> Result<RhythmId> {
        self.db.insert_rhythm(&rhythm)?;
        Ok(rhythm.id().clone())
    }

    pub fn add_daily(&self, description: &str) -> Result<RhythmId> {
        self.add(Rhythm::Daily(Daily::new(RhythmId::generate(), description)))
    }

    pub fn add_monthly(&self, description: &str, dotm: u32, slider: Slider) -> Result<RhythmId> {
        let monthly = Monthly::new(RhythmId::generate(), description, dotm, slider)?;
        self.add(Rhythm::Monthly(monthly))
    }

    pub fn add_week_daily(&self, description: &str, dotw: u32, slider: Slider) -> Result<RhythmId> {
        let week_daily = WeekDaily::new(RhythmId::generate(), description, dotw, slider)?;
        self.add(Rhythm::WeekDaily(week_daily))
    }

    pub fn add_every_n_days(&self, description: &str, n: u32, slider: Slider) -> Result<RhythmId> {
        let every = EveryNDays::new(RhythmId::generate(), description, n, slider)?;
        self.add(Rhythm::EveryNDays(every))
    }

    fn wrong_kind(rhythm: &Rhythm, expected: RhythmKind) -> CoreError {
        ValidationError::WrongKind {
            id: rhythm.id().to_string(),
            expected: expected.as_str(),
            actual: rhythm.kind().as_str(),
        }
        .into()
    }

    fn replace(&self, rhythm: Rhythm) -> Result<Rhythm> {
        self.db.update_rhythm(&rhythm)?;
        Ok(rhythm)
    }

    pub fn edit_daily(&self, id: &RhythmId, edit: DailyEdit) -> Result<Rhythm> {
        let current = match self.rhythm(id)? {
            Rhythm::Daily(d) => d,
            other => return Err(Self::wrong_kind(&other, RhythmKind::Daily)),
        };
        let description = edit.description.unwrap_or(current.description);
        self.replace(Rhythm::Daily(Daily::new(current.id, description)))
    }

    pub fn edit_monthly(&self, id: &RhythmId, edit: MonthlyEdit) -> Result<Rhythm> {
        let current = match self.rhythm(id)? {
            Rhythm::Monthly(m) => m,
            other => return Err(Self::wrong_kind(&other, RhythmKind::Monthly)),
        };
        let updated = Monthly::new(
            current.id,
            edit.description.unwrap_or(current.description),
            edit.dotm.unwrap_or(current.dotm),
            merge_slider(current.slider, edit.slider_before, edit.slider_after),
        )?;
        self.replace(Rhythm::Monthly(updated))
    }

    pub fn edit_week_daily(&self, id: &RhythmId, edit: WeekDailyEdit) -> Result<Rhythm> {
        let current = match self.rhythm(id)? {
            Rhythm::WeekDaily(w) => w,
            other => return Err(Self::wrong_kind(&other, RhythmKind::WeekDaily)),
        };
        let updated = WeekDaily::new(
            current.id,
            edit.description.unwrap_or(current.description),
            edit.dotw.unwrap_or(current.dotw),
            merge_slider(current.slider, edit.slider_before, edit.slider_after),
        )?;
        self.replace(Rhythm::WeekDaily(updated))
    }

    pub fn edit_every_n_days(&self, id: &RhythmId, edit: EveryNDaysEdit) -> Result<Rhythm> {
        let current = match self.rhythm(id)? {
            Rhythm::EveryNDays(e) => e,
            other => return Err(Self::wrong_kind(&other, RhythmKind::EveryNDays)),
        };
        let updated = EveryNDays::new(
            current.id,
            edit.description.unwrap_or(current.description),
            edit.n.unwrap_or(current.n),
            merge_slider(current.slider, edit.slider_before, edit.slider_after),
        )?;
        self.replace(Rhythm::EveryNDays(updated))
    }

    /// Remove a rhythm and its history.
    pub fn delete_rhythm(&self, id: &RhythmId) -> Result<()> {
        if !self.db.delete_rhythm(id)? {
            return Err(CoreError::NotFound { id: id.to_string() });
        }
        Ok(())
    }

    // === Events ===

    fn record(&self, id: &RhythmId, kind: EventKind, date: Option<NaiveDate>) -> Result<Event> {
        let rhythm = self.rhythm(id)?;
        let event = Event::new(rhythm.id().clone(), kind, date.unwrap_or(self.today));
        self.db.insert_event(&event)?;
        Ok(event)
    }

    /// Mark a rhythm done, today unless a date is given. Repeating it is harmless.
    pub fn record_done(&self, id: &RhythmId, date: Option<NaiveDate>) -> Result<Event> {
        self.record(id, EventKind::Done, date)
    }

    pub fn record_defer(&self, id: &RhythmId, date: Option<NaiveDate>) -> Result<Event> {
        self.record(id, EventKind::Defer, date)
    }

    /// Every stored event, ordered by date, then rhythm id, then kind.
    pub fn list_events(&self) -> Result<Vec<Event>> {
        self.db.list_events()
    }

    // === Capacity ===

    pub fn set_capacity(&self, date: NaiveDate, value: i64) -> Result<()> {
        let spoons = validate_spoons(value)?;
        self.db.set_spoons(date, spoons)
    }

    pub fn get_capacity_overrides(&self) -> Result<BTreeMap<NaiveDate, u8>> {
        self.db.spoons_overrides()
    }

    fn capacity_map(&self) -> Result<CapacityMap> {
        Ok(CapacityMap::new(self.db.spoons_overrides()?)
            .with_default(self.config.capacity.default_spoons))
    }

    /// Effective spoons for `days` dates from `start` (default today).
    pub fn capacity_calendar(
        &self,
        start: Option<NaiveDate>,
        days: u32,
    ) -> Result<BTreeMap<NaiveDate, u8>> {
        Ok(self.capacity_map()?.calendar(start.unwrap_or(self.today), days))
    }

    // === Scheduling ===

    fn window(
        &self,
        start: Option<NaiveDate>,
        limit: Option<NaiveDate>,
    ) -> Result<(NaiveDate, NaiveDate)> {
        let start = start.unwrap_or(self.today);
        let limit = match limit {
            Some(limit) => limit,
            None => {
                let days = self.config.schedule.horizon_days;
                horizon(self.today, days).ok_or(ValidationError::HorizonOutOfRange {
                    from: self.today,
                    days,
                })?
            }
        };
        if start >= limit {
            return Err(ValidationError::InvalidWindow { start, limit }.into());
        }
        Ok((start, limit))
    }

    /// Smoothed schedule over `[start, limit)`, defaulting to today and the configured horizon.
    pub fn schedule(&self, start: Option<NaiveDate>, limit: Option<NaiveDate>) -> Result<Schedule> {
        let (start, limit) = self.window(start, limit)?;
        let rhythms = self.db.list_rhythms()?;
        let events = self.db.event_log()?;
        let capacity = self.capacity_map()?;
        Ok(Scheduler::new(&rhythms, &events, &capacity).schedule(start, limit))
    }

    /// Raw beats over `[start, limit)` with no smoothing or capacity.
    pub fn basic_schedule(
        &self,
        start: Option<NaiveDate>,
        limit: Option<NaiveDate>,
    ) -> Result<Schedule> {
        let (start, limit) = self.window(start, limit)?;
        let rhythms = self.db.list_rhythms()?;
        let events = self.db.event_log()?;
        Ok(reports::basic_schedule(&rhythms, &events, start, limit))
    }

    // === Reports ===

    /// Earliest date by which every rhythm has been scheduled at least once.
    pub fn convergence(&self) -> Result<NaiveDate> {
        let rhythms = self.db.list_rhythms()?;
        let events = self.db.event_log()?;
        let capacity = self.capacity_map()?;
        Ok(reports::convergence(
            &rhythms,
            &events,
            &capacity,
            self.today,
            self.config.schedule.convergence_days,
        )?)
    }

    /// Rhythms never done or last done before `reference` (default today).
    pub fn delinquent(&self, reference: Option<NaiveDate>) -> Result<Vec<Rhythm>> {
        let rhythms = self.db.list_rhythms()?;
        let events = self.db.event_log()?;
        Ok(reports::delinquent(&rhythms, &events, reference.unwrap_or(self.today))
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn health_check(&self, reference: Option<NaiveDate>) -> Result<HealthScore> {
        let rhythms = self.db.list_rhythms()?;
        let events = self.db.event_log()?;
        Ok(reports::health_check(&rhythms, &events, reference.unwrap_or(self.today)))
    }

    /// Health for each of `days` dates (default from config) ending the day before `limit`
    /// (default today).
    pub fn health_history(
        &self,
        limit: Option<NaiveDate>,
        days: Option<u32>,
    ) -> Result<Vec<(NaiveDate, HealthScore)>> {
        let rhythms = self.db.list_rhythms()?;
        let events = self.db.event_log()?;
        Ok(reports::health_history(
            &rhythms,
            &events,
            limit.unwrap_or(self.today),
            days.unwrap_or(self.config.schedule.health_days),
        ))
    }
}
