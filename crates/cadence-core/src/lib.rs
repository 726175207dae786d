//! # Cadence Core Library
//!
//! This library tracks recurring personal obligations ("rhythms") and computes, for any window
//! of days, which rhythms are due on which day. The `cadence` CLI is a thin layer over the same
//! library.
//!
//! ## Architecture
//!
//! - **Rhythms**: four recurrence kinds (daily, monthly, week-daily, every-n-days) with a
//!   common beat arithmetic and a slider bounding how far a beat may move
//! - **Scheduler**: a priority-queue assignment loop that spreads beats within their sliders
//!   and raises per-day watermarks when a day cannot hold its load
//! - **Reports**: convergence, delinquency, health and the unsmoothed schedule
//! - **Storage**: SQLite persistence namespaced per user and TOML configuration
//!
//! ## Key Components
//!
//! - [`Rhythm`]: Closed union of recurrence kinds
//! - [`Scheduler`]: Capacity-aware smoothing scheduler
//! - [`Cadence`]: Facade binding storage, configuration and "today"
//! - [`RhythmDb`]: Rhythm, event and capacity persistence
//! - [`Config`]: Application configuration management

pub mod app;
pub mod capacity;
pub mod error;
pub mod event;
pub mod reports;
pub mod rhythm;
pub mod scheduler;
pub mod storage;

pub use app::{Cadence, DailyEdit, EveryNDaysEdit, MonthlyEdit, WeekDailyEdit};
pub use capacity::{CapacityMap, Watermarks};
pub use error::{ConfigError, CoreError, DatabaseError, Result, ValidationError};
pub use event::{Event, EventKind, EventLog};
pub use reports::HealthScore;
pub use rhythm::{Daily, EveryNDays, Monthly, Rhythm, RhythmId, RhythmKind, Slider, WeekDaily};
pub use scheduler::{Schedule, Scheduler, SmoothingWindow};
pub use storage::{Config, RhythmDb};
