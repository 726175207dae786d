//! Append-only completion and deferral history.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::rhythm::RhythmId;

/// What happened to a rhythm on a given date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Done,
    Defer,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Done => "done",
            EventKind::Defer => "defer",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "done" => Ok(EventKind::Done),
            "defer" => Ok(EventKind::Defer),
            other => Err(format!("unknown event kind: {other}")),
        }
    }
}

/// An immutable record in the event log.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Event {
    pub date: NaiveDate,
    pub rhythm_id: RhythmId,
    pub kind: EventKind,
}

impl Event {
    pub fn new(rhythm_id: RhythmId, kind: EventKind, date: NaiveDate) -> Self {
        Self {
            date,
            rhythm_id,
            kind,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.date, self.kind, self.rhythm_id)
    }
}

#[derive(Debug, Clone, Default)]
struct History {
    done: BTreeSet<NaiveDate>,
    deferred: BTreeSet<NaiveDate>,
}

/// Per-rhythm index over the full event log, read once per scheduling call.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    by_rhythm: HashMap<RhythmId, History>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event. Duplicates are absorbed.
    pub fn insert(&mut self, event: &Event) {
        let history = self.by_rhythm.entry(event.rhythm_id.clone()).or_default();
        match event.kind {
            EventKind::Done => history.done.insert(event.date),
            EventKind::Defer => history.deferred.insert(event.date),
        };
    }

    /// Date of the most recent `done` event.
    pub fn latest_done(&self, id: &RhythmId) -> Option<NaiveDate> {
        self.by_rhythm
            .get(id)
            .and_then(|h| h.done.iter().next_back().copied())
    }

    /// Date of the most recent `done` event strictly before `boundary`.
    pub fn latest_done_before(&self, id: &RhythmId, boundary: NaiveDate) -> Option<NaiveDate> {
        self.by_rhythm
            .get(id)
            .and_then(|h| h.done.range(..boundary).next_back().copied())
    }

    pub fn is_done_on(&self, id: &RhythmId, date: NaiveDate) -> bool {
        self.by_rhythm
            .get(id)
            .is_some_and(|h| h.done.contains(&date))
    }

    pub fn is_deferred(&self, id: &RhythmId, date: NaiveDate) -> bool {
        self.by_rhythm
            .get(id)
            .is_some_and(|h| h.deferred.contains(&date))
    }

    pub fn is_empty(&self) -> bool {
        self.by_rhythm.is_empty()
    }
}

impl<'a> FromIterator<&'a Event> for EventLog {
    fn from_iter<I: IntoIterator<Item = &'a Event>>(iter: I) -> Self {
        let mut log = EventLog::new();
        for event in iter {
            log.insert(event);
        }
        log
    }
}

impl FromIterator<Event> for EventLog {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        let mut log = EventLog::new();
        for event in iter {
            log.insert(&event);
        }
        log
    }
}
