//! SQLite-backed rhythm catalog, event log and capacity overrides.
//!
//! Every row carries a namespace (the user key), so several users can share one database file.
//! A [`RhythmDb`] handle is bound to one namespace and never sees another's rows.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

use crate::capacity::validate_spoons;
use crate::error::{CoreError, DatabaseError, Result};
use crate::event::{Event, EventKind, EventLog};
use crate::rhythm::{Daily, EveryNDays, Monthly, Rhythm, RhythmId, RhythmKind, Slider, WeekDaily};

use super::{data_dir, migrations};

const DB_FILE: &str = "cadence.db";

fn parse_rhythm_kind(kind_str: &str) -> std::result::Result<RhythmKind, DatabaseError> {
    kind_str.parse().map_err(|message| DatabaseError::CorruptRow {
        table: "rhythms".to_string(),
        message,
    })
}

fn parse_event_kind(kind_str: &str) -> std::result::Result<EventKind, DatabaseError> {
    kind_str.parse().map_err(|message| DatabaseError::CorruptRow {
        table: "events".to_string(),
        message,
    })
}

fn parse_rhythm_id(table: &str, raw: &str) -> std::result::Result<RhythmId, DatabaseError> {
    RhythmId::parse(raw).map_err(|e| DatabaseError::CorruptRow {
        table: table.to_string(),
        message: e.to_string(),
    })
}

/// A `rhythms` row before it is checked against the variant rules.
struct RhythmRow {
    id: String,
    kind: String,
    description: String,
    param: Option<i64>,
    slider_before: i64,
    slider_after: i64,
}

impl RhythmRow {
    fn from_row(row: &rusqlite::Row) -> std::result::Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get(0)?,
            kind: row.get(1)?,
            description: row.get(2)?,
            param: row.get(3)?,
            slider_before: row.get(4)?,
            slider_after: row.get(5)?,
        })
    }

    fn into_rhythm(self) -> std::result::Result<Rhythm, DatabaseError> {
        let corrupt = |message: String| DatabaseError::CorruptRow {
            table: "rhythms".to_string(),
            message,
        };
        let id = parse_rhythm_id("rhythms", &self.id)?;
        let kind = parse_rhythm_kind(&self.kind)?;
        let slider = Slider::new(
            u32::try_from(self.slider_before).map_err(|e| corrupt(e.to_string()))?,
            u32::try_from(self.slider_after).map_err(|e| corrupt(e.to_string()))?,
        );
        let param = match (kind, self.param) {
            (RhythmKind::Daily, _) => 0,
            (_, Some(p)) => u32::try_from(p).map_err(|e| corrupt(e.to_string()))?,
            (_, None) => return Err(corrupt(format!("{kind} rhythm {id} has no parameter"))),
        };
        let rhythm = match kind {
            RhythmKind::Daily => Ok(Rhythm::Daily(Daily::new(id, self.description))),
            RhythmKind::Monthly => {
                Monthly::new(id, self.description, param, slider).map(Rhythm::Monthly)
            }
            RhythmKind::WeekDaily => {
                WeekDaily::new(id, self.description, param, slider).map(Rhythm::WeekDaily)
            }
            RhythmKind::EveryNDays => {
                EveryNDays::new(id, self.description, param, slider).map(Rhythm::EveryNDays)
            }
        };
        rhythm.map_err(|e| corrupt(e.to_string()))
    }
}

/// Persistent store for one namespace.
pub struct RhythmDb {
    conn: Connection,
    namespace: String,
}

impl RhythmDb {
    /// Open the database at `<data_dir>/cadence.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable or the database cannot be opened
    /// or migrated.
    pub fn open(namespace: &str) -> Result<Self> {
        let path = data_dir()?.join(DB_FILE);
        Self::open_at(&path, namespace)
    }

    /// Open (or create) a database file at an explicit path.
    pub fn open_at(path: &Path, namespace: &str) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_connection(conn, namespace)
    }

    /// Open an in-memory database.
    pub fn open_memory(namespace: &str) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, namespace)
    }

    fn with_connection(conn: Connection, namespace: &str) -> Result<Self> {
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self {
            conn,
            namespace: namespace.to_string(),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // === Rhythms ===

    /// Insert a new rhythm at the end of the catalog.
    ///
    /// # Errors
    /// Returns an error if a rhythm with the same id already exists in this namespace.
    pub fn insert_rhythm(&self, rhythm: &Rhythm) -> Result<()> {
        let slider = rhythm.slider();
        self.conn.execute(
            "INSERT INTO rhythms (namespace, id, kind, description, param, slider_before, slider_after)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                self.namespace,
                rhythm.id().as_str(),
                rhythm.kind().as_str(),
                rhythm.description(),
                rhythm.parameter(),
                slider.before,
                slider.after,
            ],
        )?;
        tracing::info!(id = %rhythm.id(), kind = %rhythm.kind(), "rhythm added");
        Ok(())
    }

    /// Overwrite a stored rhythm in place, keeping its catalog position.
    ///
    /// # Errors
    /// Returns [`CoreError::NotFound`] if no rhythm has that id.
    pub fn update_rhythm(&self, rhythm: &Rhythm) -> Result<()> {
        let slider = rhythm.slider();
        let changed = self.conn.execute(
            "UPDATE rhythms
             SET kind = ?3, description = ?4, param = ?5, slider_before = ?6, slider_after = ?7
             WHERE namespace = ?1 AND id = ?2",
            params![
                self.namespace,
                rhythm.id().as_str(),
                rhythm.kind().as_str(),
                rhythm.description(),
                rhythm.parameter(),
                slider.before,
                slider.after,
            ],
        )?;
        if changed == 0 {
            return Err(CoreError::NotFound {
                id: rhythm.id().to_string(),
            });
        }
        tracing::info!(id = %rhythm.id(), "rhythm updated");
        Ok(())
    }

    pub fn get_rhythm(&self, id: &RhythmId) -> Result<Option<Rhythm>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, kind, description, param, slider_before, slider_after
                 FROM rhythms WHERE namespace = ?1 AND id = ?2",
                params![self.namespace, id.as_str()],
                RhythmRow::from_row,
            )
            .optional()?;
        match row {
            Some(row) => Ok(Some(row.into_rhythm()?)),
            None => Ok(None),
        }
    }

    /// All rhythms: daily, then monthly, then week-daily, then every-n-days, each group in
    /// insertion order.
    pub fn list_rhythms(&self) -> Result<Vec<Rhythm>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, kind, description, param, slider_before, slider_after
             FROM rhythms WHERE namespace = ?1 ORDER BY seq",
        )?;
        let rows = stmt
            .query_map(params![self.namespace], RhythmRow::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut rhythms = rows
            .into_iter()
            .map(RhythmRow::into_rhythm)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rhythms.sort_by_key(Rhythm::kind);
        Ok(rhythms)
    }

    /// Delete a rhythm together with its events.
    ///
    /// Returns `false` when no rhythm had that id.
    pub fn delete_rhythm(&self, id: &RhythmId) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;
        let removed = tx.execute(
            "DELETE FROM rhythms WHERE namespace = ?1 AND id = ?2",
            params![self.namespace, id.as_str()],
        )?;
        let events = tx.execute(
            "DELETE FROM events WHERE namespace = ?1 AND rhythm_id = ?2",
            params![self.namespace, id.as_str()],
        )?;
        tx.commit()?;
        if removed > 0 {
            tracing::info!(%id, events, "rhythm deleted");
        }
        Ok(removed > 0)
    }

    // === Events ===

    /// Append an event. Returns `false` when the identical event was already recorded.
    pub fn insert_event(&self, event: &Event) -> Result<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO events (namespace, rhythm_id, kind, date)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                self.namespace,
                event.rhythm_id.as_str(),
                event.kind.as_str(),
                event.date,
            ],
        )?;
        if inserted > 0 {
            tracing::info!(id = %event.rhythm_id, kind = %event.kind, date = %event.date, "event recorded");
        } else {
            tracing::debug!(id = %event.rhythm_id, kind = %event.kind, date = %event.date, "duplicate event ignored");
        }
        Ok(inserted > 0)
    }

    /// Every event, ordered by date, then rhythm id, then kind.
    pub fn list_events(&self) -> Result<Vec<Event>> {
        let mut stmt = self.conn.prepare(
            "SELECT rhythm_id, kind, date FROM events
             WHERE namespace = ?1
             ORDER BY date, rhythm_id, CASE kind WHEN 'done' THEN 0 ELSE 1 END",
        )?;
        let rows = stmt
            .query_map(params![self.namespace], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, NaiveDate>(2)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut events = Vec::with_capacity(rows.len());
        for (rhythm_id, kind, date) in rows {
            events.push(Event::new(
                parse_rhythm_id("events", &rhythm_id)?,
                parse_event_kind(&kind)?,
                date,
            ));
        }
        Ok(events)
    }

    /// The event log indexed for scheduling.
    pub fn event_log(&self) -> Result<EventLog> {
        Ok(self.list_events()?.into_iter().collect())
    }

    // === Capacity ===

    /// Upsert the spoons value for `date`.
    pub fn set_spoons(&self, date: NaiveDate, spoons: u8) -> Result<()> {
        validate_spoons(spoons as i64)?;
        self.conn.execute(
            "INSERT INTO spoons (namespace, date, spoons) VALUES (?1, ?2, ?3)
             ON CONFLICT(namespace, date) DO UPDATE SET spoons = excluded.spoons",
            params![self.namespace, date, spoons],
        )?;
        tracing::info!(%date, spoons, "capacity set");
        Ok(())
    }

    pub fn spoons_overrides(&self) -> Result<BTreeMap<NaiveDate, u8>> {
        let mut stmt = self
            .conn
            .prepare("SELECT date, spoons FROM spoons WHERE namespace = ?1 ORDER BY date")?;
        let rows = stmt
            .query_map(params![self.namespace], |row| {
                Ok((row.get::<_, NaiveDate>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut overrides = BTreeMap::new();
        for (date, spoons) in rows {
            let spoons = validate_spoons(spoons).map_err(|e| DatabaseError::CorruptRow {
                table: "spoons".to_string(),
                message: e.to_string(),
            })?;
            overrides.insert(date, spoons);
        }
        Ok(overrides)
    }
}
