//! Subcommand implementations. Each `run` opens what it needs and prints to stdout.

pub mod config;
pub mod event;
pub mod report;
pub mod rhythm;
pub mod schedule;
pub mod spoons;

use cadence_core::{Cadence, Config, RhythmId};
use chrono::NaiveDate;
use serde::Serialize;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Load the config and open the store for its namespace.
pub fn open(today: Option<NaiveDate>) -> Result<Cadence, Box<dyn std::error::Error>> {
    let config = Config::load()?;
    Ok(Cadence::open(config, today)?)
}

pub fn parse_id(raw: &str) -> Result<RhythmId, Box<dyn std::error::Error>> {
    Ok(RhythmId::parse(raw)?)
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
