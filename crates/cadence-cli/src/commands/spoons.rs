//! Capacity commands for CLI.

use chrono::NaiveDate;
use clap::Subcommand;

use super::{open, print_json, CmdResult};

#[derive(Subcommand)]
pub enum SpoonsAction {
    /// Set the spoons (0-10) available on a date
    Set {
        date: NaiveDate,
        #[arg(allow_negative_numbers = true)]
        value: i64,
    },
    /// Show effective spoons for upcoming days
    Show {
        /// First day (default: today)
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long, default_value_t = 14)]
        days: u32,
        /// Only list explicit overrides
        #[arg(long)]
        overrides: bool,
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: SpoonsAction, today: Option<NaiveDate>) -> CmdResult {
    let app = open(today)?;

    match action {
        SpoonsAction::Set { date, value } => {
            app.set_capacity(date, value)?;
            println!("{date} {value}");
        }
        SpoonsAction::Show {
            start,
            days,
            overrides,
            json,
        } => {
            let calendar = if overrides {
                app.get_capacity_overrides()?
            } else {
                app.capacity_calendar(start, days)?
            };
            if json {
                print_json(&calendar)?;
            } else {
                for (date, spoons) in &calendar {
                    println!("{date} {spoons}");
                }
            }
        }
    }
    Ok(())
}
