use chrono::NaiveDate;
use clap::Subcommand;

use super::{open, parse_id, print_json, CmdResult};

#[derive(Subcommand)]
pub enum EventAction {
    /// Mark a rhythm done
    Done {
        id: String,
        /// Date of completion (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Defer a rhythm off a date
    Defer {
        id: String,
        /// Date to defer (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// List every recorded event
    List {
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: EventAction, today: Option<NaiveDate>) -> CmdResult {
    let app = open(today)?;

    match action {
        EventAction::Done { id, date } => {
            let event = app.record_done(&parse_id(&id)?, date)?;
            println!("{event}");
        }
        EventAction::Defer { id, date } => {
            let event = app.record_defer(&parse_id(&id)?, date)?;
            println!("{event}");
        }
        EventAction::List { json } => {
            let events = app.list_events()?;
            if json {
                print_json(&events)?;
            } else {
                for event in &events {
                    println!("{event}");
                }
            }
        }
    }
    Ok(())
}
