use chrono::NaiveDate;
use clap::Subcommand;

use super::{open, print_json, CmdResult};

#[derive(Subcommand)]
pub enum ReportAction {
    /// Date by which every rhythm has been scheduled at least once
    Convergence {
        #[arg(long)]
        json: bool,
    },
    /// Rhythms never done or last done before a date
    Delinquent {
        /// Reference date (default: today)
        #[arg(long)]
        reference: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
    /// Accumulated lateness and never-done count
    Health {
        /// Reference date, or day after the history window (default: today)
        #[arg(long)]
        reference: Option<NaiveDate>,
        /// Report each of the trailing days instead of one score
        #[arg(long)]
        history: bool,
        /// Days of history (default from config)
        #[arg(long)]
        days: Option<u32>,
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: ReportAction, today: Option<NaiveDate>) -> CmdResult {
    let app = open(today)?;

    match action {
        ReportAction::Convergence { json } => {
            let date = app.convergence()?;
            if json {
                print_json(&date)?;
            } else {
                println!("{date}");
            }
        }
        ReportAction::Delinquent { reference, json } => {
            let rhythms = app.delinquent(reference)?;
            if json {
                print_json(&rhythms)?;
            } else {
                for rhythm in &rhythms {
                    println!("{rhythm}");
                }
            }
        }
        ReportAction::Health {
            reference,
            history,
            days,
            json,
        } => {
            if history {
                let scores = app.health_history(reference, days)?;
                if json {
                    print_json(&scores)?;
                } else {
                    for (date, score) in &scores {
                        println!("{date} {score}");
                    }
                }
            } else {
                let score = app.health_check(reference)?;
                if json {
                    print_json(&score)?;
                } else {
                    println!("{score}");
                }
            }
        }
    }
    Ok(())
}
