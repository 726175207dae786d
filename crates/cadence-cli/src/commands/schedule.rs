//! Schedule command for CLI.

use cadence_core::Schedule;
use chrono::NaiveDate;
use clap::Args;

use super::{open, print_json, CmdResult};

#[derive(Args)]
pub struct ScheduleArgs {
    /// First day (default: today)
    #[arg(long)]
    start: Option<NaiveDate>,
    /// Day after the last day (default: today plus the configured horizon)
    #[arg(long)]
    limit: Option<NaiveDate>,
    /// Raw beats without smoothing or capacity
    #[arg(long)]
    basic: bool,
    #[arg(long)]
    json: bool,
}

fn print_schedule(schedule: &Schedule) {
    for (date, rhythms) in &schedule.days {
        println!("{date} {}", date.format("%a"));
        for rhythm in rhythms {
            println!("  {} {}", rhythm.id(), rhythm.description());
        }
    }
}

pub fn run(args: ScheduleArgs, today: Option<NaiveDate>) -> CmdResult {
    let app = open(today)?;
    let schedule = if args.basic {
        app.basic_schedule(args.start, args.limit)?
    } else {
        app.schedule(args.start, args.limit)?
    };
    if args.json {
        print_json(&schedule)?;
    } else {
        print_schedule(&schedule);
    }
    Ok(())
}
