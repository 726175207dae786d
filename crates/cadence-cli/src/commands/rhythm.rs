//! Rhythm catalog commands for CLI.

use cadence_core::rhythm::parse_weekday;
use cadence_core::{
    DailyEdit, EveryNDaysEdit, MonthlyEdit, Rhythm, RhythmKind, Slider, WeekDailyEdit,
};
use chrono::NaiveDate;
use clap::Subcommand;

use super::{open, parse_id, print_json, CmdResult};

#[derive(Subcommand)]
pub enum RhythmAction {
    /// Add a rhythm due every day
    AddDaily {
        /// What to do
        description: String,
    },
    /// Add a rhythm due on a day of the month
    AddMonthly {
        description: String,
        /// Day of the month (1-31)
        #[arg(long)]
        dotm: u32,
        /// Days the beat may move earlier
        #[arg(long, default_value_t = 0)]
        before: u32,
        /// Days the beat may move later
        #[arg(long, default_value_t = 0)]
        after: u32,
    },
    /// Add a rhythm due on a day of the week
    AddWeekDaily {
        description: String,
        /// Day of the week: 0-6 (Monday = 0) or a name such as "sat"
        #[arg(long)]
        dotw: String,
        #[arg(long, default_value_t = 0)]
        before: u32,
        #[arg(long, default_value_t = 0)]
        after: u32,
    },
    /// Add a rhythm due roughly every N days
    AddEveryNDays {
        description: String,
        /// Period in days (2-90)
        #[arg(long)]
        n: u32,
        #[arg(long, default_value_t = 0)]
        before: u32,
        #[arg(long, default_value_t = 0)]
        after: u32,
    },
    /// List rhythms
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one rhythm
    Show {
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Edit a rhythm in place
    Edit {
        id: String,
        #[arg(long)]
        description: Option<String>,
        /// New day of the month (monthly rhythms)
        #[arg(long)]
        dotm: Option<u32>,
        /// New day of the week (week-daily rhythms)
        #[arg(long)]
        dotw: Option<String>,
        /// New period (every-n-days rhythms)
        #[arg(long)]
        n: Option<u32>,
        #[arg(long)]
        before: Option<u32>,
        #[arg(long)]
        after: Option<u32>,
    },
    /// Delete a rhythm and its history
    Delete { id: String },
}

fn weekday(raw: &str) -> Result<u32, String> {
    parse_weekday(raw).ok_or_else(|| format!("invalid day of the week: {raw}"))
}

fn print_rhythm(rhythm: &Rhythm) {
    println!("{rhythm}");
    println!("  {}", rhythm.human_line());
}

pub fn run(action: RhythmAction, today: Option<NaiveDate>) -> CmdResult {
    let app = open(today)?;

    match action {
        RhythmAction::AddDaily { description } => {
            println!("id:{}", app.add_daily(&description)?);
        }
        RhythmAction::AddMonthly {
            description,
            dotm,
            before,
            after,
        } => {
            println!("id:{}", app.add_monthly(&description, dotm, Slider::new(before, after))?);
        }
        RhythmAction::AddWeekDaily {
            description,
            dotw,
            before,
            after,
        } => {
            let dotw = weekday(&dotw)?;
            println!("id:{}", app.add_week_daily(&description, dotw, Slider::new(before, after))?);
        }
        RhythmAction::AddEveryNDays {
            description,
            n,
            before,
            after,
        } => {
            println!("id:{}", app.add_every_n_days(&description, n, Slider::new(before, after))?);
        }
        RhythmAction::List { json } => {
            let rhythms = app.list_rhythms()?;
            if json {
                print_json(&rhythms)?;
            } else if rhythms.is_empty() {
                println!("No rhythms.");
            } else {
                for rhythm in &rhythms {
                    println!("{rhythm}");
                }
            }
        }
        RhythmAction::Show { id, json } => {
            let rhythm = app.rhythm(&parse_id(&id)?)?;
            if json {
                print_json(&rhythm)?;
            } else {
                print_rhythm(&rhythm);
            }
        }
        RhythmAction::Edit {
            id,
            description,
            dotm,
            dotw,
            n,
            before,
            after,
        } => {
            let id = parse_id(&id)?;
            let dotw = dotw.as_deref().map(weekday).transpose()?;
            // A variant parameter selects the edit; otherwise the stored kind does.
            let kind = if dotm.is_some() {
                RhythmKind::Monthly
            } else if dotw.is_some() {
                RhythmKind::WeekDaily
            } else if n.is_some() {
                RhythmKind::EveryNDays
            } else {
                app.rhythm(&id)?.kind()
            };
            let edited = match kind {
                RhythmKind::Daily => {
                    if before.is_some() || after.is_some() {
                        return Err("daily rhythms have no slider".into());
                    }
                    app.edit_daily(&id, DailyEdit { description })?
                }
                RhythmKind::Monthly => app.edit_monthly(
                    &id,
                    MonthlyEdit {
                        description,
                        dotm,
                        slider_before: before,
                        slider_after: after,
                    },
                )?,
                RhythmKind::WeekDaily => app.edit_week_daily(
                    &id,
                    WeekDailyEdit {
                        description,
                        dotw,
                        slider_before: before,
                        slider_after: after,
                    },
                )?,
                RhythmKind::EveryNDays => app.edit_every_n_days(
                    &id,
                    EveryNDaysEdit {
                        description,
                        n,
                        slider_before: before,
                        slider_after: after,
                    },
                )?,
            };
            print_rhythm(&edited);
        }
        RhythmAction::Delete { id } => {
            let id = parse_id(&id)?;
            app.delete_rhythm(&id)?;
            println!("Deleted {id}");
        }
    }
    Ok(())
}
