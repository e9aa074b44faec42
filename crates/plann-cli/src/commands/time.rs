//! Time arithmetic helpers, mostly for checking what an expression means.

use clap::Subcommand;
use plann_core::timespec::{
    parse_add_dur, parse_dt, parse_timespec, AddedDuration, DurationMode, Want,
};
use plann_core::DateOrTime;

use crate::context::{CliResult, Context};

#[derive(Subcommand)]
pub enum TimeAction {
    /// Parse a date or timestamp, e.g. "2025-03-01 10:00" or "+2h"
    Parse {
        input: String,
        /// Always answer with a timestamp
        #[arg(long)]
        datetime: bool,
    },
    /// Add a duration such as 1d2h to a date or timestamp
    Add {
        /// Base date or timestamp; without it the length is printed
        #[arg(long)]
        base: Option<String>,
        duration: String,
        /// Accept an absolute timestamp instead of a duration
        #[arg(long)]
        allow_timestamp: bool,
    },
    /// Parse an interval such as "2025-03-01+2h" or "2025-03-01 2025-03-04"
    Span { timespec: String },
}

pub fn run(ctx: &Context, action: TimeAction) -> CliResult {
    match action {
        TimeAction::Parse { input, datetime } => {
            let want = if datetime { Want::DateTime } else { Want::Auto };
            println!("{}", show(ctx, parse_dt(&input, want, &ctx.tz)?));
        }
        TimeAction::Add {
            base,
            duration,
            allow_timestamp,
        } => {
            let base = base
                .map(|b| parse_dt(&b, Want::Auto, &ctx.tz))
                .transpose()?;
            let mode = if allow_timestamp {
                DurationMode::AllowTimestamp
            } else {
                DurationMode::Strict
            };
            match parse_add_dur(base, &duration, mode, &ctx.tz)? {
                AddedDuration::Span(span) => println!("{}s", span.num_seconds()),
                AddedDuration::At(value) => println!("{}", show(ctx, value)),
            }
        }
        TimeAction::Span { timespec } => {
            let (start, end) = parse_timespec(&timespec, &ctx.tz)?;
            match end {
                Some(end) => println!("{} {}", show(ctx, start), show(ctx, end)),
                None => println!("{}", show(ctx, start)),
            }
        }
    }
    Ok(())
}

fn show(ctx: &Context, value: DateOrTime) -> String {
    match value {
        DateOrTime::Date(date) => date.to_string(),
        DateOrTime::DateTime(ts) => ctx.tz.display(ts).to_rfc3339(),
    }
}
