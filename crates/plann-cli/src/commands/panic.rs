//! Panic planning commands for CLI.

use clap::Subcommand;
use plann_core::calendar::{CalendarStore, InMemoryCalendar};
use plann_core::postpone::Delay;
use plann_core::scheduler::{
    check_for_panic, pin_timeline, triage_steps, LateTask, PanicOptions, TriageStep, Verdict,
};
use plann_core::timeline::SlotView;
use plann_core::Timestamp;
use serde::Serialize;

use super::due::work_on;
use super::{postpone_interactively, show_when};
use crate::console::ConsoleDecider;
use crate::context::{CliResult, Context};
use crate::store::CalendarFile;

#[derive(Subcommand)]
pub enum PanicAction {
    /// Pack tasks into a timeline and list the ones that are already late
    Check {
        /// Hours per day available for tasks (default: planning.hours_per_day)
        #[arg(long)]
        hours_per_day: Option<f64>,
        /// Start of the timeline (default: now)
        #[arg(long)]
        timeline_start: Option<String>,
        /// End of the timeline (default: start + planning.horizon)
        #[arg(long)]
        timeline_end: Option<String>,
        /// Only list the late tasks
        #[arg(long)]
        no_print_timeline: bool,
        /// Put planned task slots on the calendar as tentative events
        #[arg(long)]
        fix_timeline: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Postpone late tasks, least important first
    Dismiss {
        /// Hours per day available for tasks (default: planning.hours_per_day)
        #[arg(long)]
        hours_per_day: Option<f64>,
        /// How far ahead to look (default: planning.lookahead)
        #[arg(long)]
        lookahead: Option<String>,
        /// Do not prompt; take every suggested delay and answer no to confirmations
        #[arg(long)]
        non_interactive: bool,
    },
}

#[derive(Serialize)]
struct SlotRow {
    begin: Option<Timestamp>,
    end: Option<Timestamp>,
    kind: &'static str,
    uid: Option<String>,
    summary: String,
}

impl SlotRow {
    fn from_slot(slot: &SlotView<'_>) -> Self {
        match slot.occupant {
            Some(occupant) => Self {
                begin: slot.begin,
                end: slot.end,
                kind: occupant.as_str(),
                uid: occupant.uid().map(str::to_string),
                summary: occupant.label().to_string(),
            },
            None => Self {
                begin: slot.begin,
                end: slot.end,
                kind: "free",
                uid: None,
                summary: "-- unallocated time --".to_string(),
            },
        }
    }
}

#[derive(Serialize)]
struct CheckOutput<'a> {
    timeline_start: Timestamp,
    timeline_end: Timestamp,
    panic: bool,
    late: &'a [LateTask],
    timeline: Vec<SlotRow>,
    pinned: Vec<String>,
}

pub fn run(ctx: &Context, action: PanicAction) -> CliResult {
    match action {
        PanicAction::Check {
            hours_per_day,
            timeline_start,
            timeline_end,
            no_print_timeline,
            fix_timeline,
            json,
        } => {
            let start = match timeline_start {
                Some(input) => ctx.timestamp(&input)?,
                None => ctx.tz.now(),
            };
            let end = match timeline_end {
                Some(input) => ctx.timestamp(&input)?,
                None => ctx.after(start, &ctx.config.planning.horizon)?,
            };
            let options = PanicOptions {
                hours_per_day: hours_per_day.unwrap_or(ctx.config.planning.hours_per_day),
                timeline_start: Some(start),
                timeline_end: Some(end),
            };

            let mut file = ctx.open_calendar()?;
            let report = check_for_panic(&file.calendar, &options, &ctx.tz)?;

            let mut pinned = Vec::new();
            if fix_timeline {
                pinned = pin_timeline(&report.timeline, start, &mut file.calendar, &ctx.tz)?;
                file.persist()?;
            }

            if json {
                let output = CheckOutput {
                    timeline_start: report.timeline_start,
                    timeline_end: report.timeline_end,
                    panic: report.is_panic(),
                    late: &report.late,
                    timeline: report.timeline.slots().map(|s| SlotRow::from_slot(&s)).collect(),
                    pinned: pinned.into_iter().map(|e| e.uid).collect(),
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
                return Ok(());
            }

            if !no_print_timeline {
                println!("Calculated timeline suggestion:");
                for slot in report.timeline.slots() {
                    let row = SlotRow::from_slot(&slot);
                    if let Some(begin) = row.begin {
                        println!("{} {}", ctx.show(begin), row.summary);
                    }
                }
                println!();
            }

            if report.is_panic() {
                println!("THESE TASKS WILL NEED TO BE PROCRASTINATED:");
                for task in &report.late {
                    println!(
                        "{} {} {}",
                        show_when(ctx, task.due),
                        task.priority.unwrap_or(0),
                        task.summary
                    );
                }
            } else {
                println!("No need to panic :-)");
            }
            if fix_timeline {
                println!("Pinned {} task slot(s) as tentative events", pinned.len());
            }
        }
        PanicAction::Dismiss {
            hours_per_day,
            lookahead,
            non_interactive,
        } => {
            let start = ctx.tz.now();
            let lookahead = lookahead.unwrap_or_else(|| ctx.config.planning.lookahead.clone());
            let options = PanicOptions {
                hours_per_day: hours_per_day.unwrap_or(ctx.config.planning.hours_per_day),
                timeline_start: Some(start),
                timeline_end: Some(ctx.after(start, &lookahead)?),
            };

            let mut file = ctx.open_calendar()?;
            let report = check_for_panic(&file.calendar, &options, &ctx.tz)?;
            let steps = triage_steps(&report.timeline, start);
            if steps.is_empty() {
                println!("No need to panic :-)");
                return Ok(());
            }

            let mut console = ConsoleDecider::new(non_interactive);
            let outcome = dismiss(ctx, &mut file, &mut console, steps, start);
            // keep whatever was postponed before a step gave up
            file.persist()?;
            outcome?;
        }
    }
    Ok(())
}

fn dismiss(
    ctx: &Context,
    file: &mut CalendarFile,
    console: &mut ConsoleDecider,
    steps: Vec<TriageStep>,
    now: Timestamp,
) -> CliResult {
    for step in steps {
        let priority = step
            .priority
            .map_or_else(|| "undefined".to_string(), |p| p.to_string());
        println!("Tasks that needs to be postponed (priority={priority}):");
        for task in &step.late {
            println!(
                "Should have started: {} - Due: {}: {}",
                ctx.show(task.should_have_started),
                show_when(ctx, task.due),
                task.summary
            );
        }

        match step.verdict {
            Verdict::HighPriority => {
                return Err("PANIC!  Those are all high-priority tasks and cannot be postponed!".into())
            }
            Verdict::CannotPostpone => {
                return Err(
                    "PANIC!  Those tasks cannot be postponed.  Maybe you want to cancel some of them?"
                        .into(),
                )
            }
            Verdict::Postpone => {}
        }

        let answer = console.ask_line(
            "Push the due-date with ... (press O for one-by-one)",
            &step.suggested_delay,
        )?;
        if answer.eq_ignore_ascii_case("o") {
            for late in &step.late {
                let Some(task) = file.calendar.task(&late.uid)? else {
                    continue;
                };
                work_on(ctx, file, console, &task, now)?;
            }
        } else {
            let delay = Delay::parse(&answer, &ctx.tz)?;
            postpone(ctx, &mut file.calendar, console, &step.late, &delay, now)?;
        }

        if !step.later.is_empty() {
            println!(
                "There are {} later tasks with priority {priority} which should maybe be postponed a bit as well",
                step.later.len()
            );
            let answer = console.ask_line("Push the due-date for those with ...", "0h")?;
            let delay = Delay::parse(&answer, &ctx.tz)?;
            if !delay.is_zero() {
                postpone(ctx, &mut file.calendar, console, &step.later, &delay, now)?;
            }
        }
    }
    Ok(())
}

fn postpone(
    ctx: &Context,
    calendar: &mut InMemoryCalendar,
    console: &mut ConsoleDecider,
    tasks: &[LateTask],
    delay: &Delay,
    now: Timestamp,
) -> CliResult {
    let uids: Vec<String> = tasks.iter().map(|t| t.uid.clone()).collect();
    let moved = postpone_interactively(ctx, calendar, console, &uids, delay, now)?;
    println!("Postponed {moved} task(s) by {delay}");
    Ok(())
}
