use clap::Subcommand;
use plann_core::error::InconsistentRelation;

use crate::context::{CliResult, Context};

#[derive(Subcommand)]
pub enum RelationsAction {
    /// Report links whose back link is missing or wrong
    Check {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(ctx: &Context, action: RelationsAction) -> CliResult {
    match action {
        RelationsAction::Check { json } => {
            let file = ctx.open_calendar()?;
            let graph = file.calendar.graph();
            let problems = graph.validate();
            let dangling = graph.dangling();

            if json {
                let output = serde_json::json!({
                    "consistent": problems.is_empty(),
                    "problems": problems.iter().map(describe).collect::<Vec<_>>(),
                    "unknown_targets": dangling
                        .iter()
                        .map(|(from, to)| serde_json::json!({ "from": from, "to": to }))
                        .collect::<Vec<_>>(),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else if problems.is_empty() {
                println!("relations are consistent");
            } else {
                for problem in &problems {
                    println!("{problem}");
                }
                for (from, to) in &dangling {
                    println!("{from} links to unknown object {to}");
                }
            }

            if !problems.is_empty() {
                return Err(format!("{} inconsistent relation(s)", problems.len()).into());
            }
        }
    }
    Ok(())
}

fn describe(problem: &InconsistentRelation) -> serde_json::Value {
    let (kind, from, to) = match problem {
        InconsistentRelation::MissingBackLink { from, to } => ("missing_back_link", from, to),
        InconsistentRelation::MultipleBackLinks { from, to } => ("multiple_back_links", from, to),
        InconsistentRelation::MismatchedBackLink { from, to } => ("mismatched_back_link", from, to),
    };
    let types = |reltypes: &[plann_core::RelationType]| {
        reltypes.iter().map(|r| r.as_str()).collect::<Vec<_>>()
    };
    serde_json::json!({
        "kind": kind,
        "from": from.uid,
        "from_reltypes": types(from.reltypes.as_slice()),
        "to": to.uid,
        "to_reltypes": types(to.reltypes.as_slice()),
        "message": problem.to_string(),
    })
}
