use clap::Args;
use plann_core::calendar::{CalendarStore, ObjectKinds, SearchQuery};

use super::object_line;
use crate::context::{CliResult, Context};

/// Which objects a command works on.
#[derive(Args)]
pub struct Selection {
    /// Only tasks
    #[arg(long)]
    todo: bool,
    /// Only events
    #[arg(long)]
    event: bool,
    /// Window start
    #[arg(long)]
    start: Option<String>,
    /// Window end
    #[arg(long)]
    end: Option<String>,
    /// Include completed and cancelled tasks
    #[arg(long)]
    include_completed: bool,
}

impl Selection {
    pub fn query(&self, ctx: &Context) -> CliResult<SearchQuery> {
        let kinds = if self.todo || self.event {
            ObjectKinds {
                todo: self.todo,
                event: self.event,
            }
        } else {
            ObjectKinds::default()
        };
        let start = self.start.as_deref().map(|s| ctx.timestamp(s)).transpose()?;
        let end = self.end.as_deref().map(|s| ctx.timestamp(s)).transpose()?;
        Ok(SearchQuery {
            kinds,
            include_completed: self.include_completed,
            ..SearchQuery::default()
        }
        .between(start, end))
    }
}

#[derive(Args)]
pub struct ListArgs {
    #[command(flatten)]
    selection: Selection,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(ctx: &Context, args: ListArgs) -> CliResult {
    let query = args.selection.query(ctx)?;
    let file = ctx.open_calendar()?;
    let objects = file.calendar.search(&query)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&objects)?);
        return Ok(());
    }

    if objects.is_empty() {
        println!("No objects found.");
        return Ok(());
    }
    for object in &objects {
        println!("{}", object_line(ctx, object));
    }
    Ok(())
}
