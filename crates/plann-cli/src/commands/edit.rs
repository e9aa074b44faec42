//! Changing, completing and deleting calendar objects.

use clap::Args;
use plann_core::calendar::{CalendarStore, TaskEdit, TaskStatus};
use plann_core::error::StoreError;
use plann_core::DurationSpec;
use tracing::info;

use crate::console::ConsoleDecider;
use crate::context::{CliResult, Context};

/// `--set-*` flags shared by `add todo` and `edit`.
#[derive(Args)]
pub struct SetArgs {
    /// New summary
    #[arg(long)]
    set_summary: Option<String>,
    /// New description
    #[arg(long)]
    set_description: Option<String>,
    /// New due date or timestamp
    #[arg(long)]
    set_due: Option<String>,
    /// New start date or timestamp
    #[arg(long)]
    set_dtstart: Option<String>,
    /// New estimate, like 2h
    #[arg(long)]
    set_duration: Option<String>,
    /// 1 (most urgent) to 9; 0 clears it
    #[arg(long)]
    set_priority: Option<String>,
    /// Comma-separated categories, replacing the current ones
    #[arg(long)]
    set_category: Option<String>,
    /// needs-action, in-process, completed or cancelled
    #[arg(long)]
    set_status: Option<String>,
}

impl SetArgs {
    pub fn to_edit(&self, ctx: &Context) -> CliResult<TaskEdit> {
        let mut edit = TaskEdit::default();
        let fields = [
            ("summary", &self.set_summary),
            ("description", &self.set_description),
            ("due", &self.set_due),
            ("dtstart", &self.set_dtstart),
            ("duration", &self.set_duration),
            ("priority", &self.set_priority),
            ("category", &self.set_category),
            ("status", &self.set_status),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                edit.set(key, value, &ctx.tz)?;
            }
        }
        Ok(edit)
    }
}

#[derive(Args)]
pub struct EditArgs {
    /// Tasks to edit
    #[arg(required = true)]
    uids: Vec<String>,
    #[command(flatten)]
    set: SetArgs,
    /// Add a category; may be repeated
    #[arg(long)]
    add_category: Vec<String>,
    /// Move due and start by a duration, ignoring relations
    #[arg(long)]
    shift: Option<String>,
    /// Mark as completed
    #[arg(long, conflicts_with_all = ["uncomplete", "cancel", "uncancel"])]
    complete: bool,
    /// Mark as needing action again
    #[arg(long)]
    uncomplete: bool,
    /// Mark as cancelled
    #[arg(long, conflicts_with_all = ["uncomplete", "uncancel"])]
    cancel: bool,
    /// Undo a cancel
    #[arg(long)]
    uncancel: bool,
}

pub fn run_edit(ctx: &Context, args: EditArgs) -> CliResult {
    let mut edit = args.set.to_edit(ctx)?;
    edit.add_categories = args.add_category;
    edit.shift = args.shift.as_deref().map(DurationSpec::parse).transpose()?;
    if args.complete {
        edit.status = Some(TaskStatus::Completed);
    } else if args.cancel {
        edit.status = Some(TaskStatus::Cancelled);
    } else if args.uncomplete || args.uncancel {
        edit.status = Some(TaskStatus::NeedsAction);
    }
    if edit.is_empty() {
        return Err("nothing to change; see --help for the edit flags".into());
    }
    apply(ctx, &args.uids, &edit)
}

#[derive(Args)]
pub struct CompleteArgs {
    /// Tasks to mark as completed
    #[arg(required = true)]
    uids: Vec<String>,
}

pub fn run_complete(ctx: &Context, args: CompleteArgs) -> CliResult {
    let edit = TaskEdit {
        status: Some(TaskStatus::Completed),
        ..TaskEdit::default()
    };
    apply(ctx, &args.uids, &edit)
}

/// Edit every task, then write once. A missing uid aborts before anything
/// is written.
fn apply(ctx: &Context, uids: &[String], edit: &TaskEdit) -> CliResult {
    let mut file = ctx.open_calendar()?;
    for uid in uids {
        let mut task = file
            .calendar
            .task(uid)?
            .ok_or_else(|| StoreError::NotFound(uid.clone()))?;
        edit.apply(&mut task, &ctx.tz)?;
        file.calendar.update_task(task)?;
        file.calendar.save(uid)?;
        info!(%uid, "task edited");
    }
    file.persist()?;
    for uid in uids {
        println!("updated {uid}");
    }
    Ok(())
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Objects to delete
    #[arg(required = true)]
    uids: Vec<String>,
    /// Delete several objects without asking first
    #[arg(long)]
    multi_delete: bool,
}

pub fn run_delete(ctx: &Context, args: DeleteArgs) -> CliResult {
    let count = args.uids.len();
    if count > 1 && !args.multi_delete {
        let ok = ConsoleDecider::new(false).confirm(&format!("OK to delete {count} items?"))?;
        if !ok {
            return Err(format!("Not going to delete {count} items").into());
        }
    }

    let mut file = ctx.open_calendar()?;
    for uid in &args.uids {
        let removed = file.calendar.delete(uid)?;
        info!(%uid, label = removed.label(), "deleted");
    }
    file.persist()?;
    for uid in &args.uids {
        println!("deleted {uid}");
    }
    Ok(())
}
