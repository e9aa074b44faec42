use clap::Args;
use plann_core::postpone::{CheckDependent, Choice, Delay, PostponePolicy, Postponer};

use super::show_when;
use crate::console::ConsoleDecider;
use crate::context::{CliResult, Context};

#[derive(Args)]
pub struct PostponeArgs {
    /// Tasks to postpone
    #[arg(required = true)]
    uids: Vec<String>,
    /// A duration like 3d, or a new due date (default: postpone.default_delay)
    #[arg(long, short)]
    delay: Option<String>,
    /// Postpone child tasks too (yes, no or ask)
    #[arg(long, default_value = "no")]
    with_children: Choice,
    /// Postpone parent tasks and their children (yes, no or ask)
    #[arg(long, default_value = "no")]
    with_parent: Choice,
    /// Postpone the whole family (yes, no or ask)
    #[arg(long, default_value = "no")]
    with_family: Choice,
    /// error, interactive, return or off (default: postpone.check_dependent)
    #[arg(long)]
    check_dependent: Option<CheckDependent>,
    /// Do not prompt; every confirmation is answered with no
    #[arg(long)]
    non_interactive: bool,
}

pub fn run(ctx: &Context, args: PostponeArgs) -> CliResult {
    let delay = args
        .delay
        .as_deref()
        .unwrap_or(&ctx.config.postpone.default_delay);
    let delay = Delay::parse(delay, &ctx.tz)?;
    let policy = PostponePolicy::new(
        args.check_dependent
            .unwrap_or(ctx.config.postpone.check_dependent),
    )
    .with_children(args.with_children)
    .with_parent(args.with_parent)
    .with_family(args.with_family);

    let mut file = ctx.open_calendar()?;
    let mut console = ConsoleDecider::new(args.non_interactive);
    let mut postponer = Postponer::new(&mut file.calendar, &mut console, ctx.tz);
    let blocked = postponer.procrastinate(&args.uids, &delay, &policy)?;
    let mut moved: Vec<String> = postponer.postponed().iter().cloned().collect();
    moved.sort();

    file.persist()?;

    for uid in &moved {
        println!("postponed {uid}");
    }
    if let Some(parent) = blocked {
        println!(
            "blocked by parent {} ({}), due {}",
            parent.label(),
            parent.uid,
            show_when(ctx, parent.due)
        );
    }
    if moved.is_empty() {
        println!("nothing postponed");
    }
    Ok(())
}
