use std::path::PathBuf;

use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod console;
mod context;
mod store;

use context::Context;

#[derive(Parser)]
#[command(name = "plann", version, about = "Plan tasks and events in a calendar")]
struct Cli {
    /// Calendar snapshot file (default: calendar_file from the config)
    #[arg(long, global = true)]
    calendar: Option<PathBuf>,
    /// Config file (default: ~/.config/plann/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// More logging; repeat for trace output
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether the task list fits in the available time
    Panic {
        #[command(subcommand)]
        action: commands::panic::PanicAction,
    },
    /// Move task due dates forward
    Postpone(commands::postpone::PostponeArgs),
    /// Relation consistency between objects
    Relations {
        #[command(subcommand)]
        action: commands::relations::RelationsAction,
    },
    /// List calendar objects
    List(commands::list::ListArgs),
    /// Add a task or an event
    Add {
        #[command(subcommand)]
        action: commands::add::AddAction,
    },
    /// Change tasks: set attributes, add categories, complete or cancel
    Edit(commands::edit::EditArgs),
    /// Mark tasks as completed
    Complete(commands::edit::CompleteArgs),
    /// Delete objects
    Delete(commands::edit::DeleteArgs),
    /// Upcoming events and the tasks to work on
    Agenda(commands::agenda::AgendaArgs),
    /// Sum up task estimates and event lengths
    SumHours(commands::agenda::SumHoursArgs),
    /// Go through overdue and soon-due tasks one by one
    CheckDue(commands::due::CheckDueArgs),
    /// Offer to split tasks with a big estimate into subtasks
    SplitHugeTasks(commands::split::SplitArgs),
    /// Date and duration arithmetic
    Time {
        #[command(subcommand)]
        action: commands::time::TimeAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print shell completions
    Completions { shell: clap_complete::Shell },
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        })
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "plann", &mut std::io::stdout());
        return;
    }

    let result = Context::load(cli.config, cli.calendar).and_then(|ctx| match cli.command {
        Commands::Panic { action } => commands::panic::run(&ctx, action),
        Commands::Postpone(args) => commands::postpone::run(&ctx, args),
        Commands::Relations { action } => commands::relations::run(&ctx, action),
        Commands::List(args) => commands::list::run(&ctx, args),
        Commands::Add { action } => commands::add::run(&ctx, action),
        Commands::Edit(args) => commands::edit::run_edit(&ctx, args),
        Commands::Complete(args) => commands::edit::run_complete(&ctx, args),
        Commands::Delete(args) => commands::edit::run_delete(&ctx, args),
        Commands::Agenda(args) => commands::agenda::run(&ctx, args),
        Commands::SumHours(args) => commands::agenda::run_sum_hours(&ctx, args),
        Commands::CheckDue(args) => commands::due::run(&ctx, args),
        Commands::SplitHugeTasks(args) => commands::split::run(&ctx, args),
        Commands::Time { action } => commands::time::run(&ctx, action),
        Commands::Config { action } => commands::config::run(&ctx, action),
        Commands::Completions { .. } => Ok(()),
    });

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
