//! CLI driver for TaskTrack core.
//!
//! # Responsibility
//! - Verify `tasktrack_core` linkage without the Flutter/FFI runtime.
//! - Drive the task list store against a SQLite file from a terminal.
//!
//! Task positions are 1-based on the command line.

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tasktrack_core::{resolve_db_path, HydrateOutcome, StoreConfig, TaskListStore};

#[derive(Parser)]
#[command(name = "tasktrack", about = "TaskTrack task list driver", version)]
struct Cli {
    /// SQLite file holding the task list (defaults to TASKTRACK_DB_PATH or temp dir)
    #[arg(long)]
    db: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print core linkage info
    Ping,
    #[command(flatten)]
    Task(TaskCommand),
}

/// Commands that open the task store.
#[derive(Subcommand)]
enum TaskCommand {
    /// Show all tasks
    List,
    /// Append a task
    Add { text: String },
    /// Flip completion of the task at POSITION
    Toggle { position: usize },
    /// Replace the title of the task at POSITION
    Edit { position: usize, text: String },
    /// Remove the task at POSITION
    Delete { position: usize },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Ping => {
            println!("tasktrack_core ping={}", tasktrack_core::ping());
            println!("tasktrack_core version={}", tasktrack_core::core_version());
            Ok(())
        }
        Command::Task(command) => run(cli.db.as_deref(), command),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(db: Option<&str>, command: TaskCommand) -> Result<(), String> {
    let path = resolve_db_path(db);
    let (mut store, outcome) =
        TaskListStore::open_file(&path, &StoreConfig::default()).map_err(|err| err.to_string())?;
    if let HydrateOutcome::Failed { reason } = &outcome {
        eprintln!("warning: saved tasks could not be loaded: {reason}");
    }

    match command {
        TaskCommand::List => {}
        TaskCommand::Add { text } => {
            if !store.add(&text).map_err(|err| err.to_string())?.list_changed {
                return Err("task text is blank".to_string());
            }
        }
        TaskCommand::Toggle { position } => {
            store
                .toggle_completion_at(to_index(position)?)
                .map_err(|err| err.to_string())?;
        }
        TaskCommand::Edit { position, text } => {
            store
                .begin_edit_at(to_index(position)?)
                .map_err(|err| err.to_string())?;
            if !store.add(&text).map_err(|err| err.to_string())?.list_changed {
                store.cancel_edit();
                return Err("task text is blank".to_string());
            }
        }
        TaskCommand::Delete { position } => {
            store
                .delete_at(to_index(position)?)
                .map_err(|err| err.to_string())?;
        }
    }

    print_tasks(&store);
    if !store.flush() {
        return Err("snapshot writer stopped before saving".to_string());
    }
    Ok(())
}

fn to_index(position: usize) -> Result<usize, String> {
    position
        .checked_sub(1)
        .ok_or_else(|| "positions start at 1".to_string())
}

fn print_tasks(store: &TaskListStore) {
    if store.tasks().is_empty() {
        println!("(no tasks)");
        return;
    }
    for (index, task) in store.tasks().iter().enumerate() {
        let mark = if task.completed { "x" } else { " " };
        println!("{:>3}. [{mark}] {}", index + 1, task.title);
    }
}
