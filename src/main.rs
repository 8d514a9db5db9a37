use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::debug;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

mod capability;
mod classify;
mod cli_output;
mod commands;
mod config;
mod error;
mod grid;
mod models;
mod render;
mod stats;
mod store;
mod tui;

use cli_output::{OutputMode, OutputWriter};
use commands::parse_timeline;
use config::Settings;
use grid::{Clock, SystemClock};
use models::Timeline;
use store::JsonStore;
use tui::SessionOptions;

#[derive(Parser)]
#[command(name = "hab")]
#[command(about = "Track daily habits on a contribution grid", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Habit to log for today
    habit: Option<String>,

    /// Open the interactive grid view
    #[arg(short, long)]
    interactive: bool,

    /// Initial timeline for the interactive view (3m, 6m, 12m)
    #[arg(short, long, value_parser = parse_timeline, default_value = "12m")]
    timeline: Timeline,

    /// Start with the legend hidden
    #[arg(long)]
    no_legend: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this data file instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    data_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new habit
    New {
        /// Habit key (prompts for a name when omitted)
        key: Option<String>,

        /// Display color (red, blue, green, magenta, cyan, yellow, gray)
        #[arg(short, long)]
        color: Option<String>,

        /// Entries per day that count as complete
        #[arg(short, long)]
        target: Option<i64>,
    },

    /// Log an entry for a habit
    Add {
        habit: String,

        /// Date to log (YYYY-MM-DD, default: today)
        date: Option<String>,

        /// Same as the positional date
        #[arg(short, long = "date", value_name = "DATE", conflicts_with = "date")]
        date_flag: Option<String>,
    },

    /// Remove one entry from a habit
    Remove {
        habit: String,

        /// Date to remove (YYYY-MM-DD, default: today)
        date: Option<String>,
    },

    /// Change a habit's name, color or target
    Edit {
        habit: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(short, long)]
        color: Option<String>,

        #[arg(long)]
        target: Option<i64>,
    },

    /// Delete a habit and all of its entries
    Delete {
        habit: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// List all habits with statistics
    List,

    /// Show statistics for one habit
    Stats { habit: String },

    /// Remove entries that exceed the daily target
    Prune {
        /// Only prune this habit
        habit: Option<String>,

        /// Show what would be removed without changing anything
        #[arg(long)]
        dry_run: bool,

        /// Skip the confirmation prompts
        #[arg(short, long)]
        force: bool,
    },

    /// Print the grid without entering the interactive view
    Show {
        /// Only show this habit
        habit: Option<String>,

        /// Timeline to show (3m, 6m, 12m)
        #[arg(short, long, value_parser = parse_timeline, default_value = "12m")]
        timeline: Timeline,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::from_env();
    if let Some(path) = &cli.data_file {
        settings.data_file = path.clone();
    }

    let interactive = cli.command.is_none() && (cli.interactive || cli.habit.is_none());
    init_logging(cli.verbose, interactive, &settings)?;
    debug!("Using data file {}", settings.data_file.display());

    let tier = capability::detect(&settings.signals);
    let clock = SystemClock;

    if interactive {
        let store = JsonStore::new(settings.data_file.clone());
        let options = SessionOptions {
            timeline: cli.timeline,
            legend_visible: !cli.no_legend,
            debug: settings.debug,
        };
        return tui::run(Box::new(store), Box::new(clock), tier, options);
    }

    let out = OutputWriter::new(OutputMode::detect(settings.json_output));
    if let Err(e) = dispatch(cli, &settings, &out, tier, clock.today()) {
        out.error(&format!("{:#}", e));
        std::process::exit(1);
    }
    Ok(())
}

fn dispatch(
    cli: Cli,
    settings: &Settings,
    out: &OutputWriter,
    tier: capability::RenderingTier,
    today: chrono::NaiveDate,
) -> Result<()> {
    let mut store = JsonStore::open(settings.data_file.clone())?;

    let Some(command) = cli.command else {
        let habit = cli.habit.ok_or_else(|| anyhow!("no habit given"))?;
        return commands::add_entry(&mut store, out, &habit, None, today);
    };

    match command {
        Commands::New { key, color, target } => {
            commands::new_habit(&mut store, out, key, color, target)
        }
        Commands::Add {
            habit,
            date,
            date_flag,
        } => {
            let date = date.or(date_flag);
            commands::add_entry(&mut store, out, &habit, date.as_deref(), today)
        }
        Commands::Remove { habit, date } => {
            commands::remove_entry(&mut store, out, &habit, date.as_deref(), today)
        }
        Commands::Edit {
            habit,
            name,
            color,
            target,
        } => commands::edit_habit(&mut store, out, &habit, name, color, target),
        Commands::Delete { habit, force } => commands::delete_habit(&mut store, out, &habit, force),
        Commands::List => commands::list_habits(&store, out, today),
        Commands::Stats { habit } => commands::show_stats(&store, out, &habit, today),
        Commands::Prune {
            habit,
            dry_run,
            force,
        } => commands::prune(&mut store, out, habit.as_deref(), dry_run, force),
        Commands::Show { habit, timeline } => {
            let width = crossterm::terminal::size().map(|(w, _)| w).unwrap_or(80);
            commands::show_grid(&store, out, habit.as_deref(), timeline, tier, today, width)
        }
    }
}

/// CLI commands log to stderr. The interactive view owns the terminal, so its
/// log goes to a file beside the data file.
fn init_logging(verbose: bool, interactive: bool, settings: &Settings) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(config::LOG_VAR).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let writer = if interactive {
        let path = settings.log_file();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        BoxMakeWriter::new(Mutex::new(file))
    } else {
        BoxMakeWriter::new(std::io::stderr)
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(writer)
        .with_ansi(!interactive)
        .init();
    Ok(())
}
