use clap::{Parser, Subcommand};
use liftlog_core::units::{format_weight, round1};
use liftlog_core::*;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "liftlog")]
#[command(about = "Strength training log with 1RM progress tracking", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Exercise to operate on (defaults to the first one)
    #[arg(short, long, global = true)]
    exercise: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show stats and history for the exercise (default)
    Show {
        /// Base statistics on 1rm or weight
        #[arg(long)]
        metric: Option<String>,
    },

    /// List exercises
    Exercises,

    /// Create an exercise
    AddExercise { name: String },

    /// Delete an exercise and all of its sets
    DeleteExercise {
        /// Exercise to delete (defaults to the selected one)
        name: Option<String>,

        /// Do not ask for confirmation
        #[arg(long)]
        yes: bool,
    },

    /// Log a set
    Log {
        /// Weight in the current unit
        #[arg(long, allow_hyphen_values = true)]
        weight: String,

        /// Repetitions
        #[arg(long, allow_hyphen_values = true)]
        reps: String,

        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
    },

    /// Delete a set by id
    DeleteSet { id: String },

    /// Switch the display unit (kg or lb)
    Unit { unit: String },

    /// Print the set history, newest first
    History,

    /// Print baseline, best and percent change
    Stats {
        /// Base statistics on 1rm or weight
        #[arg(long)]
        metric: Option<String>,
    },

    /// Print the per-date progress series
    Chart {
        /// Chart 1rm or weight
        #[arg(long)]
        metric: Option<String>,
    },

    /// Export a backup (JSON) or a spreadsheet (CSV)
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Export CSV instead of JSON
        #[arg(long)]
        csv: bool,
    },

    /// Replace the log with a JSON backup
    Import { file: PathBuf },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Keep stdout clean for command output unless asked otherwise
    liftlog_core::logging::init_with_level(if cli.verbose { "debug" } else { "warn" });

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    tracing::debug!("Using data directory {:?}", data_dir);

    // Held until the command returns so overlapping runs cannot lose writes
    let store = FileBlobStore::new(&data_dir);
    let _lock = store.lock(DATA_KEY)?;

    let mut tracker = Tracker::open_with(store, UuidIds, config.tracker_defaults())?;

    if let Some(name) = &cli.exercise {
        // add-exercise selects on its own; everything else needs an existing name
        let creating = matches!(cli.command, Some(Commands::AddExercise { .. }));
        if !creating && !tracker.select_exercise(name) {
            return Err(Error::Other(format!("Unknown exercise '{}'", name)));
        }
    }

    let default_metric = config.metrics.comparison;

    match cli.command {
        Some(Commands::Show { metric }) => {
            let metric = resolve_metric(metric, default_metric)?;
            print_stats(&tracker, metric);
            println!();
            print_history(&tracker);
        }
        None => {
            print_stats(&tracker, default_metric);
            println!();
            print_history(&tracker);
        }
        Some(Commands::Exercises) => cmd_exercises(&tracker),
        Some(Commands::AddExercise { name }) => cmd_add_exercise(&mut tracker, &name)?,
        Some(Commands::DeleteExercise { name, yes }) => {
            cmd_delete_exercise(&mut tracker, name, yes)?
        }
        Some(Commands::Log { weight, reps, date }) => {
            cmd_log(&mut tracker, &weight, &reps, date.as_deref())?
        }
        Some(Commands::DeleteSet { id }) => cmd_delete_set(&mut tracker, &id)?,
        Some(Commands::Unit { unit }) => cmd_unit(&mut tracker, &unit)?,
        Some(Commands::History) => print_history(&tracker),
        Some(Commands::Stats { metric }) => {
            print_stats(&tracker, resolve_metric(metric, default_metric)?)
        }
        Some(Commands::Chart { metric }) => {
            print_chart(&tracker, resolve_metric(metric, default_metric)?)
        }
        Some(Commands::Export { output, csv }) => cmd_export(&tracker, output, csv)?,
        Some(Commands::Import { file }) => cmd_import(&mut tracker, &file)?,
    }

    Ok(())
}

fn resolve_metric(arg: Option<String>, default: ComparisonMetric) -> Result<ComparisonMetric> {
    match arg {
        Some(text) => text.parse(),
        None => Ok(default),
    }
}

fn cmd_exercises<S: BlobStore, G: IdGenerator>(tracker: &Tracker<S, G>) {
    for name in tracker.exercise_names() {
        let marker = if name == tracker.active_exercise() { "*" } else { " " };
        println!("{} {}", marker, name);
    }
}

fn cmd_add_exercise<S: BlobStore, G: IdGenerator>(
    tracker: &mut Tracker<S, G>,
    name: &str,
) -> Result<()> {
    if name.trim().is_empty() {
        println!("Exercise name is blank - nothing to add.");
    } else if tracker.add_exercise(name)? {
        println!("✓ Added exercise \"{}\"", tracker.active_exercise());
    } else {
        println!("Exercise \"{}\" already exists.", tracker.active_exercise());
    }
    Ok(())
}

fn cmd_delete_exercise<S: BlobStore, G: IdGenerator>(
    tracker: &mut Tracker<S, G>,
    name: Option<String>,
    yes: bool,
) -> Result<()> {
    let name = name.unwrap_or_else(|| tracker.active_exercise().to_string());

    let outcome = if yes {
        tracker.delete_exercise(&name, &mut |_: &str| true)?
    } else {
        tracker.delete_exercise(&name, &mut prompt_confirm)?
    };

    match outcome {
        DeleteOutcome::Deleted => {
            println!("✓ Deleted exercise \"{}\"", name);
            println!("  Now showing: {}", tracker.active_exercise());
        }
        DeleteOutcome::Declined => println!("Cancelled."),
        DeleteOutcome::NotFound => {
            return Err(Error::Other(format!("Unknown exercise '{}'", name)))
        }
    }
    Ok(())
}

fn cmd_log<S: BlobStore, G: IdGenerator>(
    tracker: &mut Tracker<S, G>,
    weight: &str,
    reps: &str,
    date: Option<&str>,
) -> Result<()> {
    let entry = tracker.add_set_raw(weight, reps, date)?;
    let unit = tracker.unit();

    println!(
        "✓ Logged {} x {} for {} on {}",
        format_weight(entry.weight_in(unit), unit),
        entry.reps,
        tracker.active_exercise(),
        entry.date
    );
    println!("  id: {}", entry.id);
    Ok(())
}

fn cmd_delete_set<S: BlobStore, G: IdGenerator>(tracker: &mut Tracker<S, G>, id: &str) -> Result<()> {
    if tracker.delete_set(id)? {
        println!("✓ Deleted set {}", id);
    } else {
        println!("No set {} in {} - nothing deleted.", id, tracker.active_exercise());
    }
    Ok(())
}

fn cmd_unit<S: BlobStore, G: IdGenerator>(tracker: &mut Tracker<S, G>, unit: &str) -> Result<()> {
    let unit: Unit = unit.parse()?;
    if tracker.set_unit(unit)? {
        println!("✓ Display unit set to {}", unit);
    } else {
        println!("Display unit is already {}", unit);
    }
    Ok(())
}

fn cmd_export<S: BlobStore, G: IdGenerator>(
    tracker: &Tracker<S, G>,
    output: Option<PathBuf>,
    csv: bool,
) -> Result<()> {
    let contents = if csv {
        tracker.export_csv()?
    } else {
        tracker.export_data()?
    };

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(&path, &contents)?;
            println!("✓ Exported {} sets", tracker.log().entry_count());
            println!("  File: {}", path.display());
        }
        None => {
            print!("{}", contents);
            if !contents.ends_with('\n') {
                println!();
            }
        }
    }
    Ok(())
}

fn cmd_import<S: BlobStore, G: IdGenerator>(
    tracker: &mut Tracker<S, G>,
    file: &Path,
) -> Result<()> {
    let payload = std::fs::read_to_string(file)?;
    tracker.import_data(&payload)?;

    println!(
        "✓ Imported {} exercises ({} sets)",
        tracker.log().exercises.len(),
        tracker.log().entry_count()
    );
    Ok(())
}

fn print_stats<S: BlobStore, G: IdGenerator>(tracker: &Tracker<S, G>, metric: ComparisonMetric) {
    let unit = tracker.unit();
    println!("{} ({})", tracker.active_exercise(), metric.label());

    match tracker.summary(metric) {
        Some(summary) => {
            println!("  Baseline: {}", format_weight(summary.baseline, unit));
            println!("  Best:     {}", format_weight(summary.best, unit));
            println!("  Change:   {:.1}%", round1(summary.percent_change));
        }
        None => {
            println!("  Baseline: –");
            println!("  Best:     –");
            println!("  Change:   –");
        }
    }
}

fn print_history<S: BlobStore, G: IdGenerator>(tracker: &Tracker<S, G>) {
    let rows = tracker.history();
    if rows.is_empty() {
        println!("No sets logged for {}.", tracker.active_exercise());
        return;
    }

    let unit = tracker.unit();
    println!(
        "{:<10}  {:>10}  {:>4}  {:>10}  id",
        "date", "weight", "reps", "est. 1RM"
    );
    for row in rows {
        println!(
            "{:<10}  {:>10}  {:>4}  {:>10}  {}",
            row.date.to_string(),
            format_weight(row.weight, unit),
            row.reps,
            format_weight(row.one_rep_max, unit),
            row.id
        );
    }
}

fn print_chart<S: BlobStore, G: IdGenerator>(tracker: &Tracker<S, G>, metric: ComparisonMetric) {
    const BAR_WIDTH: f64 = 40.0;

    let points = tracker.series(metric);
    if points.is_empty() {
        println!("No sets logged for {}.", tracker.active_exercise());
        return;
    }

    let unit = tracker.unit();
    let max = points
        .iter()
        .map(|p| p.value)
        .fold(f64::NEG_INFINITY, f64::max);

    println!("{} - best {} per day", tracker.active_exercise(), metric.label());
    for point in points {
        let len = if max > 0.0 && point.value > 0.0 {
            ((point.value / max) * BAR_WIDTH).round() as usize
        } else {
            0
        };
        println!(
            "  {}  {:>10}  {}",
            point.date,
            format_weight(point.value, unit),
            "█".repeat(len)
        );
    }
}

fn prompt_confirm(prompt: &str) -> bool {
    print!("{} [y/N] ", prompt);
    if io::stdout().flush().is_err() {
        return false;
    }

    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return false;
    }

    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}
