use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::io::{self, Write};
use std::path::PathBuf;
use tabled::{Table, Tabled};

use trailog::config::parse_pair;
use trailog::logging::init_logging;
use trailog::render::{format_list_item, ConsoleMap, TerminalList};
use trailog::{
    AppConfig, Coords, FixedPosition, JsonFileStorage, ListRenderer, LogLevel, SortDirection, SortKey,
    Tracker, TrailogError, WorkoutForm, WorkoutRecord,
};

type CliTracker = Tracker<JsonFileStorage, ConsoleMap<Box<dyn Write>>, TerminalList<Box<dyn Write>>>;

/// Trailog - running and cycling log pinned to a map
///
/// Workouts are logged at a position, get pace (running) or speed (cycling)
/// computed once, and are mirrored to a JSON file.
#[derive(Parser)]
#[command(name = "trailog")]
#[command(author = "Trailog Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Map-based workout log", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Overrides the workout data file
    #[arg(short, long, value_name = "FILE")]
    data_file: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a running or cycling workout
    Add {
        /// Workout type (running, cycling)
        #[arg(short = 't', long = "type", default_value = "running")]
        workout_type: String,

        /// Distance in km
        #[arg(long)]
        distance: f64,

        /// Duration in minutes
        #[arg(long)]
        duration: f64,

        /// Cadence in steps/min (running)
        #[arg(long)]
        cadence: Option<f64>,

        /// Elevation gain in meters (cycling)
        #[arg(long, allow_hyphen_values = true)]
        elevation: Option<f64>,

        /// Position as "lat,lng" (defaults to the configured home)
        #[arg(long, allow_hyphen_values = true)]
        at: Option<String>,
    },

    /// List logged workouts
    List {
        /// Sort by distance or date
        #[arg(short, long)]
        sort: Option<SortKey>,

        /// Sort direction (asc, desc)
        #[arg(short, long, default_value = "asc")]
        order: SortDirection,

        /// Show a compact table instead of cards
        #[arg(long)]
        table: bool,
    },

    /// Center the map on a workout
    Show {
        /// Workout id
        id: String,
    },

    /// Change a workout; omitted values keep their current value
    Edit {
        /// Workout id
        id: String,

        /// Workout type (running, cycling)
        #[arg(short = 't', long = "type")]
        workout_type: Option<String>,

        #[arg(long)]
        distance: Option<f64>,

        #[arg(long)]
        duration: Option<f64>,

        #[arg(long)]
        cadence: Option<f64>,

        #[arg(long, allow_hyphen_values = true)]
        elevation: Option<f64>,
    },

    /// Delete a workout
    Delete {
        /// Workout id
        id: String,
    },

    /// Fit the map around all workouts
    Overview,

    /// Delete every workout
    Reset {
        /// Confirm deleting every workout
        #[arg(long)]
        yes: bool,
    },

    /// Configure application settings
    Config {
        /// List all configuration options
        #[arg(short, long)]
        list: bool,

        /// Set a configuration value (key=value)
        #[arg(short, long)]
        set: Option<String>,

        /// Get a configuration value
        #[arg(short, long)]
        get: Option<String>,
    },
}

#[derive(Tabled)]
struct WorkoutRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Workout")]
    description: String,
    #[tabled(rename = "km")]
    distance: String,
    #[tabled(rename = "min")]
    duration: String,
    #[tabled(rename = "Pace/Speed")]
    rate: String,
}

impl From<&WorkoutRecord> for WorkoutRow {
    fn from(record: &WorkoutRecord) -> Self {
        let rate = match (record.pace(), record.speed()) {
            (Some(pace), _) => format!("{:.1} min/km", pace),
            (_, Some(speed)) => format!("{:.1} km/h", speed),
            _ => "-".to_string(),
        };
        Self {
            id: record.id().to_string(),
            description: record.description().to_string(),
            distance: record.distance().to_string(),
            duration: record.duration().to_string(),
            rate,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::default_config_path);
    let mut config = AppConfig::load_or_default(&config_path);
    if let Some(data_file) = &cli.data_file {
        config.data_file = data_file.clone();
    }

    let mut log_config = config.logging.clone();
    log_config.level = LogLevel::from_verbosity(log_config.level, cli.verbose);
    init_logging(&log_config)?;

    match cli.command {
        Commands::Add {
            workout_type,
            distance,
            duration,
            cadence,
            elevation,
            at,
        } => {
            let mut tracker = open_tracker(&config, false);
            let coords = match at {
                Some(at) => {
                    let [lat, lng] = parse_pair(&at)?;
                    Coords::new(lat, lng)
                }
                None => config
                    .map
                    .home
                    .ok_or_else(|| user_error(TrailogError::GeolocationUnavailable(
                        "pass --at or set map.home".to_string(),
                    )))?,
            };

            let form = WorkoutForm {
                workout_type,
                distance,
                duration,
                cadence,
                elevation,
            };
            let record = tracker.log_workout(&form, coords).map_err(user_error)?;

            println!("{}", "✓ Workout logged".green().bold());
            println!("{}", format_list_item(&record));
        }

        Commands::List { sort, order, table } => {
            let mut tracker = open_tracker(&config, false);
            if let Some(key) = sort {
                tracker.sort(key, order);
            }

            if tracker.workouts().is_empty() {
                println!("{}", "No workouts logged yet".dimmed());
            } else if table {
                let rows: Vec<WorkoutRow> = tracker.workouts().iter().map(WorkoutRow::from).collect();
                println!("{}", Table::new(rows));
            } else {
                let mut cards = TerminalList::new(io::stdout());
                for record in tracker.workouts() {
                    cards.render_list_item(record);
                }
            }
        }

        Commands::Show { id } => {
            let mut tracker = open_tracker(&config, true);
            tracker.move_to(&id).map_err(user_error)?;
        }

        Commands::Edit {
            id,
            workout_type,
            distance,
            duration,
            cadence,
            elevation,
        } => {
            let mut tracker = open_tracker(&config, false);
            let current = tracker
                .store()
                .find_by_id(&id)
                .ok_or_else(|| user_error(TrailogError::NotFound { id: id.clone() }))?;

            let mut form = WorkoutForm::from_record(current);
            if let Some(workout_type) = workout_type {
                form.workout_type = workout_type;
            }
            form.distance = distance.unwrap_or(form.distance);
            form.duration = duration.unwrap_or(form.duration);
            form.cadence = cadence.or(form.cadence);
            form.elevation = elevation.or(form.elevation);

            let record = tracker.edit_workout(&id, &form).map_err(user_error)?;
            println!("{}", "✓ Workout updated".green().bold());
            println!("{}", format_list_item(&record));
        }

        Commands::Delete { id } => {
            let mut tracker = open_tracker(&config, false);
            let removed = tracker.delete_workout(&id).map_err(user_error)?;
            println!("{} {}", "✓ Deleted".green().bold(), removed.description());
        }

        Commands::Overview => {
            let mut tracker = open_tracker(&config, true);
            if tracker.workouts().is_empty() {
                println!("{}", "No workouts logged yet".dimmed());
            }
            tracker.overview();
        }

        Commands::Reset { yes } => {
            if !yes {
                println!("{}", "Pass --yes to delete every workout".yellow());
                return Ok(());
            }
            let mut tracker = open_tracker(&config, false);
            let removed = tracker.reset();
            println!("{} {} workouts", "✓ Removed".green().bold(), removed.len());
        }

        Commands::Config { list, set, get } => {
            if list {
                println!("{}", format!("Configuration ({})", config_path.display()).bold());
                for key in AppConfig::KEYS {
                    println!("  {} = {}", key, config.get(key).unwrap_or_default());
                }
            } else if let Some(key_value) = set {
                let (key, value) = key_value
                    .split_once('=')
                    .context("Expected key=value")?;
                config.set(key.trim(), value.trim())?;
                config.save_to_file(&config_path)?;
                println!("{} {} = {}", "✓ Set".green(), key.trim(), value.trim());
            } else if let Some(key) = get {
                match config.get(&key) {
                    Some(value) => println!("{}", value),
                    None => anyhow::bail!("Unknown configuration key: {}", key),
                }
            }
        }
    }

    Ok(())
}

/// Open the tracker on the configured data file. The map only prints when
/// `show_map` is set; otherwise markers are still tracked but not echoed.
fn open_tracker(config: &AppConfig, show_map: bool) -> CliTracker {
    let list_out: Box<dyn Write> = Box::new(io::sink());
    let map_out: Box<dyn Write> = if show_map {
        Box::new(io::stdout())
    } else {
        Box::new(io::sink())
    };

    let mut tracker = Tracker::new(
        JsonFileStorage::new(&config.data_file),
        TerminalList::new(list_out),
        config.map.clone(),
    );

    let mut geolocation = FixedPosition(config.map.home);
    if let Err(e) = tracker.start(&mut geolocation, ConsoleMap::new(map_out)) {
        if show_map {
            eprintln!("{}", e.user_message().yellow());
        }
    }
    tracker
}

fn user_error(e: TrailogError) -> anyhow::Error {
    let message = e.user_message();
    if e.severity().to_tracing_level() == tracing::Level::ERROR {
        tracing::error!(error = %e, "Operation failed");
    } else {
        tracing::warn!(error = %e, "Operation rejected");
    }
    anyhow::Error::new(e).context(message)
}
