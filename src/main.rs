use std::path::PathBuf;

use apexview::errors::ApexviewError;
use apexview::f1data::{RaceEvent, SessionSource, SessionType};
use apexview::ui::ApexviewApp;
use clap::{Parser, Subcommand};
use egui::Vec2;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    /// Directory for the local telemetry cache; defaults to the platform
    /// cache directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open the session picker form (the default)
    Launch,
    /// Print the calendar of a year and exit
    Schedule {
        #[arg(short, long)]
        year: i32,
    },
    /// Skip the form and replay a session directly
    Replay {
        #[arg(short, long)]
        year: i32,

        /// Round number, or any part of the event name, e.g. "Brazil"
        #[arg(short, long)]
        race: String,

        /// Session type: R, Q, SQ or FP1
        #[arg(short, long, default_value = "R")]
        session: String,

        /// Comma-separated driver codes, e.g. VER,HAM,LEC
        #[arg(short, long)]
        drivers: String,
    },
}

fn window_options() -> eframe::NativeOptions {
    let mut native_options = eframe::NativeOptions::default();
    native_options.viewport = native_options.viewport.with_inner_size(Vec2::new(900., 700.));
    native_options
}

fn launch(cache_dir: Option<PathBuf>) -> Result<(), ApexviewError> {
    let source = SessionSource::new(cache_dir)?;
    eframe::run_native(
        "Apexview",
        window_options(),
        Box::new(|cc| Ok(Box::new(ApexviewApp::launcher(source, cc)))),
    )
    .expect("could not start app");
    Ok(())
}

fn schedule(cache_dir: Option<PathBuf>, year: i32) -> Result<(), ApexviewError> {
    let source = SessionSource::new(cache_dir)?;
    for event in source.schedule(year)? {
        println!("{} ({})", event, event.circuit);
    }
    Ok(())
}

fn replay(
    cache_dir: Option<PathBuf>,
    year: i32,
    race: &str,
    session: &str,
    drivers: &str,
) -> Result<(), ApexviewError> {
    let session_type: SessionType = session.parse()?;
    let codes: Vec<String> = drivers
        .split(',')
        .map(|code| code.trim().to_uppercase())
        .filter(|code| !code.is_empty())
        .collect();

    let source = SessionSource::new(cache_dir)?;
    let events = source.schedule(year)?;
    let event = find_event(&events, race).ok_or_else(|| ApexviewError::UnknownEvent {
        year,
        name: race.to_string(),
    })?;

    println!(
        "Loading {} {} {} for {}...",
        year,
        event.name,
        session_type,
        codes.join(", ")
    );
    let loaded = source.load_session(year, &event, session_type, &codes)?;

    eframe::run_native(
        "Apexview",
        window_options(),
        Box::new(move |cc| Ok(Box::new(ApexviewApp::replay(source, loaded, cc)?))),
    )
    .expect("could not start app");
    Ok(())
}

/// Match a round number or a case-insensitive fragment of the event or
/// circuit name.
fn find_event(events: &[RaceEvent], needle: &str) -> Option<RaceEvent> {
    if let Ok(round) = needle.trim().parse::<u32>() {
        return events.iter().find(|e| e.round == round).cloned();
    }
    let needle = needle.to_lowercase();
    events
        .iter()
        .find(|e| {
            e.name.to_lowercase().contains(&needle) || e.circuit.to_lowercase().contains(&needle)
        })
        .cloned()
}

fn main() {
    colog::init();

    let cli = Args::parse();
    ctrlc::set_handler(move || {
        println!("Exiting...");
        std::process::exit(0);
    })
    .expect("Could not set Ctrl-C handler");

    match cli.command.unwrap_or(Commands::Launch) {
        Commands::Launch => launch(cli.cache_dir).expect("Error while running the launcher"),
        Commands::Schedule { year } => {
            schedule(cli.cache_dir, year).expect("Error while fetching the schedule")
        }
        Commands::Replay {
            year,
            race,
            session,
            drivers,
        } => replay(cli.cache_dir, year, &race, &session, &drivers)
            .expect("Error while loading the replay"),
    };
}
