//! Headless runner
//!
//! Starts a match on its own thread, drives it with a scripted input pattern
//! for a few seconds and prints the final snapshot as JSON.

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use bomb_arena::Settings;
use bomb_arena::audio::LogBackend;
use bomb_arena::runner::Session;
use bomb_arena::sim::TickInput;

const DEMO_SECONDS: u64 = 10;

/// Walk a small square and drop a bomb at each corner
fn scripted_input(elapsed: Duration) -> TickInput {
    let phase = (elapsed.as_millis() / 500) % 8;
    TickInput {
        right: phase == 0,
        down: phase == 2,
        left: phase == 4,
        up: phase == 6,
        place_bomb: phase % 2 == 1,
        ..Default::default()
    }
}

fn main() {
    env_logger::init();
    log::info!("Bomb Arena (headless) starting...");

    let settings_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("settings.json"));
    let settings = Settings::load_or_default(&settings_path);

    let mut session = Session::new(settings);
    let handle = match session.start_match(Box::new(LogBackend)) {
        Ok(handle) => handle,
        Err(e) => {
            log::error!("Could not start match: {}", e);
            std::process::exit(1);
        }
    };

    let start = Instant::now();
    let mut last = None;
    while start.elapsed() < Duration::from_secs(DEMO_SECONDS) && handle.is_running() {
        handle.send_input(scripted_input(start.elapsed()));
        if let Some(snapshot) = handle.latest_snapshot() {
            last = Some(snapshot);
        }
        thread::sleep(Duration::from_millis(50));
    }
    if let Some(snapshot) = handle.latest_snapshot() {
        last = Some(snapshot);
    }

    let outcome = session.stop_match();
    log::info!("Demo finished, outcome {:?}", outcome);

    match last.map(|s| s.to_json()) {
        Some(Ok(json)) => println!("{}", json),
        Some(Err(e)) => log::error!("Could not serialize snapshot: {}", e),
        None => log::warn!("No snapshot received"),
    }
}
