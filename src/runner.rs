//! Fixed-timestep driver and match thread lifecycle
//!
//! `FixedStep` turns real frame time into whole 60 Hz ticks. `MatchLoop`
//! adds event delivery (audio cues, profile updates) on top. `MatchHandle`
//! runs a `MatchLoop` on its own thread, and `Session` guarantees that at
//! most one of those threads is alive.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::audio::{AudioBackend, AudioManager};
use crate::consts::*;
use crate::error::StartError;
use crate::profile::ProfileStore;
use crate::settings::Settings;
use crate::sim::events::{GameEvent, MatchOutcome};
use crate::sim::snapshot::Snapshot;
use crate::sim::state::GameState;
use crate::sim::tick::{TickInput, tick};
use crate::tuning::Tuning;

/// Sleep between frames of the match thread
const FRAME_SLEEP: Duration = Duration::from_millis(4);

/// Real time to simulation ticks
#[derive(Debug, Default)]
pub struct FixedStep {
    accumulator: f32,
    input: TickInput,
}

impl FixedStep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held input. One-shot presses not yet consumed are kept.
    pub fn set_input(&mut self, input: TickInput) {
        let pause = self.input.pause || input.pause;
        let confirm = self.input.confirm || input.confirm;
        self.input = TickInput {
            pause,
            confirm,
            ..input
        };
    }

    /// Run as many whole ticks as `dt` covers; returns how many ran
    pub fn advance(&mut self, state: &mut GameState, dt: f32) -> u32 {
        self.accumulator += dt.clamp(0.0, MAX_FRAME_DT);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(state, &self.input);
            self.accumulator -= SIM_DT;
            substeps += 1;

            // Clear one-shot inputs after processing
            self.input.pause = false;
            self.input.confirm = false;
        }
        substeps
    }
}

/// One match plus the collaborators its events go to
pub struct MatchLoop {
    pub state: GameState,
    step: FixedStep,
    audio: AudioManager,
    profiles: ProfileStore,
    player_name: String,
    player_avatar: String,
}

impl MatchLoop {
    pub fn new(
        state: GameState,
        audio: AudioManager,
        profiles: ProfileStore,
        settings: &Settings,
    ) -> Self {
        Self {
            state,
            step: FixedStep::new(),
            audio,
            profiles,
            player_name: settings.player_name.clone(),
            player_avatar: settings.player_avatar.clone(),
        }
    }

    pub fn profiles(&self) -> &ProfileStore {
        &self.profiles
    }

    /// Simulate one frame and deliver everything it emitted
    pub fn frame(&mut self, dt: f32, input: TickInput) -> u32 {
        self.step.set_input(input);
        let ticks = self.step.advance(&mut self.state, dt);
        for event in self.state.drain_events() {
            self.deliver(event);
        }
        ticks
    }

    fn deliver(&mut self, event: GameEvent) {
        match event {
            GameEvent::Sound(cue) => self.audio.play(cue),
            GameEvent::MatchFinished {
                outcome,
                score,
                exp,
            } => {
                self.audio.stop_loops();
                if let Err(e) = self.profiles.record_match(
                    &self.player_name,
                    &self.player_avatar,
                    outcome,
                    score,
                    exp,
                ) {
                    log::error!("Failed to record match result: {}", e);
                }
            }
            other => log::trace!("{:?}", other),
        }
    }
}

/// A match running on its own thread
pub struct MatchHandle {
    stop: Arc<AtomicBool>,
    input: Arc<Mutex<TickInput>>,
    /// Newest frame not yet read; each frame overwrites the last
    latest: Arc<Mutex<Option<Snapshot>>>,
    thread: Option<JoinHandle<Option<MatchOutcome>>>,
}

impl MatchHandle {
    /// Start the loop thread. `live` counts running loop threads.
    pub fn spawn(match_loop: MatchLoop, live: Arc<AtomicUsize>) -> std::io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let input = Arc::new(Mutex::new(TickInput::default()));
        let latest = Arc::new(Mutex::new(None));

        live.fetch_add(1, Ordering::SeqCst);
        let thread = {
            let stop = stop.clone();
            let input = input.clone();
            let latest = latest.clone();
            let live = live.clone();
            thread::Builder::new()
                .name("match-loop".to_string())
                .spawn(move || {
                    let outcome = run_loop(match_loop, &stop, &input, &latest);
                    live.fetch_sub(1, Ordering::SeqCst);
                    outcome
                })
        };
        let thread = match thread {
            Ok(thread) => thread,
            Err(e) => {
                live.fetch_sub(1, Ordering::SeqCst);
                return Err(e);
            }
        };

        Ok(Self {
            stop,
            input,
            latest,
            thread: Some(thread),
        })
    }

    /// Publish the input the loop should use from its next frame on
    pub fn send_input(&self, input: TickInput) {
        let mut slot = self.input.lock().unwrap_or_else(|p| p.into_inner());
        let pause = slot.pause || input.pause;
        let confirm = slot.confirm || input.confirm;
        *slot = TickInput {
            pause,
            confirm,
            ..input
        };
    }

    /// Most recent snapshot published since the last call
    pub fn latest_snapshot(&self) -> Option<Snapshot> {
        self.latest
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .take()
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Signal the loop and wait for it. Returns the outcome if the match ended.
    pub fn stop(&mut self) -> Option<MatchOutcome> {
        self.stop.store(true, Ordering::SeqCst);
        let thread = self.thread.take()?;
        match thread.join() {
            Ok(outcome) => outcome,
            Err(_) => {
                log::error!("Match thread panicked");
                None
            }
        }
    }
}

impl Drop for MatchHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop(
    mut match_loop: MatchLoop,
    stop: &AtomicBool,
    input: &Mutex<TickInput>,
    latest: &Mutex<Option<Snapshot>>,
) -> Option<MatchOutcome> {
    log::info!("Match loop started (seed {})", match_loop.state.seed);
    let mut last = Instant::now();
    while !stop.load(Ordering::SeqCst) {
        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32();
        last = now;

        let frame_input = {
            let mut slot = input.lock().unwrap_or_else(|p| p.into_inner());
            let taken = *slot;
            slot.pause = false;
            slot.confirm = false;
            taken
        };
        match_loop.frame(dt, frame_input);

        let snapshot = Snapshot::capture(&match_loop.state);
        *latest.lock().unwrap_or_else(|p| p.into_inner()) = Some(snapshot);
        if let Some(outcome) = match_loop.state.outcome() {
            log::info!("Match loop finished: {:?}", outcome);
            return Some(outcome);
        }
        thread::sleep(FRAME_SLEEP);
    }
    log::info!("Match loop stopped");
    None
}

/// Owns the settings and at most one running match
pub struct Session {
    settings: Settings,
    tuning: Tuning,
    live: Arc<AtomicUsize>,
    current: Option<MatchHandle>,
}

impl Session {
    pub fn new(settings: Settings) -> Self {
        let tuning = settings
            .tuning_path
            .as_deref()
            .map(Tuning::load_or_default)
            .unwrap_or_default();
        Self {
            settings,
            tuning,
            live: Arc::new(AtomicUsize::new(0)),
            current: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Number of match threads currently alive
    pub fn active_loops(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn current(&self) -> Option<&MatchHandle> {
        self.current.as_ref()
    }

    /// Stop any running match, then start a new one
    pub fn start_match(
        &mut self,
        backend: Box<dyn AudioBackend>,
    ) -> Result<&MatchHandle, StartError> {
        self.stop_match();

        let profiles = ProfileStore::load(&self.settings.profile_path)?;
        let state = GameState::new(
            self.settings.resolve_seed(),
            self.tuning.clone(),
            self.settings.map_path.as_deref(),
        )?;
        let audio = AudioManager::from_settings(&self.settings, backend);
        let match_loop = MatchLoop::new(state, audio, profiles, &self.settings);
        let handle = MatchHandle::spawn(match_loop, self.live.clone())?;
        Ok(self.current.insert(handle))
    }

    pub fn stop_match(&mut self) -> Option<MatchOutcome> {
        self.current.take().and_then(|mut handle| handle.stop())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::LogBackend;
    use std::path::PathBuf;

    fn temp_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "bomb_arena_runner_{}_{}.txt",
            tag,
            std::process::id()
        ))
    }

    fn test_settings(tag: &str) -> Settings {
        Settings {
            profile_path: temp_path(tag),
            map_path: None,
            seed: Some(17),
            muted: true,
            ..Default::default()
        }
    }

    fn new_state() -> GameState {
        GameState::new(17, Tuning::default(), None).unwrap()
    }

    #[test]
    fn test_fixed_step_runs_whole_ticks() {
        let mut state = new_state();
        let mut step = FixedStep::new();
        assert_eq!(step.advance(&mut state, SIM_DT * 3.0 + 0.001), 3);
        assert_eq!(state.time_ticks, 3);
        assert_eq!(step.advance(&mut state, 0.001), 0);
    }

    #[test]
    fn test_fixed_step_clamps_long_frames() {
        let mut state = new_state();
        let mut step = FixedStep::new();
        let ran = step.advance(&mut state, 5.0);
        assert!((MAX_SUBSTEPS - 1..=MAX_SUBSTEPS).contains(&ran));
        let ran = step.advance(&mut state, 5.0);
        assert!((MAX_SUBSTEPS - 1..=MAX_SUBSTEPS).contains(&ran));
        assert!(state.time_ticks <= 2 * u64::from(MAX_SUBSTEPS));
    }

    #[test]
    fn test_pause_press_applies_once() {
        let mut state = new_state();
        let mut step = FixedStep::new();
        step.set_input(TickInput {
            pause: true,
            ..Default::default()
        });
        step.set_input(TickInput::default());
        step.advance(&mut state, SIM_DT * 4.0 + 0.001);
        assert!(state.is_paused());
    }

    #[test]
    fn test_finished_match_updates_profile() {
        let settings = test_settings("loop");
        let _ = std::fs::remove_file(&settings.profile_path);
        let profiles = ProfileStore::load(&settings.profile_path).unwrap();
        let mut state = new_state();
        state.avatar.lives = 1;
        state.avatar.strike(&mut Vec::new());
        let audio = AudioManager::from_settings(&settings, Box::new(LogBackend));
        let mut match_loop = MatchLoop::new(state, audio, profiles, &settings);

        for _ in 0..100 {
            match_loop.frame(MAX_FRAME_DT, TickInput::default());
        }
        assert_eq!(match_loop.state.outcome(), Some(MatchOutcome::Lost));
        let profile = match_loop.profiles().get("player").cloned();
        let reloaded = ProfileStore::load(&settings.profile_path).unwrap();
        let _ = std::fs::remove_file(&settings.profile_path);
        assert_eq!(profile.as_ref().map(|p| (p.played, p.lost)), Some((1, 1)));
        assert_eq!(reloaded.get("player").cloned(), profile);
    }

    #[test]
    fn test_start_stops_previous_loop() {
        let settings = test_settings("session");
        let mut session = Session::new(settings);
        session.start_match(Box::new(LogBackend)).unwrap();
        assert_eq!(session.active_loops(), 1);
        session.start_match(Box::new(LogBackend)).unwrap();
        assert_eq!(session.active_loops(), 1);
        assert!(session.current().is_some_and(MatchHandle::is_running));

        assert_eq!(session.stop_match(), None);
        assert_eq!(session.active_loops(), 0);
        assert!(session.current().is_none());
        let _ = std::fs::remove_file(&session.settings().profile_path);
    }

    #[test]
    fn test_handle_publishes_snapshots() {
        let settings = test_settings("snapshots");
        let mut session = Session::new(settings);
        let handle = session.start_match(Box::new(LogBackend)).unwrap();
        handle.send_input(TickInput {
            right: true,
            ..Default::default()
        });
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut seen = None;
        while Instant::now() < deadline {
            if let Some(snapshot) = handle.latest_snapshot()
                && snapshot.tick > 0
            {
                seen = Some(snapshot);
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        session.stop_match();
        assert!(seen.is_some_and(|s| s.hud.level == 1));
    }

    #[test]
    fn test_slow_reader_sees_final_frame() {
        let settings = test_settings("slow_reader");
        let _ = std::fs::remove_file(&settings.profile_path);
        let profiles = ProfileStore::load(&settings.profile_path).unwrap();
        let mut state = new_state();
        state.avatar.lives = 1;
        state.avatar.strike(&mut Vec::new());
        let audio = AudioManager::from_settings(&settings, Box::new(LogBackend));
        let match_loop = MatchLoop::new(state, audio, profiles, &settings);
        let live = Arc::new(AtomicUsize::new(0));
        let mut handle = MatchHandle::spawn(match_loop, live.clone()).unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        while handle.is_running() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(50));
        }
        let last = handle.latest_snapshot();
        assert_eq!(handle.stop(), Some(MatchOutcome::Lost));
        let _ = std::fs::remove_file(&settings.profile_path);

        let last = last.unwrap();
        assert_eq!(last.outcome, Some(MatchOutcome::Lost));
        assert_eq!(last.hud.lives, 0);
        assert!(handle.latest_snapshot().is_none());
        assert_eq!(live.load(Ordering::SeqCst), 0);
    }
}
