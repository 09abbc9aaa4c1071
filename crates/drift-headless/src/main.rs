//! Headless runner -- plays the game with scripted input and logs a summary.
//!
//! Run with:
//!   cargo run -p drift-headless -- [settings.json] [level.json] [manifest.json] [seconds]
//!
//! Every argument is optional. Paths default to the files under `assets/`;
//! the run lasts ten seconds of wall time. The script holds thrust, steers a
//! little up and down, and presses R to restart after each crash.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use drift_engine::prelude::*;
use tracing::info;

const DEFAULT_SETTINGS: &str = "assets/config.json";
const DEFAULT_LEVEL: &str = "assets/level.json";
const DEFAULT_MANIFEST: &str = "assets/manifest.json";
const DEFAULT_SECONDS: f64 = 10.0;

// ---------------------------------------------------------------------------
// Frame statistics
// ---------------------------------------------------------------------------

/// Render sink that only counts what it is asked to draw.
#[derive(Debug, Default)]
struct FrameStats {
    frames: u64,
    commands: u64,
    sprites: u64,
    rects: u64,
    last_hud: Option<(i64, i64, bool)>,
}

impl RenderSink for FrameStats {
    fn draw(&mut self, command: DrawCommand) {
        self.commands += 1;
        match command {
            DrawCommand::Sprite { .. } | DrawCommand::Tile { .. } => self.sprites += 1,
            DrawCommand::Rect { .. } => self.rects += 1,
            DrawCommand::Hud {
                score,
                high_score,
                game_over,
            } => self.last_hud = Some((score, high_score, game_over)),
        }
    }

    fn end_frame(&mut self) {
        self.frames += 1;
    }
}

// ---------------------------------------------------------------------------
// Scripted input
// ---------------------------------------------------------------------------

/// Thrust toward a pointer right of center that sweeps slowly up and down.
/// While the run is over, R toggles every frame so each press is fresh.
fn scripted_input(driver: &SimulationDriver, frame: u64) -> InputSnapshot {
    let screen = driver.view().screen;
    let sweep = (driver.sim_time() as f32 * 0.8).sin() * screen.y * 0.3;
    let mut snapshot = InputSnapshot::new()
        .with_button(MouseButton::Left)
        .at_pointer(Vec2::new(screen.x * 0.9, screen.y * 0.5 + sweep));
    if driver.score().is_game_over() && frame % 2 == 0 {
        snapshot = snapshot.with_key(Key::R);
    }
    snapshot
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let settings_path = PathBuf::from(args.next().unwrap_or_else(|| DEFAULT_SETTINGS.to_owned()));
    let level_path = PathBuf::from(args.next().unwrap_or_else(|| DEFAULT_LEVEL.to_owned()));
    let manifest_path = PathBuf::from(args.next().unwrap_or_else(|| DEFAULT_MANIFEST.to_owned()));
    let seconds = match args.next() {
        Some(raw) => raw
            .parse::<f64>()
            .with_context(|| format!("run length '{raw}' is not a number of seconds"))?,
        None => DEFAULT_SECONDS,
    };
    let run_length = Duration::try_from_secs_f64(seconds)
        .with_context(|| format!("run length {seconds} is not a usable duration"))?;

    let settings = Settings::load_or_default(&settings_path);
    let level = Level::load(&level_path).context("level is required")?;
    let manifest = AssetManifest::load(&manifest_path).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "no asset manifest, sprites fall back to flat colors");
        AssetManifest::default()
    });

    let high_scores: Box<dyn HighScoreStore> = match &settings.high_score_path {
        Some(path) => Box::new(FileHighScore::new(path)),
        None => Box::new(MemoryHighScore::default()),
    };
    let collaborators = Collaborators {
        audio: Box::new(LoggingAudio::new(manifest.sounds.clone())),
        assets: Box::new(manifest),
        high_scores,
    };

    let mut driver = SimulationDriver::new(&settings, Box::new(RapierWorld::new_zero_gravity()), collaborators);
    driver.load_level(level);
    info!(
        level = %level_path.display(),
        entities = driver.lifecycle().len(),
        seconds,
        "headless run starting"
    );

    let mut stats = FrameStats::default();
    let mut frame = 0u64;
    let ticks = driver.run_for(run_length, &mut stats, |driver| {
        let snapshot = scripted_input(driver, frame);
        driver.set_input(snapshot);
        frame += 1;
    });

    let (score, high_score, game_over) = stats.last_hud.unwrap_or_default();
    info!(
        ticks,
        sim_time = driver.sim_time(),
        frames = stats.frames,
        draw_commands = stats.commands,
        sprites = stats.sprites,
        rects = stats.rects,
        entities = driver.lifecycle().len(),
        particles = driver.particles().len(),
        particles_dropped = driver.particles().dropped(),
        collisions = driver.translator().reactions(),
        score,
        high_score,
        game_over,
        "headless run finished"
    );
    Ok(())
}
