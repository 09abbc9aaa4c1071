//! Score, difficulty, and high-score persistence.
//!
//! The score is forward progress: whole 100-pixel units the player has
//! travelled along +x from where the run started, never decreasing. The
//! difficulty multiplier grows with score and scales asteroid density. Both
//! freeze when the run ends.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::DriftError;

/// Pixels of forward progress per point.
pub const SCORE_UNIT_PX: f32 = 100.0;
/// Difficulty added per point.
pub const DIFFICULTY_PER_POINT: f32 = 0.02;
pub const MAX_DIFFICULTY: f32 = 4.0;

// ---------------------------------------------------------------------------
// High score stores
// ---------------------------------------------------------------------------

/// Persistent best score.
pub trait HighScoreStore {
    fn load(&mut self) -> Result<i64, DriftError>;
    fn save(&mut self, value: i64) -> Result<(), DriftError>;
}

/// Volatile store, for tests and sessions without a save path.
#[derive(Debug, Default)]
pub struct MemoryHighScore {
    value: i64,
    saves: u32,
}

impl MemoryHighScore {
    pub fn new(value: i64) -> Self {
        Self { value, saves: 0 }
    }

    pub fn saves(&self) -> u32 {
        self.saves
    }
}

impl HighScoreStore for MemoryHighScore {
    fn load(&mut self) -> Result<i64, DriftError> {
        Ok(self.value)
    }

    fn save(&mut self, value: i64) -> Result<(), DriftError> {
        self.value = value;
        self.saves += 1;
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct HighScoreFile {
    high_score: i64,
}

/// JSON file store: `{"high_score": 42}`. A missing file reads as zero.
#[derive(Debug, Clone)]
pub struct FileHighScore {
    path: PathBuf,
}

impl FileHighScore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HighScoreStore for FileHighScore {
    fn load(&mut self) -> Result<i64, DriftError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no high score file yet");
                return Ok(0);
            }
            Err(source) => {
                return Err(DriftError::Io {
                    action: "read high score",
                    path: self.path.clone(),
                    source,
                })
            }
        };
        let file: HighScoreFile = serde_json::from_str(&text).map_err(|source| DriftError::Parse {
            what: "high score",
            path: self.path.clone(),
            source,
        })?;
        Ok(file.high_score)
    }

    fn save(&mut self, value: i64) -> Result<(), DriftError> {
        let text = serde_json::to_string_pretty(&HighScoreFile { high_score: value })
            .map_err(|source| DriftError::Encode { what: "high score", source })?;
        std::fs::write(&self.path, text).map_err(|source| DriftError::Io {
            action: "write high score",
            path: self.path.clone(),
            source,
        })
    }
}

// ---------------------------------------------------------------------------
// ScoreKeeper
// ---------------------------------------------------------------------------

/// Per-run progress score and difficulty. A score that beats the high
/// score is persisted through the store when it is committed.
pub struct ScoreKeeper {
    score: i64,
    high_score: i64,
    origin_x: Option<f32>,
    difficulty: f32,
    game_over: bool,
    store: Box<dyn HighScoreStore>,
}

impl ScoreKeeper {
    /// Load the stored high score; a failing store starts from zero.
    pub fn new(mut store: Box<dyn HighScoreStore>) -> Self {
        let high_score = store.load().unwrap_or_else(|e| {
            warn!(error = %e, "could not load high score, starting from zero");
            0
        });
        Self {
            score: 0,
            high_score,
            origin_x: None,
            difficulty: 1.0,
            game_over: false,
            store,
        }
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn high_score(&self) -> i64 {
        self.high_score
    }

    pub fn difficulty(&self) -> f32 {
        self.difficulty
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Update score and difficulty from the player's x position. `None`
    /// (no player) leaves both unchanged, as does a finished run.
    pub fn recompute(&mut self, player_x: Option<f32>) {
        if self.game_over {
            return;
        }
        let Some(x) = player_x.filter(|x| x.is_finite()) else {
            return;
        };
        let origin = *self.origin_x.get_or_insert(x);
        let progress = ((x - origin) / SCORE_UNIT_PX).floor().max(0.0) as i64;
        self.score = self.score.max(progress);
        self.difficulty = (1.0 + self.score as f32 * DIFFICULTY_PER_POINT).min(MAX_DIFFICULTY);
    }

    /// End the run. Returns `false` if it had already ended.
    pub fn trigger_game_over(&mut self) -> bool {
        if self.game_over {
            return false;
        }
        self.game_over = true;
        info!(score = self.score, "game over");
        true
    }

    /// Persist the current score if it beats the high score.
    pub fn commit_high_score(&mut self) -> bool {
        if self.score <= self.high_score {
            return false;
        }
        self.high_score = self.score;
        if let Err(e) = self.store.save(self.high_score) {
            warn!(error = %e, "could not persist high score");
        }
        true
    }

    /// Start a new run; the high score is kept.
    pub fn reset(&mut self) {
        self.score = 0;
        self.origin_x = None;
        self.difficulty = 1.0;
        self.game_over = false;
    }
}

impl std::fmt::Debug for ScoreKeeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoreKeeper")
            .field("score", &self.score)
            .field("high_score", &self.high_score)
            .field("difficulty", &self.difficulty)
            .field("game_over", &self.game_over)
            .finish()
    }
}
