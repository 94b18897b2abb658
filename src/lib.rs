//! Grid Invaders - A grid-based arcade shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (formation, shooter, projectile, session)
//! - `highscores`: Score store boundary (validation, listing, submission)
//! - `hud`: Cosmetic front-end state (hit flashes, reload bar)
//! - `platform`: Browser/native platform abstraction
//! - `settings`: Data-driven timing and layout configuration

pub mod highscores;
pub mod hud;
pub mod platform;
pub mod settings;
pub mod sim;

pub use highscores::{MemoryScoreStore, ScoreRecord, ScoreStore, ScoreStoreError};
pub use settings::{Settings, SettingsError};
pub use sim::{GameSession, Input, SessionState};

/// Game configuration constants
pub mod consts {
    /// Grid width in cells (the grid is square)
    pub const GRID_WIDTH: usize = 15;

    /// Formation layout: rows and columns of the starting block
    pub const FORMATION_ROWS: usize = 3;
    pub const FORMATION_COLS: usize = 10;

    /// Shooter start cell (row 13, col 7 on a 15-wide grid)
    pub const SHOOTER_START: usize = 202;

    /// Formation advance period (ms)
    pub const FORMATION_TICK_MS: u64 = 600;
    /// Projectile advance period (ms)
    pub const PROJECTILE_TICK_MS: u64 = 100;
    /// Fire cooldown (ms) - the only thing gating the next shot
    pub const COOLDOWN_MS: u64 = 500;
    /// Reload bar refresh period (ms), cosmetic
    pub const RELOAD_PROGRESS_MS: u64 = 50;
    /// Elapsed-time HUD refresh period (ms), cosmetic
    pub const CLOCK_REFRESH_MS: u64 = 40;
    /// How long a destroyed enemy's cell flashes (ms), cosmetic
    pub const HIT_FLASH_MS: u64 = 300;

    /// Maximum stored player name length (chars)
    pub const MAX_NAME_LEN: usize = 20;
    /// Number of records returned by a score listing
    pub const MAX_LISTED_SCORES: usize = 100;
}

/// Format elapsed milliseconds the way the HUD shows them ("12.3s")
#[inline]
pub fn format_elapsed(elapsed_ms: u64) -> String {
    format!("{:.1}s", elapsed_ms as f64 / 1000.0)
}
