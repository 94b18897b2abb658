//! Session-level types shared with renderers and front-ends

use serde::{Deserialize, Serialize};

/// Lifecycle of one play-through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionState {
    /// Waiting for a start command
    #[default]
    Idle,
    /// Timers running, input honoured
    Active,
    /// Every member destroyed
    Won,
    /// Formation reached the shooter
    Lost,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Won | SessionState::Lost)
    }
}

/// Discrete player input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Input {
    Left,
    Right,
    Fire,
}

/// Observation hooks emitted by the session, drained by the front-end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    Started,
    FormationMoved { bounced: bool },
    ShooterMoved { index: usize },
    ProjectileMoved { index: usize },
    ProjectileDespawned,
    EnemyDestroyed { index: usize, member: usize, score: u32 },
    /// Reload bar fill in [0, 1]
    ReloadProgress { ratio: f32 },
    Reloaded,
    ElapsedTime { elapsed_ms: u64 },
    GameOver {
        outcome: SessionState,
        score: u32,
        elapsed_ms: u64,
    },
}

/// What a renderer should draw in one cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CellState {
    #[default]
    Empty,
    Enemy,
    Shooter,
    Projectile,
}

impl CellState {
    /// CSS class used by the web front-end
    pub fn css_class(&self) -> Option<&'static str> {
        match self {
            CellState::Empty => None,
            CellState::Enemy => Some("invader"),
            CellState::Shooter => Some("shooter"),
            CellState::Projectile => Some("laser"),
        }
    }
}

/// Declarative picture of the whole board plus HUD values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub state: SessionState,
    pub width: usize,
    /// Row-major, `width * width` long
    pub cells: Vec<CellState>,
    pub score: u32,
    pub elapsed_ms: u64,
    pub reload: f32,
}

impl Snapshot {
    pub fn cell(&self, index: usize) -> CellState {
        self.cells.get(index).copied().unwrap_or_default()
    }

    /// Number of cells in the given state
    pub fn count(&self, state: CellState) -> usize {
        self.cells.iter().filter(|&&c| c == state).count()
    }
}
