//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time only moves through `GameSession::advance_to`
//! - Timers are `Scheduler` tasks, never wall-clock callbacks
//! - Stable iteration order (formation array order, then scheduling order)
//! - No rendering or platform dependencies

pub mod formation;
pub mod grid;
pub mod projectile;
pub mod schedule;
pub mod session;
pub mod shooter;
pub mod state;

pub use formation::{FormationController, Heading};
pub use grid::Grid;
pub use projectile::{FireRejection, Projectile, ProjectileController, ProjectileStep};
pub use schedule::{Scheduler, Task, TaskId};
pub use session::{FinalResult, GameSession, SubmitError};
pub use shooter::ShooterController;
pub use state::{CellState, GameEvent, Input, SessionState, Snapshot};
