//! Projectile lifecycle and the fire-rate gate
//!
//! The controller holds state only. The session owns the timers: it starts
//! the advance loop, the cooldown release and the reload bar when
//! [`ProjectileController::fire`] accepts a shot.

use serde::{Deserialize, Serialize};

use super::formation::FormationController;
use super::grid::Grid;

/// The single in-flight projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projectile {
    /// Current cell
    pub index: usize,
    /// Rows travelled since launch
    pub steps: u32,
}

/// Why a fire request was turned down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireRejection {
    CoolingDown,
    InFlight,
    OffGrid,
}

/// Outcome of one projectile tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectileStep {
    /// Nothing in flight
    Idle,
    /// Moved up and still flying
    Flying { index: usize },
    /// Left the top of the grid
    Despawned,
    /// Struck the live member at array position `member`
    Hit { index: usize, member: usize },
}

impl ProjectileStep {
    /// Whether the advance loop should stop after this step
    pub fn ends_flight(&self) -> bool {
        !matches!(self, ProjectileStep::Flying { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectileController {
    grid: Grid,
    projectile: Option<Projectile>,
    cooling_down: bool,
    reload_step: u64,
    reload_steps: u64,
}

impl ProjectileController {
    pub fn new(grid: Grid, reload_steps: u64) -> Self {
        Self {
            grid,
            projectile: None,
            cooling_down: false,
            reload_step: 0,
            reload_steps: reload_steps.max(1),
        }
    }

    /// No projectile, gate open
    pub fn reset(&mut self) {
        self.projectile = None;
        self.cooling_down = false;
        self.reload_step = 0;
    }

    pub fn projectile(&self) -> Option<Projectile> {
        self.projectile
    }

    pub fn is_cooling_down(&self) -> bool {
        self.cooling_down
    }

    /// Launch a projectile from `origin`.
    ///
    /// Rejected while the gate is closed, while a projectile is still in
    /// flight, or when `origin` is off-grid. A rejected request changes
    /// nothing.
    pub fn fire(&mut self, origin: usize) -> Result<Projectile, FireRejection> {
        if self.cooling_down {
            return Err(FireRejection::CoolingDown);
        }
        if self.projectile.is_some() {
            return Err(FireRejection::InFlight);
        }
        if !self.grid.is_in_bounds(origin) {
            return Err(FireRejection::OffGrid);
        }

        let projectile = Projectile {
            index: origin,
            steps: 0,
        };
        self.projectile = Some(projectile);
        self.cooling_down = true;
        self.reload_step = 0;
        Ok(projectile)
    }

    /// Move the projectile up one row and resolve what it lands on
    pub fn advance(&mut self, formation: &mut FormationController) -> ProjectileStep {
        let Some(mut projectile) = self.projectile else {
            return ProjectileStep::Idle;
        };

        let Some(next) = self.grid.step_up(projectile.index) else {
            self.projectile = None;
            return ProjectileStep::Despawned;
        };

        if let Some(member) = formation.live_at(next) {
            formation.destroy(member);
            self.projectile = None;
            return ProjectileStep::Hit {
                index: next,
                member,
            };
        }

        projectile.index = next;
        projectile.steps += 1;
        self.projectile = Some(projectile);
        ProjectileStep::Flying { index: next }
    }

    /// Re-open the fire gate
    pub fn release_cooldown(&mut self) {
        self.cooling_down = false;
        self.reload_step = self.reload_steps;
    }

    /// One reload-bar step; returns the new progress ratio
    pub fn tick_reload(&mut self) -> f32 {
        self.reload_step = (self.reload_step + 1).min(self.reload_steps);
        self.reload_progress()
    }

    /// Reload bar fill in [0, 1]; full whenever the gate is open
    pub fn reload_progress(&self) -> f32 {
        if !self.cooling_down {
            return 1.0;
        }
        self.reload_step as f32 / self.reload_steps as f32
    }

    /// Drop any in-flight projectile (end of session)
    pub fn clear(&mut self) {
        self.projectile = None;
    }
}
