//! Front-end presentation state that lives outside the simulation
//!
//! The hit flash and reload bar colour are purely cosmetic, so they are
//! tracked here from [`GameEvent`]s instead of inside the session.

use crate::consts::HIT_FLASH_MS;
use crate::sim::GameEvent;

/// Reload bar colour while the cooldown runs
pub const RELOAD_COOLING_COLOR: &str = "#b33a3a";
/// Reload bar colour once a shot is ready
pub const RELOAD_READY_COLOR: &str = "#7f8c5a";

/// Cells currently showing the short explosion after a hit
#[derive(Debug, Clone, Default)]
pub struct HitFlashes {
    /// (cell, ms at which the flash ends)
    active: Vec<(usize, u64)>,
}

impl HitFlashes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a flash on `cell`. A second hit on the same cell restarts it.
    pub fn flash(&mut self, cell: usize, now: u64) {
        self.active.retain(|&(c, _)| c != cell);
        self.active.push((cell, now + HIT_FLASH_MS));
    }

    /// Start a flash for every destroyed enemy in `event`
    pub fn observe(&mut self, event: &GameEvent, now: u64) {
        if let GameEvent::EnemyDestroyed { index, .. } = *event {
            self.flash(index, now);
        }
    }

    /// Drop flashes that have run their course by `now`
    pub fn expire(&mut self, now: u64) {
        self.active.retain(|&(_, until)| until > now);
    }

    pub fn is_flashing(&self, cell: usize) -> bool {
        self.active.iter().any(|&(c, _)| c == cell)
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

/// Inline style for the reload bar: width from `ratio`, red until `ready`
pub fn reload_bar_style(ratio: f32, ready: bool) -> String {
    let color = if ready {
        RELOAD_READY_COLOR
    } else {
        RELOAD_COOLING_COLOR
    };
    format!(
        "width: {:.0}%; background-color: {}",
        ratio.clamp(0.0, 1.0) * 100.0,
        color
    )
}
