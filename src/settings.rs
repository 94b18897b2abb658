//! Game settings
//!
//! Timing and layout knobs for a session. Persisted in LocalStorage on the
//! web, defaults everywhere else.

use std::error::Error;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Reasons a [`Settings`] value cannot drive a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    /// Grid must be at least 2 cells wide so both edges are distinct
    GridTooSmall { width: usize },
    /// Formation block must leave at least one free column to travel into
    FormationTooWide { cols: usize, width: usize },
    /// Formation must hold at least one member
    EmptyFormation,
    /// Shooter start cell is off-grid
    ShooterOffGrid { index: usize, size: usize },
    /// A timer period of zero would never advance
    ZeroPeriod { name: &'static str },
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GridTooSmall { width } => {
                write!(f, "grid width must be at least 2 (received {width})")
            }
            Self::FormationTooWide { cols, width } => {
                write!(f, "formation of {cols} columns has no room to move on a {width}-wide grid")
            }
            Self::EmptyFormation => write!(f, "formation must have at least one member"),
            Self::ShooterOffGrid { index, size } => {
                write!(f, "shooter start {index} is outside the grid (size {size})")
            }
            Self::ZeroPeriod { name } => write!(f, "{name} period must be positive"),
        }
    }
}

impl Error for SettingsError {}

/// Session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Layout ===
    /// Grid width in cells (grid is width x width)
    pub grid_width: usize,
    /// Rows in the starting formation
    pub formation_rows: usize,
    /// Columns in the starting formation
    pub formation_cols: usize,
    /// Shooter start cell
    pub shooter_start: usize,

    // === Timers (ms) ===
    pub formation_tick_ms: u64,
    pub projectile_tick_ms: u64,
    pub cooldown_ms: u64,
    pub reload_progress_ms: u64,
    pub clock_refresh_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            grid_width: GRID_WIDTH,
            formation_rows: FORMATION_ROWS,
            formation_cols: FORMATION_COLS,
            shooter_start: SHOOTER_START,

            formation_tick_ms: FORMATION_TICK_MS,
            projectile_tick_ms: PROJECTILE_TICK_MS,
            cooldown_ms: COOLDOWN_MS,
            reload_progress_ms: RELOAD_PROGRESS_MS,
            clock_refresh_ms: CLOCK_REFRESH_MS,
        }
    }
}

impl Settings {
    /// Check that these settings describe a playable session
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.grid_width < 2 {
            return Err(SettingsError::GridTooSmall {
                width: self.grid_width,
            });
        }
        if self.formation_rows == 0 || self.formation_cols == 0 {
            return Err(SettingsError::EmptyFormation);
        }
        if self.formation_cols >= self.grid_width {
            return Err(SettingsError::FormationTooWide {
                cols: self.formation_cols,
                width: self.grid_width,
            });
        }
        let size = self.grid_width * self.grid_width;
        if self.shooter_start >= size {
            return Err(SettingsError::ShooterOffGrid {
                index: self.shooter_start,
                size,
            });
        }

        let periods = [
            ("formation tick", self.formation_tick_ms),
            ("projectile tick", self.projectile_tick_ms),
            ("cooldown", self.cooldown_ms),
            ("reload progress", self.reload_progress_ms),
            ("clock refresh", self.clock_refresh_ms),
        ];
        if let Some(&(name, _)) = periods.iter().find(|(_, ms)| *ms == 0) {
            return Err(SettingsError::ZeroPeriod { name });
        }

        Ok(())
    }

    /// Number of reload-bar steps in one cooldown
    pub fn reload_steps(&self) -> u64 {
        (self.cooldown_ms / self.reload_progress_ms.max(1)).max(1)
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "grid_invaders_settings";

    /// Parse stored settings, keeping them only if they pass [`Settings::validate`]
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    fn decode(json: &str) -> Option<Self> {
        match serde_json::from_str::<Settings>(json) {
            Ok(settings) => match settings.validate() {
                Ok(()) => Some(settings),
                Err(e) => {
                    log::warn!("Stored settings rejected: {}", e);
                    None
                }
            },
            Err(e) => {
                log::warn!("Stored settings unreadable: {}", e);
                None
            }
        }
    }

    /// Load settings from LocalStorage (WASM only)
    ///
    /// A stored value that fails to parse or validate is replaced with the
    /// defaults so the next load starts clean.
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(Ok(Some(json))) = storage.map(|s| s.get_item(Self::STORAGE_KEY)) {
            if let Some(settings) = Self::decode(&json) {
                log::info!("Loaded settings from LocalStorage");
                return settings;
            }
            if let Err(e) = Self::default().save() {
                log::warn!("Could not repair stored settings: {}", e);
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    /// Save settings to LocalStorage. Settings that fail validation are
    /// never written. Native builds only validate.
    pub fn save(&self) -> Result<(), SettingsError> {
        self.validate()?;

        #[cfg(target_arch = "wasm32")]
        {
            let storage = web_sys::window()
                .and_then(|w| w.local_storage().ok())
                .flatten();
            match (storage, serde_json::to_string(self)) {
                (Some(storage), Ok(json)) if storage.set_item(Self::STORAGE_KEY, &json).is_ok() => {
                    log::info!("Settings saved");
                }
                _ => log::warn!("Settings could not be written to LocalStorage"),
            }
        }

        Ok(())
    }
}
