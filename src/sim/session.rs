//! Game session: timers, input routing, win/loss and lifecycle
//!
//! A session owns every controller and a [`Scheduler`]. Front-ends feed it
//! time through [`GameSession::advance_to`] and player input through
//! [`GameSession::handle_input`], then drain [`GameEvent`]s or take a
//! [`Snapshot`] to draw.
//!
//! Events queue up until [`GameSession::drain_events`] is called, so a
//! front-end drains once per frame. Only the shooter's own cell ends a game
//! in defeat: a formation whose live members never cover the shooter's
//! column marches off the bottom of the grid and the session stays Active,
//! still producing clock events, until it is reset or restarted.

use std::error::Error;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::formation::FormationController;
use super::grid::Grid;
use super::projectile::{ProjectileController, ProjectileStep};
use super::schedule::{Scheduler, Task, TaskId};
use super::shooter::ShooterController;
use super::state::{CellState, GameEvent, Input, SessionState, Snapshot};
use crate::highscores::{ScoreRecord, ScoreStore, ScoreStoreError};
use crate::settings::{Settings, SettingsError};

/// Score and time captured when a session ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalResult {
    pub outcome: SessionState,
    pub score: u32,
    pub elapsed_ms: u64,
}

/// Why a score could not be handed to the store
#[derive(Debug)]
pub enum SubmitError {
    /// Only a won session has a score to record
    NotWon,
    /// This session's score is already stored
    AlreadySubmitted,
    Store(ScoreStoreError),
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotWon => write!(f, "no victory to record"),
            Self::AlreadySubmitted => write!(f, "score already recorded"),
            Self::Store(e) => write!(f, "{e}"),
        }
    }
}

impl Error for SubmitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ScoreStoreError> for SubmitError {
    fn from(e: ScoreStoreError) -> Self {
        Self::Store(e)
    }
}

#[derive(Debug, Clone)]
pub struct GameSession {
    settings: Settings,
    grid: Grid,
    state: SessionState,
    formation: FormationController,
    shooter: ShooterController,
    projectile: ProjectileController,
    scheduler: Scheduler,
    /// Members destroyed this session
    score: u32,
    started_at: u64,
    elapsed_ms: u64,
    /// Formation steps taken this session
    formation_ticks: u64,
    projectile_task: Option<TaskId>,
    reload_task: Option<TaskId>,
    final_result: Option<FinalResult>,
    submitted: bool,
    events: Vec<GameEvent>,
}

impl Default for GameSession {
    fn default() -> Self {
        Self::build(Settings::default())
    }
}

impl GameSession {
    /// Idle session with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Idle session with custom settings
    pub fn with_settings(settings: Settings) -> Result<Self, SettingsError> {
        settings.validate()?;
        Ok(Self::build(settings))
    }

    fn build(settings: Settings) -> Self {
        let grid = Grid::new(settings.grid_width);
        let mut formation =
            FormationController::new(grid, settings.formation_rows, settings.formation_cols);
        formation.clear();

        Self {
            grid,
            state: SessionState::Idle,
            formation,
            shooter: ShooterController::new(grid, settings.shooter_start),
            projectile: ProjectileController::new(grid, settings.reload_steps()),
            scheduler: Scheduler::new(),
            score: 0,
            started_at: 0,
            elapsed_ms: 0,
            formation_ticks: 0,
            projectile_task: None,
            reload_task: None,
            final_result: None,
            submitted: false,
            events: Vec::new(),
            settings,
        }
    }

    /// Begin a fresh play-through at time `now` (ms).
    ///
    /// Any schedules of a previous play-through are cancelled first, so this
    /// is safe to call from any state, including mid-game.
    pub fn start(&mut self, now: u64) {
        self.cancel_schedules();
        self.scheduler.set_now(now);

        self.formation.reset();
        self.shooter.reset();
        self.projectile.reset();
        self.score = 0;
        self.started_at = self.scheduler.now();
        self.elapsed_ms = 0;
        self.formation_ticks = 0;
        self.final_result = None;
        self.submitted = false;
        self.events.clear();

        self.scheduler
            .every(Task::FormationAdvance, self.settings.formation_tick_ms);
        self.scheduler
            .every(Task::ClockRefresh, self.settings.clock_refresh_ms);

        self.state = SessionState::Active;
        self.events.push(GameEvent::Started);
        log::info!(
            "Session started ({} members, shooter at {})",
            self.formation.len(),
            self.shooter.index()
        );
    }

    /// Return to Idle: timers stopped, board cleared
    pub fn reset(&mut self) {
        self.cancel_schedules();
        self.formation.clear();
        self.shooter.reset();
        self.projectile.reset();
        self.score = 0;
        self.elapsed_ms = 0;
        self.formation_ticks = 0;
        self.final_result = None;
        self.submitted = false;
        self.events.clear();
        self.state = SessionState::Idle;
    }

    /// Run every task due up to and including `now` (ms)
    pub fn advance_to(&mut self, now: u64) {
        while let Some((id, task)) = self.scheduler.pop_due(now) {
            self.dispatch(id, task);
        }
        self.scheduler.settle(now);
        if self.state == SessionState::Active {
            self.elapsed_ms = self.scheduler.now() - self.started_at;
        }
    }

    /// Route one player input at the current clock.
    ///
    /// Call [`advance_to`](Self::advance_to) with the input's timestamp
    /// first. Input outside an active session is dropped, not queued.
    /// Returns whether the input changed anything.
    pub fn handle_input(&mut self, input: Input) -> bool {
        if self.state != SessionState::Active {
            return false;
        }

        match input {
            Input::Left | Input::Right => {
                let moved = if input == Input::Left {
                    self.shooter.move_left()
                } else {
                    self.shooter.move_right()
                };
                if moved {
                    self.events.push(GameEvent::ShooterMoved {
                        index: self.shooter.index(),
                    });
                }
                moved
            }
            Input::Fire => self.fire(),
        }
    }

    fn fire(&mut self) -> bool {
        match self.projectile.fire(self.shooter.index()) {
            Ok(_) => {
                self.projectile_task = Some(
                    self.scheduler
                        .every(Task::ProjectileAdvance, self.settings.projectile_tick_ms),
                );
                self.scheduler
                    .after(Task::CooldownRelease, self.settings.cooldown_ms);
                self.reload_task = Some(
                    self.scheduler
                        .every(Task::ReloadProgress, self.settings.reload_progress_ms),
                );
                self.events.push(GameEvent::ReloadProgress { ratio: 0.0 });
                true
            }
            Err(reason) => {
                log::debug!("Fire rejected: {:?}", reason);
                false
            }
        }
    }

    fn dispatch(&mut self, id: TaskId, task: Task) {
        match task {
            Task::FormationAdvance => self.on_formation_tick(),
            Task::ClockRefresh => {
                self.elapsed_ms = self.scheduler.now() - self.started_at;
                self.events.push(GameEvent::ElapsedTime {
                    elapsed_ms: self.elapsed_ms,
                });
            }
            Task::ProjectileAdvance => self.on_projectile_tick(id),
            Task::CooldownRelease => {
                self.projectile.release_cooldown();
                if let Some(reload) = self.reload_task.take() {
                    self.scheduler.cancel(reload);
                }
                self.events.push(GameEvent::Reloaded);
            }
            Task::ReloadProgress => {
                let ratio = self.projectile.tick_reload();
                self.events.push(GameEvent::ReloadProgress { ratio });
                if ratio >= 1.0 {
                    self.scheduler.cancel(id);
                    self.reload_task = None;
                }
            }
        }
    }

    /// March, then loss check, then win check. Loss wins a tie.
    fn on_formation_tick(&mut self) {
        let bounced = self.formation.advance();
        self.formation_ticks += 1;
        self.events.push(GameEvent::FormationMoved { bounced });

        if self.formation.occupies(self.shooter.index()) {
            self.finish(SessionState::Lost);
        } else if self.formation.is_cleared() {
            self.finish(SessionState::Won);
        }
    }

    fn on_projectile_tick(&mut self, id: TaskId) {
        let step = self.projectile.advance(&mut self.formation);
        match step {
            ProjectileStep::Idle => {}
            ProjectileStep::Flying { index } => {
                self.events.push(GameEvent::ProjectileMoved { index });
            }
            ProjectileStep::Despawned => self.events.push(GameEvent::ProjectileDespawned),
            ProjectileStep::Hit { index, member } => self.record_hit(index, member),
        }

        if step.ends_flight() {
            self.scheduler.cancel(id);
            self.projectile_task = None;
        }
    }

    fn record_hit(&mut self, index: usize, member: usize) {
        self.score += 1;
        self.events.push(GameEvent::EnemyDestroyed {
            index,
            member,
            score: self.score,
        });
    }

    /// Leave Active. Schedules are cancelled before anything else changes.
    fn finish(&mut self, outcome: SessionState) {
        self.cancel_schedules();
        self.projectile.clear();

        self.elapsed_ms = self.scheduler.now() - self.started_at;
        self.state = outcome;
        let result = FinalResult {
            outcome,
            score: self.score,
            elapsed_ms: self.elapsed_ms,
        };
        self.final_result = Some(result);
        self.events.push(GameEvent::GameOver {
            outcome,
            score: result.score,
            elapsed_ms: result.elapsed_ms,
        });

        match outcome {
            SessionState::Won => log::info!(
                "Victory: {} destroyed in {}",
                result.score,
                crate::format_elapsed(result.elapsed_ms)
            ),
            _ => log::info!(
                "Overrun after {} with score {}",
                crate::format_elapsed(result.elapsed_ms),
                result.score
            ),
        }
    }

    fn cancel_schedules(&mut self) {
        self.scheduler.cancel_all();
        self.projectile_task = None;
        self.reload_task = None;
    }

    /// Hand the final score of a won session to `store` under `name`.
    ///
    /// A store failure leaves the session untouched so the player can retry.
    pub fn submit_score<S: ScoreStore + ?Sized>(
        &mut self,
        store: &mut S,
        name: &str,
    ) -> Result<ScoreRecord, SubmitError> {
        let Some(result) = self.final_result.filter(|r| r.outcome == SessionState::Won) else {
            return Err(SubmitError::NotWon);
        };
        if self.submitted {
            return Err(SubmitError::AlreadySubmitted);
        }

        match store.submit(name, result.score as i64) {
            Ok(record) => {
                self.submitted = true;
                Ok(record)
            }
            Err(e) => {
                log::warn!("Score submission failed: {}", e);
                Err(e.into())
            }
        }
    }

    /// Take every event emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Declarative picture of the board
    pub fn snapshot(&self) -> Snapshot {
        let mut cells = vec![CellState::Empty; self.grid.size()];
        for cell in self.formation.live_cells() {
            cells[cell] = CellState::Enemy;
        }
        if let Some(projectile) = self.projectile.projectile() {
            if projectile.steps > 0 && self.grid.is_in_bounds(projectile.index) {
                cells[projectile.index] = CellState::Projectile;
            }
        }
        if self.state != SessionState::Idle {
            cells[self.shooter.index()] = CellState::Shooter;
        }

        Snapshot {
            state: self.state,
            width: self.grid.width(),
            cells,
            score: self.score,
            elapsed_ms: self.elapsed_ms,
            reload: self.projectile.reload_progress(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Session clock (ms)
    pub fn now(&self) -> u64 {
        self.scheduler.now()
    }

    pub fn formation_ticks(&self) -> u64 {
        self.formation_ticks
    }

    pub fn final_result(&self) -> Option<FinalResult> {
        self.final_result
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn formation(&self) -> &FormationController {
        &self.formation
    }

    pub fn shooter(&self) -> &ShooterController {
        &self.shooter
    }

    pub fn projectile(&self) -> &ProjectileController {
        &self.projectile
    }

    /// Pending scheduled tasks (all timers included)
    pub fn pending_tasks(&self) -> usize {
        self.scheduler.pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::highscores::{MemoryScoreStore, RecordIds};
    use crate::sim::formation::Heading;
    use proptest::prelude::*;

    /// Destroy a member the way a projectile hit does
    fn strike(session: &mut GameSession, member: usize) {
        let cell = session.formation.members()[member];
        assert!(session.formation.destroy(member));
        session.record_hit(cell, member);
    }

    fn started() -> GameSession {
        let mut session = GameSession::new();
        session.start(0);
        session
    }

    /// Advance until the session leaves Active (or a generous deadline)
    fn run_out(session: &mut GameSession) {
        let mut now = session.now();
        while session.is_active() && now < 600_000 {
            now += FORMATION_TICK_MS;
            session.advance_to(now);
        }
    }

    #[test]
    fn test_start_initial_state() {
        let session = started();
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(session.score(), 0);
        assert_eq!(session.shooter().index(), SHOOTER_START);
        assert_eq!(session.formation().len(), 30);
        assert_eq!(session.formation().destroyed_count(), 0);
        assert_eq!(session.formation().heading(), Heading::Right);
        assert_eq!(session.elapsed_ms(), 0);
        // Formation march and clock refresh
        assert_eq!(session.pending_tasks(), 2);

        let snap = session.snapshot();
        assert_eq!(snap.count(CellState::Enemy), 30);
        assert_eq!(snap.cell(SHOOTER_START), CellState::Shooter);
    }

    #[test]
    fn test_idle_ignores_input() {
        let mut session = GameSession::new();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.handle_input(Input::Left));
        assert!(!session.handle_input(Input::Fire));
        session.advance_to(10_000);
        assert_eq!(session.formation_ticks(), 0);

        // Nothing was queued
        session.start(10_000);
        assert_eq!(session.shooter().index(), SHOOTER_START);
        assert!(session.projectile().projectile().is_none());
    }

    #[test]
    fn test_formation_ticks_every_period() {
        let mut session = started();
        session.advance_to(FORMATION_TICK_MS - 1);
        assert_eq!(session.formation_ticks(), 0);
        session.advance_to(FORMATION_TICK_MS * 3);
        assert_eq!(session.formation_ticks(), 3);
        assert_eq!(session.formation().members()[0], 3);
        assert_eq!(session.elapsed_ms(), FORMATION_TICK_MS * 3);
    }

    #[test]
    fn test_clock_refresh_events() {
        let mut session = started();
        session.drain_events();
        session.advance_to(CLOCK_REFRESH_MS * 5);
        let clock: Vec<_> = session
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                GameEvent::ElapsedTime { elapsed_ms } => Some(elapsed_ms),
                _ => None,
            })
            .collect();
        assert_eq!(clock, [40, 80, 120, 160, 200]);
    }

    #[test]
    fn test_shooter_moves_only_within_row() {
        let mut session = started();
        for _ in 0..20 {
            session.handle_input(Input::Left);
        }
        assert_eq!(session.grid().col_of(session.shooter().index()), 0);
        for _ in 0..20 {
            session.handle_input(Input::Right);
        }
        assert_eq!(session.grid().col_of(session.shooter().index()), 14);
        assert_eq!(session.grid().row_of(session.shooter().index()), 13);
    }

    #[test]
    fn test_immediate_fire_hits_column_seven() {
        let mut session = started();
        assert!(session.handle_input(Input::Fire));

        // Eleven projectile ticks reach row 2. The formation stepped right
        // once at 600ms, so column 7 of row 2 is array position 26.
        session.advance_to(1_000);
        assert_eq!(session.score(), 0);
        session.advance_to(1_100);
        assert_eq!(session.score(), 1);
        assert!(session.formation().destroyed().contains(&26));
        assert!(session.projectile().projectile().is_none());
        assert!(
            session
                .drain_events()
                .contains(&GameEvent::EnemyDestroyed {
                    index: 37,
                    member: 26,
                    score: 1
                })
        );
    }

    #[test]
    fn test_fire_during_cooldown_is_ignored() {
        let mut session = started();
        assert!(session.handle_input(Input::Fire));
        let projectile = session.projectile().projectile();
        let pending = session.pending_tasks();

        session.advance_to(COOLDOWN_MS - 1);
        let projectile_now = session.projectile().projectile();
        assert!(!session.handle_input(Input::Fire));
        assert_eq!(session.projectile().projectile(), projectile_now);
        assert!(projectile.is_some());
        assert_eq!(session.pending_tasks(), pending);
    }

    #[test]
    fn test_gate_reopens_after_cooldown_and_flight() {
        let mut session = started();
        session.handle_input(Input::Fire);

        session.advance_to(COOLDOWN_MS);
        assert!(!session.projectile().is_cooling_down());
        // Still airborne, so a second shot waits
        assert!(!session.handle_input(Input::Fire));

        session.advance_to(1_100);
        assert!(session.handle_input(Input::Fire));
    }

    #[test]
    fn test_reload_progress_events() {
        let mut session = started();
        session.drain_events();
        session.handle_input(Input::Fire);
        session.advance_to(COOLDOWN_MS);

        let ratios: Vec<f32> = session
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                GameEvent::ReloadProgress { ratio } => Some(ratio),
                _ => None,
            })
            .collect();
        assert_eq!(ratios.len(), 10);
        assert_eq!(ratios[0], 0.0);
        assert!(ratios.windows(2).all(|w| w[0] < w[1]));
        assert!(ratios.iter().all(|r| (0.0..=1.0).contains(r)));
        assert_eq!(session.snapshot().reload, 1.0);
    }

    #[test]
    fn test_lost_without_firing() {
        let mut session = started();
        run_out(&mut session);

        assert_eq!(session.state(), SessionState::Lost);
        assert_eq!(session.score(), 0);
        assert!(session.formation().occupies(session.shooter().index()));
        // Eleven bounces at one every five steps after the first six
        assert_eq!(session.formation_ticks(), 56);
        assert_eq!(session.elapsed_ms(), 56 * FORMATION_TICK_MS);
        assert_eq!(session.pending_tasks(), 0);

        let ticks = session.formation_ticks();
        session.advance_to(session.now() + 60_000);
        assert_eq!(session.formation_ticks(), ticks);
        assert_eq!(
            session.final_result(),
            Some(FinalResult {
                outcome: SessionState::Lost,
                score: 0,
                elapsed_ms: 56 * FORMATION_TICK_MS
            })
        );
    }

    #[test]
    fn test_won_after_thirty_hits() {
        let mut session = started();
        session.advance_to(1_000);
        for member in 0..30 {
            strike(&mut session, member);
        }
        assert_eq!(session.state(), SessionState::Active);

        // Win is judged on the next formation step
        session.advance_to(1_200);
        assert_eq!(session.state(), SessionState::Won);
        assert_eq!(session.score(), 30);
        assert_eq!(session.formation().destroyed_count(), 30);
        assert_eq!(session.final_result().map(|r| r.elapsed_ms), Some(1_200));

        let ticks = session.formation_ticks();
        session.advance_to(100_000);
        assert_eq!(session.formation_ticks(), ticks);
        assert_eq!(session.pending_tasks(), 0);
        assert!(session.drain_events().iter().any(|e| matches!(
            e,
            GameEvent::GameOver {
                outcome: SessionState::Won,
                score: 30,
                ..
            }
        )));
    }

    #[test]
    fn test_formation_slipping_past_shooter_stays_active() {
        let mut session = started();
        for _ in 0..7 {
            assert!(session.handle_input(Input::Left));
        }
        assert_eq!(session.grid().col_of(session.shooter().index()), 0);
        // Left half of the block gone: live members never reach column 0
        for member in (0..30).filter(|pos| pos % FORMATION_COLS < 5) {
            strike(&mut session, member);
        }
        session.drain_events();

        let per_frame = 1 + (FORMATION_TICK_MS / CLOCK_REFRESH_MS) as usize;
        let mut now = 0;
        while now < 3_600_000 {
            now += FORMATION_TICK_MS;
            session.advance_to(now);
            assert!(session.drain_events().len() <= per_frame);
        }

        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(session.formation().live_cells().count(), 0);
        assert_eq!(session.formation().live_count(), 15);
        assert_eq!(session.pending_tasks(), 2);
        assert_eq!(session.final_result(), None);

        session.reset();
        assert_eq!(session.pending_tasks(), 0);
    }

    #[test]
    fn test_loss_beats_win_on_last_member() {
        // Find which member overruns the shooter
        let mut scout = started();
        run_out(&mut scout);
        let shooter = scout.shooter().index();
        let last = scout.formation().live_at(shooter).unwrap();

        let mut session = started();
        for member in (0..30).filter(|&m| m != last) {
            strike(&mut session, member);
        }
        run_out(&mut session);
        assert_eq!(session.state(), SessionState::Lost);
        assert_eq!(session.score(), 29);
    }

    #[test]
    fn test_game_over_cancels_projectile() {
        let mut session = started();
        // Shoot one projectile tick before the formation lands on the shooter
        session.advance_to(56 * FORMATION_TICK_MS - PROJECTILE_TICK_MS);
        assert!(session.handle_input(Input::Fire));
        assert!(session.pending_tasks() > 2);
        session.advance_to(56 * FORMATION_TICK_MS);
        assert_eq!(session.state(), SessionState::Lost);
        assert_eq!(session.pending_tasks(), 0);
        assert!(session.projectile().projectile().is_none());

        let events = session.drain_events();
        assert!(matches!(events.last(), Some(GameEvent::GameOver { .. })));
    }

    #[test]
    fn test_input_after_game_over_is_ignored() {
        let mut session = started();
        run_out(&mut session);
        let shooter = session.shooter().index();
        assert!(!session.handle_input(Input::Right));
        assert!(!session.handle_input(Input::Fire));
        assert_eq!(session.shooter().index(), shooter);
    }

    #[test]
    fn test_restart_mid_game_cancels_old_timers() {
        let mut session = started();
        session.advance_to(1_000);
        session.handle_input(Input::Fire);
        session.handle_input(Input::Left);

        session.start(1_000);
        assert_eq!(session.pending_tasks(), 2);
        assert!(session.projectile().projectile().is_none());
        assert!(!session.projectile().is_cooling_down());
        assert_eq!(session.shooter().index(), SHOOTER_START);

        session.advance_to(1_599);
        assert_eq!(session.formation_ticks(), 0);
        session.advance_to(1_600);
        assert_eq!(session.formation_ticks(), 1);
        assert_eq!(session.elapsed_ms(), 600);
    }

    #[test]
    fn test_reset_then_start_reproduces_initial_state() {
        let fresh = started();

        let mut session = started();
        session.handle_input(Input::Right);
        session.handle_input(Input::Fire);
        run_out(&mut session);
        session.reset();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.formation().is_empty());
        assert_eq!(session.pending_tasks(), 0);

        session.start(session.now());
        assert_eq!(session.snapshot(), fresh.snapshot());
        assert_eq!(session.formation().members(), fresh.formation().members());
        assert_eq!(session.formation().heading(), Heading::Right);
        assert_eq!(session.formation().destroyed_count(), 0);
        assert_eq!(session.score(), 0);
        assert_eq!(session.pending_tasks(), 2);
    }

    #[test]
    fn test_submit_only_after_win() {
        let mut store = MemoryScoreStore::with_seed(3);

        let mut lost = started();
        run_out(&mut lost);
        assert!(matches!(
            lost.submit_score(&mut store, "Ace"),
            Err(SubmitError::NotWon)
        ));

        let mut won = started();
        for member in 0..30 {
            strike(&mut won, member);
        }
        won.advance_to(FORMATION_TICK_MS);
        let record = won.submit_score(&mut store, " Ace ").unwrap();
        assert_eq!(record.name, "Ace");
        assert_eq!(record.score, 30);
        assert!(matches!(
            won.submit_score(&mut store, "Ace"),
            Err(SubmitError::AlreadySubmitted)
        ));
        assert_eq!(store.len(), 1);
    }

    struct OfflineStore {
        ids: RecordIds,
    }

    impl ScoreStore for OfflineStore {
        fn records(&self) -> Result<Vec<ScoreRecord>, ScoreStoreError> {
            Err(ScoreStoreError::Storage("offline".to_string()))
        }

        fn append(&mut self, _record: ScoreRecord) -> Result<(), ScoreStoreError> {
            Err(ScoreStoreError::Storage("offline".to_string()))
        }

        fn ids(&mut self) -> &mut RecordIds {
            &mut self.ids
        }
    }

    #[test]
    fn test_failed_submit_allows_retry() {
        let mut session = started();
        for member in 0..30 {
            strike(&mut session, member);
        }
        session.advance_to(FORMATION_TICK_MS);

        let mut offline = OfflineStore {
            ids: RecordIds::new(0),
        };
        let err = session.submit_score(&mut offline, "Ace").unwrap_err();
        assert!(matches!(err, SubmitError::Store(ScoreStoreError::Storage(_))));
        assert_eq!(session.state(), SessionState::Won);
        assert_eq!(session.score(), 30);
        assert!(!session.is_submitted());

        let mut store = MemoryScoreStore::with_seed(5);
        assert!(session.submit_score(&mut store, "Ace").is_ok());
    }

    #[test]
    fn test_rejected_name_reported() {
        let mut session = started();
        for member in 0..30 {
            strike(&mut session, member);
        }
        session.advance_to(FORMATION_TICK_MS);

        let mut store = MemoryScoreStore::with_seed(5);
        let err = session.submit_score(&mut store, "   ").unwrap_err();
        assert_eq!(err.to_string(), "invalid data: name must not be empty");
        assert!(session.submit_score(&mut store, "Ace").is_ok());
    }

    #[test]
    fn test_custom_settings_rejected() {
        let settings = Settings {
            formation_tick_ms: 0,
            ..Default::default()
        };
        assert!(GameSession::with_settings(settings).is_err());

        let fast = Settings {
            formation_tick_ms: 100,
            ..Default::default()
        };
        let mut session = GameSession::with_settings(fast).unwrap();
        session.start(0);
        session.advance_to(300);
        assert_eq!(session.formation_ticks(), 3);
    }

    proptest! {
        #[test]
        fn prop_random_play_keeps_invariants(
            inputs in proptest::collection::vec((0u8..4, 1u64..400), 1..120)
        ) {
            let mut session = started();
            let mut now = 0;
            let mut destroyed = 0;
            for (key, wait) in inputs {
                now += wait;
                session.advance_to(now);
                let input = match key {
                    0 => Input::Left,
                    1 => Input::Right,
                    _ => Input::Fire,
                };
                session.handle_input(input);

                let formation = session.formation();
                prop_assert_eq!(formation.len(), 30);
                prop_assert!(formation.destroyed_count() >= destroyed);
                destroyed = formation.destroyed_count();
                prop_assert_eq!(session.score() as usize, destroyed);
                let grid = session.grid();
                let left = grid.col_of(formation.members()[0]);
                prop_assert!(left + FORMATION_COLS <= grid.width());
                for (pos, &member) in formation.members().iter().enumerate() {
                    prop_assert_eq!(grid.col_of(member), left + pos % FORMATION_COLS);
                }
                prop_assert_eq!(grid.row_of(session.shooter().index()), 13);
            }
        }

        #[test]
        fn prop_cooldown_rejection_is_idempotent(presses in 1usize..20, at in 0u64..499) {
            let mut session = started();
            session.handle_input(Input::Fire);
            session.advance_to(at);
            let projectile = session.projectile().projectile();
            let pending = session.pending_tasks();
            for _ in 0..presses {
                prop_assert!(!session.handle_input(Input::Fire));
            }
            prop_assert_eq!(session.projectile().projectile(), projectile);
            prop_assert_eq!(session.pending_tasks(), pending);
        }
    }
}
