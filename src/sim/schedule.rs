//! Cancellable one-shot and periodic tasks over a millisecond clock
//!
//! The scheduler never reads a wall clock. Callers move time forward with
//! [`Scheduler::pop_due`] and dispatch each task as it comes due, which keeps
//! every schedule deterministic under test.

/// Handle for a scheduled task
pub type TaskId = u64;

/// Work a session can schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    /// March the formation one step
    FormationAdvance,
    /// Refresh the elapsed-time display
    ClockRefresh,
    /// Move the projectile one row
    ProjectileAdvance,
    /// Re-arm the fire gate
    CooldownRelease,
    /// Refresh the reload bar
    ReloadProgress,
}

#[derive(Debug, Clone)]
struct Entry {
    id: TaskId,
    task: Task,
    due: u64,
    period: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    now: u64,
    next_id: TaskId,
    entries: Vec<Entry>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current clock (ms)
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Move the clock to `now` without running anything.
    /// Used when a session starts; never moves the clock backwards.
    pub fn set_now(&mut self, now: u64) {
        self.now = self.now.max(now);
    }

    /// Run `task` every `period` ms, first at `now + period`
    pub fn every(&mut self, task: Task, period: u64) -> TaskId {
        self.push(task, period, Some(period.max(1)))
    }

    /// Run `task` once, `delay` ms from now
    pub fn after(&mut self, task: Task, delay: u64) -> TaskId {
        self.push(task, delay, None)
    }

    fn push(&mut self, task: Task, delay: u64, period: Option<u64>) -> TaskId {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            task,
            due: self.now + delay,
            period,
        });
        id
    }

    /// Cancel a task. Returns false if it had already run or been cancelled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    /// Cancel every pending task
    pub fn cancel_all(&mut self) {
        self.entries.clear();
    }

    pub fn is_scheduled(&self, id: TaskId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// Number of pending tasks
    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    /// Take the earliest task due at or before `until`, advancing the clock
    /// to its due time. Ties run in scheduling order. Periodic tasks are
    /// re-armed for their next period before being returned.
    pub fn pop_due(&mut self, until: u64) -> Option<(TaskId, Task)> {
        let slot = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due <= until)
            .min_by_key(|(_, e)| (e.due, e.id))
            .map(|(slot, _)| slot)?;

        let Entry {
            id,
            task,
            due,
            period,
        } = self.entries[slot].clone();
        self.now = self.now.max(due);
        match period {
            Some(period) => self.entries[slot].due = due + period,
            None => {
                self.entries.swap_remove(slot);
            }
        }
        Some((id, task))
    }

    /// Finish an advance: the clock catches up to `until`
    pub fn settle(&mut self, until: u64) {
        self.now = self.now.max(until);
    }
}
