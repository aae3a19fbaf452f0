use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::AssignmentRecord;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Work,
    ShortBreak,
    LongBreak,
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Work
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimerConfig {
    pub work_secs: u32,
    pub short_break_secs: u32,
    pub long_break_secs: u32,
    /// A long break follows every n-th completed work session.
    pub long_break_every: u32,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work_secs: 25 * 60,
            short_break_secs: 5 * 60,
            long_break_secs: 15 * 60,
            long_break_every: 4,
        }
    }
}

impl TimerConfig {
    pub fn duration_of(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Work => self.work_secs,
            Phase::ShortBreak => self.short_break_secs,
            Phase::LongBreak => self.long_break_secs,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlannerTask {
    pub id: String,
    pub title: String,
    pub estimated_minutes: u32,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub assignment_id: Option<i64>,
}

impl PlannerTask {
    pub fn new(title: impl Into<String>, estimated_minutes: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            estimated_minutes,
            completed: false,
            assignment_id: None,
        }
    }

    /// Each assignment is planned as one work session unless re-estimated.
    pub fn from_assignment(record: &AssignmentRecord, work_secs: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: record.name.clone(),
            estimated_minutes: work_secs / 60,
            completed: false,
            assignment_id: Some(record.id),
        }
    }

    fn required_sessions(&self, work_secs: u32) -> u64 {
        if work_secs == 0 {
            return 0;
        }
        (u64::from(self.estimated_minutes) * 60).div_ceil(u64::from(work_secs))
    }
}

/// Pomodoro work/break state machine.
///
/// Transitions never fail. Reaching zero always stops the clock; the next
/// phase waits for an explicit `start`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PomodoroTimer {
    pub config: TimerConfig,
    pub phase: Phase,
    pub remaining_secs: u32,
    pub running: bool,
    pub sessions_completed: u32,
    pub current_task_index: usize,
    pub tasks: Vec<PlannerTask>,
}

impl Default for PomodoroTimer {
    fn default() -> Self {
        Self::with_config(TimerConfig::default())
    }
}

impl PomodoroTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TimerConfig) -> Self {
        Self {
            config,
            phase: Phase::Work,
            remaining_secs: config.work_secs,
            running: false,
            sessions_completed: 0,
            current_task_index: 0,
            tasks: Vec::new(),
        }
    }

    pub fn current_task(&self) -> Option<&PlannerTask> {
        self.tasks.get(self.current_task_index)
    }

    pub fn set_tasks(&mut self, tasks: Vec<PlannerTask>) {
        self.tasks = tasks;
        self.current_task_index = 0;
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    pub fn reset(&mut self) {
        self.running = false;
        self.remaining_secs = self.config.duration_of(self.phase);
    }

    pub fn skip(&mut self) {
        self.remaining_secs = 0;
        self.on_zero();
    }

    /// One elapsed second. Returns true when this tick completed the phase.
    pub fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.on_zero();
            return true;
        }
        false
    }

    fn on_zero(&mut self) {
        self.running = false;
        match self.phase {
            Phase::Work => {
                self.sessions_completed = self.sessions_completed.saturating_add(1);
                let every = self.config.long_break_every.max(1);
                self.phase = if self.sessions_completed % every == 0 {
                    Phase::LongBreak
                } else {
                    Phase::ShortBreak
                };
                self.advance_task();
            }
            Phase::ShortBreak | Phase::LongBreak => {
                self.phase = Phase::Work;
            }
        }
        self.remaining_secs = self.config.duration_of(self.phase);
    }

    fn advance_task(&mut self) {
        let work_secs = self.config.work_secs;
        let sessions = self.sessions_completed;
        let Some(task) = self.tasks.get_mut(self.current_task_index) else {
            return;
        };
        if task.completed || task.required_sessions(work_secs) > u64::from(sessions) {
            return;
        }
        task.completed = true;
        if self.current_task_index + 1 < self.tasks.len() {
            self.current_task_index += 1;
        }
    }

    pub fn display(&self) -> String {
        format!("{:02}:{:02}", self.remaining_secs / 60, self.remaining_secs % 60)
    }
}
