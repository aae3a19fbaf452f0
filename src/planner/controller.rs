use std::{sync::Arc, time::Duration};

use serde::Serialize;
use tokio::{sync::Mutex, task::JoinHandle, time};
use tracing::{debug, info};

use super::{Phase, PlannerTask, PomodoroTimer, TimerConfig};

#[derive(Debug, Serialize, Clone)]
pub struct PlannerSnapshot {
    pub timer: PomodoroTimer,
    pub display: String,
    pub current_task: Option<PlannerTask>,
}

impl From<&PomodoroTimer> for PlannerSnapshot {
    fn from(timer: &PomodoroTimer) -> Self {
        Self {
            display: timer.display(),
            current_task: timer.current_task().cloned(),
            timer: timer.clone(),
        }
    }
}

/// Owns the live planner and the one-second ticker that drives it.
///
/// Ticks and user actions all go through the same mutex, so they are applied
/// one at a time.
#[derive(Clone)]
pub struct PlannerController {
    state: Arc<Mutex<PomodoroTimer>>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
    tick_interval: Duration,
}

impl Default for PlannerController {
    fn default() -> Self {
        Self::new()
    }
}

impl PlannerController {
    pub fn new() -> Self {
        Self::with_timer(PomodoroTimer::new(), Duration::from_secs(1))
    }

    pub fn with_timer(timer: PomodoroTimer, tick_interval: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(timer)),
            ticker: Arc::new(Mutex::new(None)),
            tick_interval,
        }
    }

    pub async fn snapshot(&self) -> PlannerSnapshot {
        PlannerSnapshot::from(&*self.state.lock().await)
    }

    pub async fn start(&self) -> PlannerSnapshot {
        let snapshot = {
            let mut guard = self.state.lock().await;
            if guard.running {
                return PlannerSnapshot::from(&*guard);
            }
            guard.start();
            PlannerSnapshot::from(&*guard)
        };
        info!("planner started: {:?} {}", snapshot.timer.phase, snapshot.display);
        self.spawn_ticker().await;
        snapshot
    }

    pub async fn pause(&self) -> PlannerSnapshot {
        self.cancel_ticker().await;
        let mut guard = self.state.lock().await;
        guard.pause();
        PlannerSnapshot::from(&*guard)
    }

    pub async fn reset(&self) -> PlannerSnapshot {
        self.cancel_ticker().await;
        let mut guard = self.state.lock().await;
        guard.reset();
        PlannerSnapshot::from(&*guard)
    }

    pub async fn skip(&self) -> PlannerSnapshot {
        self.cancel_ticker().await;
        let mut guard = self.state.lock().await;
        let from = guard.phase;
        guard.skip();
        info!("planner skipped {:?} -> {:?}", from, guard.phase);
        PlannerSnapshot::from(&*guard)
    }

    pub async fn set_tasks(&self, tasks: Vec<PlannerTask>) -> PlannerSnapshot {
        let mut guard = self.state.lock().await;
        guard.set_tasks(tasks);
        PlannerSnapshot::from(&*guard)
    }

    /// Throws away the current session and returns to the initial state.
    pub async fn discard(&self) -> PlannerSnapshot {
        self.cancel_ticker().await;
        let mut guard = self.state.lock().await;
        let config: TimerConfig = guard.config;
        *guard = PomodoroTimer::with_config(config);
        PlannerSnapshot::from(&*guard)
    }

    async fn spawn_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let state = self.state.clone();
        let tick_interval = self.tick_interval;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(time::Instant::now() + tick_interval, tick_interval);
            loop {
                interval.tick().await;

                let mut guard = state.lock().await;
                if !guard.running {
                    break;
                }
                let from: Phase = guard.phase;
                if guard.tick() {
                    info!(
                        "planner phase complete: {:?} -> {:?} (sessions completed: {})",
                        from, guard.phase, guard.sessions_completed
                    );
                    break;
                }
                debug!("planner tick: {}", guard.display());
            }
        });

        *ticker_guard = Some(handle);
    }

    async fn cancel_ticker(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_controller() -> PlannerController {
        let config = TimerConfig { work_secs: 3, short_break_secs: 2, long_break_secs: 4, long_break_every: 4 };
        PlannerController::with_timer(PomodoroTimer::with_config(config), Duration::from_millis(20))
    }

    #[tokio::test]
    async fn ticker_runs_phase_to_completion_and_stops() {
        let controller = fast_controller();
        let started = controller.start().await;
        assert!(started.timer.running);

        tokio::time::sleep(Duration::from_millis(400)).await;

        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.timer.phase, Phase::ShortBreak);
        assert_eq!(snapshot.timer.sessions_completed, 1);
        assert!(!snapshot.timer.running);
        assert_eq!(snapshot.display, "00:02");
    }

    #[tokio::test]
    async fn pause_freezes_remaining_time() {
        let controller = PlannerController::with_timer(PomodoroTimer::new(), Duration::from_millis(20));
        controller.start().await;
        tokio::time::sleep(Duration::from_millis(90)).await;
        let paused = controller.pause().await;
        assert!(!paused.timer.running);
        let remaining = paused.timer.remaining_secs;
        assert!(remaining < 25 * 60);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(controller.snapshot().await.timer.remaining_secs, remaining);
    }

    #[tokio::test]
    async fn skip_and_discard() {
        let controller = PlannerController::new();
        controller.set_tasks(vec![PlannerTask::new("Essay outline", 25)]).await;
        let skipped = controller.skip().await;
        assert_eq!(skipped.timer.phase, Phase::ShortBreak);
        assert!(skipped.timer.tasks[0].completed);

        let fresh = controller.discard().await;
        assert_eq!(fresh.timer.phase, Phase::Work);
        assert_eq!(fresh.display, "25:00");
        assert!(fresh.timer.tasks.is_empty());
        assert!(fresh.current_task.is_none());
    }
}
