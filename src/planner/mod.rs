pub mod controller;
pub mod state;

pub use controller::{PlannerController, PlannerSnapshot};
pub use state::{Phase, PlannerTask, PomodoroTimer, TimerConfig};
