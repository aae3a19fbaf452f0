use std::sync::Arc;

use sqlx::SqlitePool;

use crate::ai::Completer;
use crate::config::AppConfig;
use crate::planner::PlannerController;
use crate::provider::DataProvider;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub provider: Arc<dyn DataProvider>,
    pub completer: Arc<dyn Completer>,
    pub planner: PlannerController,
    pub config: Arc<AppConfig>,
}
