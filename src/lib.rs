pub mod ai;
pub mod analytics;
pub mod api;
pub mod auth;
pub mod classify;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod planner;
pub mod provider;
pub mod recommend;
pub mod repository;
pub mod services;
pub mod state;
pub mod view;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::planner::PlannerController;
use crate::state::AppState;

/// Wires the pool, provider, completer and planner from configuration.
pub async fn build_state(config: AppConfig) -> Result<AppState, AppError> {
    let db = db::connect(&config.database_url).await?;
    let provider = provider::from_config(&config)?;
    let completer = ai::from_config(&config)?;

    Ok(AppState {
        db,
        provider,
        completer,
        planner: PlannerController::new(),
        config: Arc::new(config),
    })
}
