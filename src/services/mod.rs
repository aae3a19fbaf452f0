pub mod dashboard;
pub mod summary;

pub use dashboard::{AssignmentQuery, DashboardService, insights_prompt};
pub use summary::SummaryService;
