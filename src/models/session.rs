use serde::{Deserialize, Serialize};

/// The authenticated LMS identity. Persisted under two fixed keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user_id: i64,
}
