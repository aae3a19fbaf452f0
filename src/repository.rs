use std::collections::HashMap;

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::models::AuthSession;

pub const TOKEN_KEY: &str = "canvas_token";
pub const USER_ID_KEY: &str = "canvas_user_id";

/// Two binds per key; stays well under SQLite's parameter limit.
const SUMMARY_LOOKUP_CHUNK: usize = 400;

pub async fn save_session(db: &SqlitePool, session: &AuthSession) -> Result<(), sqlx::Error> {
    let now = Utc::now().to_rfc3339();
    let user_id = session.user_id.to_string();
    let mut tx = db.begin().await?;

    for (key, value) in [(TOKEN_KEY, session.token.as_str()), (USER_ID_KEY, user_id.as_str())] {
        sqlx::query(
            r#"
            INSERT INTO session_store (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(&now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await
}

/// Both keys must be present and the user id numeric, otherwise there is no session.
pub async fn load_session(db: &SqlitePool) -> Result<Option<AuthSession>, sqlx::Error> {
    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT key, value FROM session_store WHERE key IN (?1, ?2)",
    )
    .bind(TOKEN_KEY)
    .bind(USER_ID_KEY)
    .fetch_all(db)
    .await?;

    let values: HashMap<String, String> = rows.into_iter().collect();
    let token = values.get(TOKEN_KEY).filter(|t| !t.is_empty());
    let user_id = values.get(USER_ID_KEY).and_then(|v| v.parse::<i64>().ok());

    Ok(match (token, user_id) {
        (Some(token), Some(user_id)) => Some(AuthSession {
            token: token.clone(),
            user_id,
        }),
        _ => None,
    })
}

pub async fn clear_session(db: &SqlitePool) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM session_store WHERE key IN (?1, ?2)")
        .bind(TOKEN_KEY)
        .bind(USER_ID_KEY)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

pub async fn fetch_summary(
    db: &SqlitePool,
    course_id: i64,
    assignment_id: i64,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT summary FROM assignment_summaries WHERE course_id = ?1 AND assignment_id = ?2",
    )
    .bind(course_id)
    .bind(assignment_id)
    .fetch_optional(db)
    .await
}

/// Cached summaries for the given `(course_id, assignment_id)` keys only.
pub async fn fetch_summaries_for(
    db: &SqlitePool,
    keys: &[(i64, i64)],
) -> Result<HashMap<(i64, i64), String>, sqlx::Error> {
    let mut summaries = HashMap::new();
    for chunk in keys.chunks(SUMMARY_LOOKUP_CHUNK) {
        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT course_id, assignment_id, summary FROM assignment_summaries \
             WHERE (course_id, assignment_id) IN (",
        );
        query.push_values(chunk, |mut row, (course_id, assignment_id)| {
            row.push_bind(*course_id).push_bind(*assignment_id);
        });
        query.push(")");

        let rows: Vec<(i64, i64, String)> = query.build_query_as().fetch_all(db).await?;
        summaries.extend(
            rows.into_iter()
                .map(|(course_id, assignment_id, summary)| ((course_id, assignment_id), summary)),
        );
    }
    Ok(summaries)
}

/// Stores a summary the first time only. Returns whether this call stored it.
pub async fn insert_summary(
    db: &SqlitePool,
    course_id: i64,
    assignment_id: i64,
    summary: &str,
) -> Result<bool, sqlx::Error> {
    let now = Utc::now().to_rfc3339();
    let result = sqlx::query(
        r#"
        INSERT OR IGNORE INTO assignment_summaries (course_id, assignment_id, summary, created_at)
        VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(course_id)
    .bind(assignment_id)
    .bind(summary)
    .bind(now)
    .execute(db)
    .await?
    .rows_affected();

    Ok(result > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create test db");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        pool
    }

    #[tokio::test]
    async fn test_session_round_trip_and_logout() {
        let pool = setup_test_db().await;
        assert!(load_session(&pool).await.unwrap().is_none());

        let session = AuthSession { token: "tok-1".to_string(), user_id: 77 };
        save_session(&pool, &session).await.expect("Failed to save session");
        assert_eq!(load_session(&pool).await.unwrap(), Some(session));

        let replaced = AuthSession { token: "tok-2".to_string(), user_id: 78 };
        save_session(&pool, &replaced).await.expect("Failed to replace session");
        assert_eq!(load_session(&pool).await.unwrap(), Some(replaced));

        assert!(clear_session(&pool).await.unwrap());
        assert!(load_session(&pool).await.unwrap().is_none());
        assert!(!clear_session(&pool).await.unwrap());
    }

    #[tokio::test]
    async fn test_partial_session_is_ignored() {
        let pool = setup_test_db().await;
        sqlx::query("INSERT INTO session_store (key, value, updated_at) VALUES (?1, 'tok', 'now')")
            .bind(TOKEN_KEY)
            .execute(&pool)
            .await
            .unwrap();
        assert!(load_session(&pool).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_summary_is_stored_once() {
        let pool = setup_test_db().await;
        assert!(fetch_summary(&pool, 1, 2).await.unwrap().is_none());

        assert!(insert_summary(&pool, 1, 2, "first").await.unwrap());
        assert!(!insert_summary(&pool, 1, 2, "second").await.unwrap());
        assert_eq!(fetch_summary(&pool, 1, 2).await.unwrap().as_deref(), Some("first"));

        insert_summary(&pool, 3, 2, "other course").await.unwrap();
        insert_summary(&pool, 4, 9, "not requested").await.unwrap();
        let found = fetch_summaries_for(&pool, &[(1, 2), (3, 2), (5, 5)]).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found.get(&(3, 2)).map(String::as_str), Some("other course"));
        assert!(!found.contains_key(&(4, 9)));

        assert!(fetch_summaries_for(&pool, &[]).await.unwrap().is_empty());
    }
}
