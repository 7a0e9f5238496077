#[cfg(test)]
mod tests {
    use crate::auth::{issue_session, purge_expired_sessions, resolve_session};
    use crate::db;
    use crate::error::AppError;
    use crate::tests::memory_pool;
    use sqlx::{Row, SqlitePool};

    async fn insert_user(pool: &SqlitePool, name: &str) -> i64 {
        sqlx::query("INSERT INTO users (username, email, password_hash) VALUES (?1, ?2, 'x')")
            .bind(name)
            .bind(format!("{}@example.com", name))
            .execute(pool)
            .await
            .unwrap()
            .last_insert_rowid()
    }

    async fn insert_topic(pool: &SqlitePool) -> i64 {
        let category = sqlx::query("INSERT INTO categories (name) VALUES ('Languages')")
            .execute(pool)
            .await
            .unwrap()
            .last_insert_rowid();
        sqlx::query("INSERT INTO topics (category_id, name) VALUES (?1, 'Rust')")
            .bind(category)
            .execute(pool)
            .await
            .unwrap()
            .last_insert_rowid()
    }

    #[tokio::test]
    async fn test_init_db_creates_tables() {
        let pool = memory_pool().await;

        let tables: Vec<String> = sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .fetch_all(&pool)
            .await
            .unwrap();

        for expected in [
            "categories",
            "comment_votes",
            "comments",
            "roadmap_votes",
            "roadmaps",
            "sessions",
            "steps",
            "topics",
            "users",
        ] {
            assert!(tables.contains(&expected.to_string()), "missing table {}", expected);
        }
    }

    #[tokio::test]
    async fn test_init_db_is_idempotent() {
        let pool = memory_pool().await;
        insert_user(&pool, "keeper").await;
        db::init_db(&pool).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users").fetch_one(&pool).await.unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_vote_value_constraint_and_uniqueness() {
        let pool = memory_pool().await;
        let user = insert_user(&pool, "voter").await;
        let topic = insert_topic(&pool).await;
        let roadmap = sqlx::query("INSERT INTO roadmaps (topic_id, user_id, title) VALUES (?1, ?2, 'Basics')")
            .bind(topic)
            .bind(user)
            .execute(&pool)
            .await
            .unwrap()
            .last_insert_rowid();

        let bad = sqlx::query("INSERT INTO roadmap_votes (roadmap_id, user_id, value) VALUES (?1, ?2, 5)")
            .bind(roadmap)
            .bind(user)
            .execute(&pool)
            .await;
        assert!(bad.is_err());

        sqlx::query("INSERT INTO roadmap_votes (roadmap_id, user_id, value) VALUES (?1, ?2, 1)")
            .bind(roadmap)
            .bind(user)
            .execute(&pool)
            .await
            .unwrap();
        let duplicate = sqlx::query("INSERT INTO roadmap_votes (roadmap_id, user_id, value) VALUES (?1, ?2, -1)")
            .bind(roadmap)
            .bind(user)
            .execute(&pool)
            .await
            .unwrap_err();
        assert!(matches!(AppError::from(duplicate), AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_foreign_keys_enforced() {
        let pool = memory_pool().await;
        let err = sqlx::query("INSERT INTO topics (category_id, name) VALUES (4242, 'Nowhere')")
            .execute(&pool)
            .await
            .unwrap_err();
        assert!(matches!(AppError::from(err), AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_deleting_parent_comment_reroots_reply() {
        let pool = memory_pool().await;
        let user = insert_user(&pool, "talker").await;
        let topic = insert_topic(&pool).await;

        let parent = sqlx::query("INSERT INTO comments (topic_id, user_id, content) VALUES (?1, ?2, 'parent')")
            .bind(topic)
            .bind(user)
            .execute(&pool)
            .await
            .unwrap()
            .last_insert_rowid();
        let child = sqlx::query(
            "INSERT INTO comments (topic_id, user_id, parent_comment_id, content) VALUES (?1, ?2, ?3, 'child')",
        )
        .bind(topic)
        .bind(user)
        .bind(parent)
        .execute(&pool)
        .await
        .unwrap()
        .last_insert_rowid();

        sqlx::query("DELETE FROM comments WHERE id = ?1").bind(parent).execute(&pool).await.unwrap();

        let row = sqlx::query("SELECT parent_comment_id FROM comments WHERE id = ?1")
            .bind(child)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(row.get::<Option<i64>, _>("parent_comment_id"), None);
    }

    #[tokio::test]
    async fn test_sessions_expire() {
        let pool = memory_pool().await;
        let user = insert_user(&pool, "sleepy").await;

        let live = issue_session(&pool, user, 30).await.unwrap();
        let expired = issue_session(&pool, user, -5).await.unwrap();

        assert_eq!(resolve_session(&pool, live.token).await.unwrap().id, user);
        assert!(matches!(resolve_session(&pool, expired.token).await, Err(AppError::Unauthorized(_))));

        assert_eq!(purge_expired_sessions(&pool).await.unwrap(), 1);
        assert!(resolve_session(&pool, live.token).await.is_ok());
    }

    #[test]
    fn test_now_timestamp_format() {
        let ts = db::now_timestamp();
        assert!(chrono::NaiveDateTime::parse_from_str(&ts, db::TIMESTAMP_FORMAT).is_ok());
        assert!(ts.ends_with('Z'));
    }
}
