//! Like/dislike storage shared by roadmaps and comments.

use sqlx::{Row, SqlitePool};

use crate::error::AppResult;
use crate::types::{UserId, VoteSummary, VoteValue};

#[derive(Debug, Clone, Copy)]
pub enum VoteTarget {
    Roadmap,
    Comment,
}

impl VoteTarget {
    fn table(self) -> &'static str {
        match self {
            VoteTarget::Roadmap => "roadmap_votes",
            VoteTarget::Comment => "comment_votes",
        }
    }

    fn column(self) -> &'static str {
        match self {
            VoteTarget::Roadmap => "roadmap_id",
            VoteTarget::Comment => "comment_id",
        }
    }
}

/// Records, replaces or clears `user_id`'s vote and returns the new totals.
pub async fn apply_vote(
    db: &SqlitePool,
    target: VoteTarget,
    target_id: i64,
    user_id: UserId,
    vote: VoteValue,
) -> AppResult<VoteSummary> {
    let (table, column) = (target.table(), target.column());
    match vote.as_db() {
        Some(value) => {
            let sql = format!(
                "INSERT INTO {table} ({column}, user_id, value) VALUES (?1, ?2, ?3)
                 ON CONFLICT({column}, user_id) DO UPDATE SET value = excluded.value"
            );
            sqlx::query(&sql).bind(target_id).bind(user_id).bind(value).execute(db).await?;
        }
        None => {
            let sql = format!("DELETE FROM {table} WHERE {column} = ?1 AND user_id = ?2");
            sqlx::query(&sql).bind(target_id).bind(user_id).execute(db).await?;
        }
    }
    vote_summary(db, target, target_id, Some(user_id)).await
}

pub async fn vote_summary(
    db: &SqlitePool,
    target: VoteTarget,
    target_id: i64,
    viewer: Option<UserId>,
) -> AppResult<VoteSummary> {
    let sql = format!(
        r#"SELECT COALESCE(SUM(CASE WHEN value = 1 THEN 1 ELSE 0 END), 0) AS likes,
                  COALESCE(SUM(CASE WHEN value = -1 THEN 1 ELSE 0 END), 0) AS dislikes,
                  MAX(CASE WHEN user_id = ?2 THEN value END) AS viewer_value
           FROM {} WHERE {} = ?1"#,
        target.table(),
        target.column()
    );
    let r = sqlx::query(&sql).bind(target_id).bind(viewer).fetch_one(db).await?;
    Ok(VoteSummary {
        likes: r.get::<i64, _>("likes").max(0) as u64,
        dislikes: r.get::<i64, _>("dislikes").max(0) as u64,
        viewer_vote: r.get::<Option<i64>, _>("viewer_value").map(|v| v > 0),
    })
}
