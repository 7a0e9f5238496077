//! Topic discussions.

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use sqlx::{sqlite::SqliteRow, Row};

use crate::{
    db::now_timestamp,
    error::{AppError, AppResult, OptionExt},
    middleware::{
        auth::{AuthUser, MaybeAuthUser},
        validation::{sanitize_for_logging, validate_text},
    },
    routes::votes::{apply_vote, VoteTarget},
    state::AppState,
    thread::{build_tree, CommentNode, CommentRecord, VoteTally},
    types::{CommentDto, CreateCommentRequest, UpdateCommentRequest, VoteRequest, VoteSummary},
};

const COMMENT_COLUMNS: &str = "id, topic_id, user_id, parent_comment_id, content, edited, created_at";

fn comment_from_row(r: &SqliteRow) -> CommentDto {
    CommentDto {
        id: r.get("id"),
        topic_id: r.get("topic_id"),
        user_id: r.get("user_id"),
        parent_comment_id: r.get("parent_comment_id"),
        content: r.get("content"),
        edited: r.get::<i64, _>("edited") != 0,
        created_at: r.get("created_at"),
    }
}

async fn comment_author(state: &AppState, id: i64) -> AppResult<i64> {
    let row = sqlx::query("SELECT user_id FROM comments WHERE id = ?1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_not_found("comment")?;
    Ok(row.get("user_id"))
}

/// Level of comment `id` in its thread, top-level comments being 1.
///
/// The walk up the parent chain stops after `cap + 1` levels.
async fn comment_depth(state: &AppState, id: i64, cap: u32) -> AppResult<i64> {
    let row = sqlx::query(
        r#"WITH RECURSIVE ancestors(id, parent_id, depth) AS (
               SELECT id, parent_comment_id, 1 FROM comments WHERE id = ?1
               UNION ALL
               SELECT c.id, c.parent_comment_id, a.depth + 1
               FROM comments c JOIN ancestors a ON c.id = a.parent_id
               WHERE a.depth <= ?2
           )
           SELECT COALESCE(MAX(depth), 0) AS depth FROM ancestors"#,
    )
    .bind(id)
    .bind(i64::from(cap))
    .fetch_one(&state.db)
    .await?;
    Ok(row.get("depth"))
}

/// The whole discussion of a topic as a reply tree, oldest first.
///
/// Unknown topics have no comments, so they answer with an empty forest.
pub async fn topic_comments(
    State(state): State<AppState>,
    Path(topic_id): Path<i64>,
    MaybeAuthUser(viewer): MaybeAuthUser,
) -> AppResult<Json<Vec<CommentNode>>> {
    let viewer_id = viewer.as_ref().map(|u| u.id);

    let rows = sqlx::query(
        r#"SELECT c.id, c.user_id, u.username, c.content, c.created_at, c.edited, c.parent_comment_id
           FROM comments c JOIN users u ON u.id = c.user_id
           WHERE c.topic_id = ?1
           ORDER BY c.created_at ASC, c.id ASC"#,
    )
    .bind(topic_id)
    .fetch_all(&state.db)
    .await?;
    let records: Vec<CommentRecord> = rows
        .iter()
        .map(|r| CommentRecord {
            id: r.get("id"),
            author_id: r.get("user_id"),
            author: r.get("username"),
            text: r.get("content"),
            created_at: r.get("created_at"),
            edited: r.get::<i64, _>("edited") != 0,
            parent_id: r.get("parent_comment_id"),
        })
        .collect();

    // One aggregate over the topic instead of a lookup per comment.
    let tally_rows = sqlx::query(
        r#"SELECT cv.comment_id,
                  SUM(CASE WHEN cv.value = 1 THEN 1 ELSE 0 END) AS likes,
                  SUM(CASE WHEN cv.value = -1 THEN 1 ELSE 0 END) AS dislikes,
                  MAX(CASE WHEN cv.user_id = ?2 THEN cv.value END) AS viewer_value
           FROM comment_votes cv JOIN comments c ON c.id = cv.comment_id
           WHERE c.topic_id = ?1
           GROUP BY cv.comment_id"#,
    )
    .bind(topic_id)
    .bind(viewer_id)
    .fetch_all(&state.db)
    .await?;
    let tallies: HashMap<i64, VoteTally> = tally_rows
        .iter()
        .map(|r| {
            let tally = VoteTally {
                likes: r.get::<i64, _>("likes").max(0) as u64,
                dislikes: r.get::<i64, _>("dislikes").max(0) as u64,
                viewer_vote: r.get::<Option<i64>, _>("viewer_value").map(|v| v > 0),
            };
            (r.get::<i64, _>("comment_id"), tally)
        })
        .collect();

    Ok(Json(build_tree(&records, &tallies, viewer_id)))
}

pub async fn create_comment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<CreateCommentRequest>,
) -> AppResult<impl IntoResponse> {
    let content = validate_text("content", &req.content, state.config.limits.max_comment_chars)?;

    let topic =
        sqlx::query("SELECT 1 FROM topics WHERE id = ?1").bind(req.topic_id).fetch_optional(&state.db).await?;
    if topic.is_none() {
        return Err(AppError::NotFound("topic not found".into()));
    }
    if let Some(parent) = req.parent_comment_id {
        let found = sqlx::query("SELECT 1 FROM comments WHERE id = ?1 AND topic_id = ?2")
            .bind(parent)
            .bind(req.topic_id)
            .fetch_optional(&state.db)
            .await?;
        if found.is_none() {
            return Err(AppError::BadRequest("parent comment does not belong to this topic".into()));
        }
        let max_depth = state.config.limits.max_reply_depth;
        if comment_depth(&state, parent, max_depth).await? >= i64::from(max_depth) {
            return Err(AppError::BadRequest(format!("replies may nest at most {} levels deep", max_depth)));
        }
    }

    let sql = format!(
        "INSERT INTO comments (topic_id, user_id, parent_comment_id, content) VALUES (?1, ?2, ?3, ?4) RETURNING {COMMENT_COLUMNS}"
    );
    let row = sqlx::query(&sql)
        .bind(req.topic_id)
        .bind(user.id)
        .bind(req.parent_comment_id)
        .bind(&content)
        .fetch_one(&state.db)
        .await?;
    let comment = comment_from_row(&row);

    state.metrics.inc_comments_posted();
    tracing::info!(
        comment_id = comment.id,
        topic_id = comment.topic_id,
        user_id = user.id,
        preview = %sanitize_for_logging(&content),
        "comment posted"
    );
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn update_comment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateCommentRequest>,
) -> AppResult<Json<CommentDto>> {
    let content = validate_text("content", &req.content, state.config.limits.max_comment_chars)?;
    if comment_author(&state, id).await? != user.id {
        return Err(AppError::Forbidden("only the author can edit this comment".into()));
    }

    let sql = format!("UPDATE comments SET content = ?1, edited = 1, updated_at = ?2 WHERE id = ?3 RETURNING {COMMENT_COLUMNS}");
    let row = sqlx::query(&sql).bind(&content).bind(now_timestamp()).bind(id).fetch_one(&state.db).await?;
    tracing::debug!(comment_id = id, user_id = user.id, "comment edited");
    Ok(Json(comment_from_row(&row)))
}

/// Replies of a deleted comment stay and become top-level.
pub async fn delete_comment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    if comment_author(&state, id).await? != user.id && user.role != "admin" {
        return Err(AppError::Forbidden("only the author can delete this comment".into()));
    }
    sqlx::query("DELETE FROM comments WHERE id = ?1").bind(id).execute(&state.db).await?;
    tracing::info!(comment_id = id, user_id = user.id, "comment deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn vote_comment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<VoteRequest>,
) -> AppResult<Json<VoteSummary>> {
    comment_author(&state, id).await?;
    let summary = apply_vote(&state.db, VoteTarget::Comment, id, user.id, req.vote).await?;
    state.metrics.inc_votes_cast();
    Ok(Json(summary))
}
