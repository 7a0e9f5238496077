//! Roadmaps, their steps and roadmap votes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use sqlx::{sqlite::SqliteRow, Row};

use crate::{
    error::{AppError, AppResult, OptionExt},
    middleware::{
        auth::AuthUser,
        validation::{validate_optional_text, validate_text},
    },
    ranking::{rank, score_all, Scored},
    routes::votes::{apply_vote, VoteTarget},
    state::AppState,
    types::{CreateRoadmapRequest, CreateStepRequest, RoadmapDetail, RoadmapDto, StepDto, VoteRequest, VoteSummary},
};

const ROADMAP_SELECT: &str = r#"SELECT r.id, r.topic_id, r.user_id, u.username AS author, r.title, r.description, r.created_at,
       COALESCE(SUM(CASE WHEN v.value = 1 THEN 1 ELSE 0 END), 0) AS likes,
       COALESCE(SUM(CASE WHEN v.value = -1 THEN 1 ELSE 0 END), 0) AS dislikes
FROM roadmaps r
JOIN users u ON u.id = r.user_id
LEFT JOIN roadmap_votes v ON v.roadmap_id = r.id"#;

const DEFAULT_PAGE: i64 = 50;
const MAX_PAGE: i64 = 200;

fn roadmap_from_row(r: &SqliteRow) -> RoadmapDto {
    RoadmapDto {
        id: r.get("id"),
        topic_id: r.get("topic_id"),
        user_id: r.get("user_id"),
        author: r.get("author"),
        title: r.get("title"),
        description: r.get("description"),
        created_at: r.get("created_at"),
        likes: r.get::<i64, _>("likes").max(0) as u64,
        dislikes: r.get::<i64, _>("dislikes").max(0) as u64,
    }
}

fn step_from_row(r: &SqliteRow) -> StepDto {
    StepDto {
        id: r.get("id"),
        roadmap_id: r.get("roadmap_id"),
        parent_step_id: r.get("parent_step_id"),
        step_title: r.get("step_title"),
        step_description: r.get("step_description"),
        step_order: r.get("step_order"),
        created_at: r.get("created_at"),
    }
}

async fn fetch_roadmap(state: &AppState, id: i64) -> AppResult<Option<RoadmapDto>> {
    let sql = format!("{ROADMAP_SELECT} WHERE r.id = ?1 GROUP BY r.id");
    let row = sqlx::query(&sql).bind(id).fetch_optional(&state.db).await?;
    Ok(row.as_ref().map(roadmap_from_row))
}

async fn fetch_steps(state: &AppState, roadmap_id: i64) -> AppResult<Vec<StepDto>> {
    let rows = sqlx::query(
        r#"SELECT id, roadmap_id, parent_step_id, step_title, step_description, step_order, created_at
           FROM steps WHERE roadmap_id = ?1 ORDER BY step_order ASC, id ASC"#,
    )
    .bind(roadmap_id)
    .fetch_all(&state.db)
    .await?;
    Ok(rows.iter().map(step_from_row).collect())
}

async fn roadmap_owner(state: &AppState, id: i64) -> AppResult<i64> {
    let row = sqlx::query("SELECT user_id FROM roadmaps WHERE id = ?1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_not_found("roadmap")?;
    Ok(row.get("user_id"))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoadmapSort {
    /// Bayesian score, best first.
    #[default]
    Score,
    /// Newest first.
    New,
}

#[derive(Debug, Default, Deserialize)]
pub struct RoadmapQuery {
    pub topic_id: Option<i64>,
    #[serde(default)]
    pub sort: RoadmapSort,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn list_roadmaps(
    State(state): State<AppState>,
    Query(q): Query<RoadmapQuery>,
) -> AppResult<Json<Vec<Scored<RoadmapDto>>>> {
    let limit = q.limit.unwrap_or(DEFAULT_PAGE).clamp(1, MAX_PAGE) as usize;
    let offset = q.offset.unwrap_or(0).max(0) as usize;

    let rows = match q.topic_id {
        Some(tid) => {
            let sql = format!("{ROADMAP_SELECT} WHERE r.topic_id = ?1 GROUP BY r.id ORDER BY r.created_at DESC, r.id DESC");
            sqlx::query(&sql).bind(tid).fetch_all(&state.db).await?
        }
        None => {
            let sql = format!("{ROADMAP_SELECT} GROUP BY r.id ORDER BY r.created_at DESC, r.id DESC");
            sqlx::query(&sql).fetch_all(&state.db).await?
        }
    };
    let roadmaps: Vec<RoadmapDto> = rows.iter().map(roadmap_from_row).collect();

    // Score ordering needs the full set, so paging happens after ranking.
    let scored = match q.sort {
        RoadmapSort::Score => {
            state.metrics.inc_rankings_computed();
            rank(roadmaps, &state.ranking)?
        }
        RoadmapSort::New => score_all(roadmaps, &state.ranking)?,
    };
    Ok(Json(scored.into_iter().skip(offset).take(limit).collect()))
}

pub async fn create_roadmap(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<CreateRoadmapRequest>,
) -> AppResult<impl IntoResponse> {
    let limits = &state.config.limits;
    let title = validate_text("title", &req.title, limits.max_title_chars)?;
    let description = validate_optional_text("description", req.description.as_deref(), limits.max_comment_chars)?;

    let topic = sqlx::query("SELECT 1 FROM topics WHERE id = ?1").bind(req.topic_id).fetch_optional(&state.db).await?;
    if topic.is_none() {
        return Err(AppError::NotFound("topic not found".into()));
    }

    let id = sqlx::query("INSERT INTO roadmaps (topic_id, user_id, title, description) VALUES (?1, ?2, ?3, ?4)")
        .bind(req.topic_id)
        .bind(user.id)
        .bind(&title)
        .bind(&description)
        .execute(&state.db)
        .await?
        .last_insert_rowid();

    state.metrics.inc_roadmaps_created();
    tracing::info!(roadmap_id = id, topic_id = req.topic_id, user_id = user.id, "roadmap created");

    let roadmap = fetch_roadmap(&state, id).await?.ok_or_not_found("roadmap")?;
    let mut scored = score_all(vec![roadmap], &state.ranking)?;
    let roadmap = scored.pop().ok_or_not_found("roadmap")?;
    Ok((StatusCode::CREATED, Json(roadmap)))
}

pub async fn get_roadmap(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<RoadmapDetail>> {
    let roadmap = fetch_roadmap(&state, id).await?.ok_or_not_found("roadmap")?;
    let steps = fetch_steps(&state, id).await?;
    let roadmap = score_all(vec![roadmap], &state.ranking)?.pop().ok_or_not_found("roadmap")?;
    Ok(Json(RoadmapDetail { roadmap, steps }))
}

/// Owners and admins only. Steps, votes go with it.
pub async fn delete_roadmap(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    let owner = roadmap_owner(&state, id).await?;
    if owner != user.id && user.role != "admin" {
        return Err(AppError::Forbidden("only the author can delete this roadmap".into()));
    }
    sqlx::query("DELETE FROM roadmaps WHERE id = ?1").bind(id).execute(&state.db).await?;
    tracing::info!(roadmap_id = id, user_id = user.id, "roadmap deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_steps(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<Vec<StepDto>>> {
    roadmap_owner(&state, id).await?;
    Ok(Json(fetch_steps(&state, id).await?))
}

pub async fn create_step(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(roadmap_id): Path<i64>,
    Json(req): Json<CreateStepRequest>,
) -> AppResult<impl IntoResponse> {
    let owner = roadmap_owner(&state, roadmap_id).await?;
    if owner != user.id {
        return Err(AppError::Forbidden("only the author can edit this roadmap".into()));
    }
    let limits = &state.config.limits;
    let title = validate_text("step_title", &req.step_title, limits.max_title_chars)?;
    let description =
        validate_optional_text("step_description", req.step_description.as_deref(), limits.max_comment_chars)?;

    if let Some(parent) = req.parent_step_id {
        let found = sqlx::query("SELECT 1 FROM steps WHERE id = ?1 AND roadmap_id = ?2")
            .bind(parent)
            .bind(roadmap_id)
            .fetch_optional(&state.db)
            .await?;
        if found.is_none() {
            return Err(AppError::BadRequest("parent step does not belong to this roadmap".into()));
        }
    }

    let row = sqlx::query(
        r#"INSERT INTO steps (roadmap_id, parent_step_id, step_title, step_description, step_order)
           VALUES (?1, ?2, ?3, ?4, ?5)
           RETURNING id, roadmap_id, parent_step_id, step_title, step_description, step_order, created_at"#,
    )
    .bind(roadmap_id)
    .bind(req.parent_step_id)
    .bind(&title)
    .bind(&description)
    .bind(req.step_order)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(step_from_row(&row))))
}

pub async fn vote_roadmap(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<VoteRequest>,
) -> AppResult<Json<VoteSummary>> {
    roadmap_owner(&state, id).await?;
    let summary = apply_vote(&state.db, VoteTarget::Roadmap, id, user.id, req.vote).await?;
    state.metrics.inc_votes_cast();
    tracing::debug!(roadmap_id = id, user_id = user.id, vote = ?req.vote, "roadmap vote recorded");
    Ok(Json(summary))
}
