//! Categories and topics.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use sqlx::{sqlite::SqliteRow, Row};

use crate::{
    error::{AppError, AppResult, OptionExt},
    middleware::{
        auth::AuthUser,
        validation::{validate_optional_text, validate_text},
    },
    ranking::{rank, score_all, Scored},
    state::AppState,
    types::{CategoryDto, CreateCategoryRequest, CreateTopicRequest, TopicDto},
};

const TOPIC_SELECT: &str = r#"SELECT t.id, t.category_id, t.name, t.description, t.created_at,
       COALESCE(SUM(CASE WHEN v.value = 1 THEN 1 ELSE 0 END), 0) AS likes,
       COALESCE(SUM(CASE WHEN v.value = -1 THEN 1 ELSE 0 END), 0) AS dislikes
FROM topics t
LEFT JOIN roadmaps r ON r.topic_id = t.id
LEFT JOIN roadmap_votes v ON v.roadmap_id = r.id"#;

fn topic_from_row(r: &SqliteRow) -> TopicDto {
    TopicDto {
        id: r.get("id"),
        category_id: r.get("category_id"),
        name: r.get("name"),
        description: r.get("description"),
        created_at: r.get("created_at"),
        likes: r.get::<i64, _>("likes").max(0) as u64,
        dislikes: r.get::<i64, _>("dislikes").max(0) as u64,
    }
}

pub(crate) async fn fetch_topic(state: &AppState, id: i64) -> AppResult<Option<TopicDto>> {
    let sql = format!("{TOPIC_SELECT} WHERE t.id = ?1 GROUP BY t.id");
    let row = sqlx::query(&sql).bind(id).fetch_optional(&state.db).await?;
    Ok(row.as_ref().map(topic_from_row))
}

async fn category_exists(state: &AppState, id: i64) -> AppResult<bool> {
    let found = sqlx::query("SELECT 1 FROM categories WHERE id = ?1").bind(id).fetch_optional(&state.db).await?;
    Ok(found.is_some())
}

// ---------------------- categories ----------------------

pub async fn list_categories(State(state): State<AppState>) -> AppResult<Json<Vec<CategoryDto>>> {
    let rows = sqlx::query("SELECT id, name FROM categories ORDER BY name ASC").fetch_all(&state.db).await?;
    Ok(Json(rows.into_iter().map(|r| CategoryDto { id: r.get("id"), name: r.get("name") }).collect()))
}

pub async fn create_category(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<CreateCategoryRequest>,
) -> AppResult<impl IntoResponse> {
    let name = validate_text("name", &req.name, state.config.limits.max_name_chars)?;
    let res = sqlx::query("INSERT INTO categories (name) VALUES (?1)").bind(&name).execute(&state.db).await;
    let id = match res {
        Ok(done) => done.last_insert_rowid(),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Err(AppError::Conflict(format!("Category '{}' already exists", name)));
        }
        Err(e) => return Err(e.into()),
    };
    tracing::info!(category_id = id, user_id = user.id, "category created");
    Ok((StatusCode::CREATED, Json(CategoryDto { id, name })))
}

pub async fn list_category_topics(
    State(state): State<AppState>,
    Path(category_id): Path<i64>,
) -> AppResult<Json<Vec<Scored<TopicDto>>>> {
    if !category_exists(&state, category_id).await? {
        return Err(AppError::NotFound("category not found".into()));
    }
    let sql = format!("{TOPIC_SELECT} WHERE t.category_id = ?1 GROUP BY t.id ORDER BY t.name ASC");
    let rows = sqlx::query(&sql).bind(category_id).fetch_all(&state.db).await?;
    let topics: Vec<TopicDto> = rows.iter().map(topic_from_row).collect();
    Ok(Json(score_all(topics, &state.ranking)?))
}

// ---------------------- topics ----------------------

#[derive(Debug, Default, serde::Deserialize)]
pub struct TopicQuery {
    pub category_id: Option<i64>,
    /// Order by Bayesian score of the topic's roadmap votes instead of name.
    pub ranked: Option<bool>,
}

pub async fn list_topics(
    State(state): State<AppState>,
    Query(q): Query<TopicQuery>,
) -> AppResult<Json<Vec<Scored<TopicDto>>>> {
    let rows = match q.category_id {
        Some(cid) => {
            let sql = format!("{TOPIC_SELECT} WHERE t.category_id = ?1 GROUP BY t.id ORDER BY t.name ASC");
            sqlx::query(&sql).bind(cid).fetch_all(&state.db).await?
        }
        None => {
            let sql = format!("{TOPIC_SELECT} GROUP BY t.id ORDER BY t.name ASC");
            sqlx::query(&sql).fetch_all(&state.db).await?
        }
    };
    let topics: Vec<TopicDto> = rows.iter().map(topic_from_row).collect();

    let items = if q.ranked.unwrap_or(false) {
        state.metrics.inc_rankings_computed();
        rank(topics, &state.ranking)?
    } else {
        score_all(topics, &state.ranking)?
    };
    Ok(Json(items))
}

pub async fn get_topic(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<Scored<TopicDto>>> {
    let topic = fetch_topic(&state, id).await?.ok_or_not_found("topic")?;
    let mut scored = score_all(vec![topic], &state.ranking)?;
    scored.pop().map(Json).ok_or_not_found("topic")
}

pub async fn create_topic(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<CreateTopicRequest>,
) -> AppResult<impl IntoResponse> {
    let limits = &state.config.limits;
    let name = validate_text("name", &req.name, limits.max_name_chars)?;
    let description = validate_optional_text("description", req.description.as_deref(), limits.max_comment_chars)?;
    if !category_exists(&state, req.category_id).await? {
        return Err(AppError::NotFound("category not found".into()));
    }

    let id = sqlx::query("INSERT INTO topics (category_id, name, description) VALUES (?1, ?2, ?3)")
        .bind(req.category_id)
        .bind(&name)
        .bind(&description)
        .execute(&state.db)
        .await?
        .last_insert_rowid();
    tracing::info!(topic_id = id, user_id = user.id, "topic created");

    let topic = fetch_topic(&state, id).await?.ok_or_not_found("topic")?;
    Ok((StatusCode::CREATED, Json(topic)))
}
