use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use sqlx::Row;

use crate::{
    auth::{hash_password, issue_session, revoke_session, verify_password},
    error::{AppError, AppResult, OptionExt},
    middleware::{
        auth::AuthUser,
        ip::ClientIp,
        validation::{sanitize_for_logging, validate_email, validate_password, validate_username},
    },
    state::AppState,
    types::{LoginRequest, LoginResponse, RegisterRequest, UserProfile},
};

pub async fn register(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Json(req): Json<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    state.rate_limiter.check_endpoint_limit("/register", ip).await?;

    let username = req.username.trim().to_string();
    let email = req.email.trim().to_lowercase();
    validate_username(&username)?;
    validate_email(&email)?;
    validate_password(&req.password)?;

    let hash = hash_password(req.password, state.config.auth.bcrypt_cost).await?;
    let res = sqlx::query("INSERT INTO users (username, email, password_hash) VALUES (?1, ?2, ?3)")
        .bind(&username)
        .bind(&email)
        .bind(hash)
        .execute(&state.db)
        .await;
    let id = match res {
        Ok(done) => done.last_insert_rowid(),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Err(AppError::Conflict("User already exists".into()));
        }
        Err(e) => return Err(e.into()),
    };

    state.metrics.inc_users_registered();
    tracing::info!(user_id = id, username = %sanitize_for_logging(&username), "user registered");
    Ok((StatusCode::CREATED, Json(json!({ "message": "User registered successfully", "id": id }))))
}

pub async fn login(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    state.rate_limiter.check_endpoint_limit("/login", ip).await?;

    let row = sqlx::query("SELECT id, password_hash FROM users WHERE username = ?1")
        .bind(req.username.trim())
        .fetch_optional(&state.db)
        .await?;

    let verified = match &row {
        Some(r) => verify_password(req.password, r.get::<String, _>("password_hash")).await?,
        None => false,
    };
    let user_id = match row {
        Some(r) if verified => r.get::<i64, _>("id"),
        _ => {
            state.metrics.inc_login(false);
            tracing::info!(%ip, username = %sanitize_for_logging(&req.username), "login rejected");
            return Err(AppError::Unauthorized("Invalid credentials".into()));
        }
    };

    let session = issue_session(&state.db, user_id, state.config.auth.token_ttl_minutes).await?;
    state.metrics.inc_login(true);
    tracing::debug!(user_id, "session issued");
    Ok(Json(LoginResponse {
        access_token: session.token.to_string(),
        token_type: "bearer".into(),
        expires_at: session.expires_at,
    }))
}

pub async fn logout(State(state): State<AppState>, AuthUser(user): AuthUser) -> AppResult<StatusCode> {
    revoke_session(&state.db, user.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(State(state): State<AppState>, AuthUser(user): AuthUser) -> AppResult<Json<UserProfile>> {
    let r = sqlx::query("SELECT id, username, email, role, created_at FROM users WHERE id = ?1")
        .bind(user.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_not_found("user")?;

    Ok(Json(UserProfile {
        id: r.get("id"),
        username: r.get("username"),
        email: r.get("email"),
        role: r.get("role"),
        created_at: r.get("created_at"),
    }))
}
