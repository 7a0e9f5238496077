use axum::{
    extract::{Request, State},
    http::{header, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Rejects bodies whose declared `Content-Length` exceeds `limits.max_body_bytes`
/// before any handler starts reading them.
///
/// The router additionally carries a `DefaultBodyLimit` with the same value for
/// chunked uploads without a length header.
pub async fn validate_request_middleware(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if matches!(*req.method(), Method::POST | Method::PUT | Method::PATCH) {
        let max_body = state.config.limits.max_body_bytes;
        let declared = req
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<usize>().ok());
        if let Some(length) = declared {
            if length > max_body {
                return (
                    StatusCode::PAYLOAD_TOO_LARGE,
                    Json(json!({
                        "error": {
                            "code": "PAYLOAD_TOO_LARGE",
                            "message": format!("Request body exceeds maximum size of {} bytes", max_body),
                        },
                        "status": 413,
                    })),
                )
                    .into_response();
            }
        }
    }

    next.run(req).await
}

pub fn validate_username(username: &str) -> AppResult<()> {
    let len = username.chars().count();
    if !(3..=100).contains(&len) {
        return Err(AppError::validation("username", "Username must be 3 to 100 characters long"));
    }
    if !username.chars().all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.')) {
        return Err(AppError::validation(
            "username",
            "Username may only contain letters, digits, '_', '-' and '.'",
        ));
    }
    Ok(())
}

/// Shape check only; deliverability is not verified.
pub fn validate_email(email: &str) -> AppResult<()> {
    let invalid = || AppError::validation("email", "Not a valid email address");
    if email.len() > 100 || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && tld.len() >= 2 => Ok(()),
        _ => Err(invalid()),
    }
}

pub fn validate_password(password: &str) -> AppResult<()> {
    if password.chars().count() < 8 {
        return Err(AppError::validation("password", "Password must be at least 8 characters long"));
    }
    // bcrypt ignores everything past 72 bytes
    if password.len() > 72 {
        return Err(AppError::validation("password", "Password must be at most 72 bytes long"));
    }
    Ok(())
}

/// Trims `value` and checks it is non-empty and at most `max_chars` long.
pub fn validate_text(field: &str, value: &str, max_chars: usize) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(field, "Must not be empty"));
    }
    if trimmed.chars().count() > max_chars {
        return Err(AppError::validation(field, format!("Must be at most {} characters", max_chars)));
    }
    Ok(trimmed.to_string())
}

/// Optional variant of [`validate_text`]; blank input becomes `None`.
pub fn validate_optional_text(field: &str, value: Option<&str>, max_chars: usize) -> AppResult<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => validate_text(field, v, max_chars).map(Some),
    }
}

/// Sanitizes user input for logging purposes.
pub fn sanitize_for_logging(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .take(200)
        .collect::<String>()
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_validation() {
        assert!(validate_username("ana_maria").is_ok());
        assert!(validate_username("jo").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_email_validation() {
        assert!(validate_email("learner@example.org").is_ok());
        assert!(validate_email("no-at-sign.org").is_err());
        assert!(validate_email("@example.org").is_err());
        assert!(validate_email("a@b@example.org").is_err());
        assert!(validate_email("a@localhost").is_err());
        assert!(validate_email("a b@example.org").is_err());
    }

    #[test]
    fn test_password_validation() {
        assert!(validate_password("correct horse").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password(&"p".repeat(73)).is_err());
    }

    #[test]
    fn test_text_validation() {
        assert_eq!(validate_text("title", "  Rust  ", 10).unwrap(), "Rust");
        assert!(validate_text("title", "   ", 10).is_err());
        assert!(validate_text("title", "abcdefghijk", 10).is_err());

        assert_eq!(validate_optional_text("description", None, 5).unwrap(), None);
        assert_eq!(validate_optional_text("description", Some("  "), 5).unwrap(), None);
        assert_eq!(validate_optional_text("description", Some("ok"), 5).unwrap(), Some("ok".to_string()));
        assert!(validate_optional_text("description", Some("too long"), 5).is_err());
    }

    #[test]
    fn test_sanitize_for_logging() {
        assert_eq!(sanitize_for_logging("normal text"), "normal text");
        let sanitized = sanitize_for_logging("text\x00with\x01control");
        assert!(!sanitized.contains('\x00'));
        assert!(!sanitized.contains('\x01'));
        assert_eq!(sanitize_for_logging(&"a".repeat(300)).len(), 200);
    }
}
