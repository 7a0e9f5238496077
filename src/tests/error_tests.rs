#[cfg(test)]
mod tests {
    use crate::error::{AppError, AppResult, OptionExt};
    use crate::ranking::RankError;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use http_body_util::BodyExt;
    use serde_json::Value;

    async fn body_json(error: AppError) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let error = AppError::BadRequest("Invalid input".to_string());
        assert_eq!(format!("{}", error), "Bad request: Invalid input");

        let error = AppError::Forbidden("not yours".to_string());
        assert_eq!(format!("{}", error), "Forbidden: not yours");

        let error = AppError::RateLimited { retry_after_seconds: 60 };
        assert_eq!(format!("{}", error), "Rate limited. Retry after 60 seconds");
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT),
            (AppError::ServiceUnavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (AppError::Database("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (AppError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (AppError::RateLimited { retry_after_seconds: 30 }, StatusCode::TOO_MANY_REQUESTS),
            (AppError::validation("title", "too long"), StatusCode::BAD_REQUEST),
        ];
        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[tokio::test]
    async fn test_error_envelope() {
        let (status, body) = body_json(AppError::validation("content", "Must not be empty")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["details"]["field"], "content");
        assert_eq!(body["error"]["details"]["message"], "Must not be empty");
        assert!(body["timestamp"].is_string());

        let (_, body) = body_json(AppError::RateLimited { retry_after_seconds: 12 }).await;
        assert_eq!(body["error"]["details"]["retry_after_seconds"], 12);
    }

    #[tokio::test]
    async fn test_internal_error_hides_cause() {
        let (status, body) = body_json(AppError::from(anyhow::anyhow!("secret connection string"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
        assert!(!body.to_string().contains("secret"));
        assert!(body["error"]["details"]["error_id"].is_string());
    }

    #[test]
    fn test_from_sqlx_error() {
        assert!(matches!(AppError::from(sqlx::Error::RowNotFound), AppError::NotFound(_)));
        assert!(matches!(AppError::from(sqlx::Error::PoolTimedOut), AppError::ServiceUnavailable(_)));
    }

    #[test]
    fn test_from_rank_error() {
        let error: AppError = RankError::DivisionByZero { name: "silent".into() }.into();
        match error {
            AppError::InvalidInput(msg) => assert!(msg.contains("silent")),
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_option_ext() {
        let found: AppResult<i32> = Some(7).ok_or_not_found("roadmap");
        assert_eq!(found.unwrap(), 7);

        let missing: AppResult<i32> = None.ok_or_not_found("roadmap");
        match missing {
            Err(AppError::NotFound(msg)) => assert_eq!(msg, "roadmap not found"),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }
}
