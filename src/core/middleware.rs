use crate::core::error::AppError;
use crate::features::auth::{BearerToken, SessionVerifier};
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::prelude::*;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::Span;
use uuid::Uuid;

/// Request ID generator using UUID v7 (time-ordered)
#[derive(Clone, Copy)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Custom MakeSpan that includes request_id in the tracing span
#[derive(Clone, Debug)]
pub struct MakeSpanWithRequestId;

impl<B> tower_http::trace::MakeSpan<B> for MakeSpanWithRequestId {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");

        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    }
}

pub fn cors_layer(allowed_origins: Vec<String>) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if allowed_origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(AllowOrigin::list(origins))
    }
}

fn basic_auth_matches(req: &Request, credentials: &str) -> bool {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Basic "))
        .and_then(|encoded| BASE64_STANDARD.decode(encoded).ok())
        .and_then(|decoded| String::from_utf8(decoded).ok())
        .is_some_and(|creds| creds == credentials)
}

/// Basic auth guard for the Swagger UI
pub async fn basic_auth_middleware(
    State(credentials): State<Arc<String>>,
    req: Request,
    next: Next,
) -> Response {
    if basic_auth_matches(&req, &credentials) {
        return next.run(req).await;
    }

    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Basic realm=\"Swagger UI\"")],
        Body::from("Unauthorized"),
    )
        .into_response()
}

/// Pull the token out of an `Authorization: Bearer ...` header
pub fn bearer_token(req: &Request) -> Result<&str, AppError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization header format".to_string()))
}

pub async fn auth_middleware(
    State(verifier): State<Arc<dyn SessionVerifier>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&req)?.to_string();

    let user = verifier.verify(&token).await?;

    req.extensions_mut().insert(user);
    req.extensions_mut().insert(BearerToken(token));
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with_auth(value: &str) -> Request {
        Request::builder()
            .header(header::AUTHORIZATION, value)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_bearer_token_extracted() {
        let req = request_with_auth("Bearer abc.def.ghi");
        assert_eq!(bearer_token(&req).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_bearer_token_rejects_other_schemes() {
        let req = request_with_auth("Basic dXNlcjpwYXNz");
        assert!(matches!(bearer_token(&req), Err(AppError::Unauthorized(_))));

        let req = request_with_auth("Bearer   ");
        assert!(bearer_token(&req).is_err());

        let req = Request::builder().body(Body::empty()).unwrap();
        assert!(bearer_token(&req).is_err());
    }

    fn protected_router() -> axum::Router {
        use crate::shared::test_helpers::AcceptingVerifier;

        async fn whoami(user: crate::features::auth::AuthenticatedUser) -> String {
            user.user_id
        }

        let verifier: Arc<dyn SessionVerifier> = Arc::new(AcceptingVerifier);
        axum::Router::new()
            .route("/whoami", axum::routing::get(whoami))
            .route_layer(axum::middleware::from_fn_with_state(verifier, auth_middleware))
    }

    #[tokio::test]
    async fn test_auth_middleware_injects_user() {
        use tower::ServiceExt;

        let req = Request::builder()
            .uri("/whoami")
            .header(header::AUTHORIZATION, "Bearer test-token")
            .body(Body::empty())
            .unwrap();
        let response = protected_router().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let req = Request::builder()
            .uri("/whoami")
            .header(header::AUTHORIZATION, "Bearer forged")
            .body(Body::empty())
            .unwrap();
        let response = protected_router().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_basic_auth_matches() {
        // "docs:secret"
        let req = request_with_auth("Basic ZG9jczpzZWNyZXQ=");
        assert!(basic_auth_matches(&req, "docs:secret"));
        assert!(!basic_auth_matches(&req, "docs:other"));
    }
}
