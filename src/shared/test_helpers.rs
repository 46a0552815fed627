use async_trait::async_trait;
use axum::{extract::Request, middleware::Next, response::Response, Router};

use crate::core::error::AppError;
use crate::features::auth::model::{AuthenticatedUser, BearerToken};
use crate::features::auth::SessionVerifier;

pub const TEST_USER_ID: &str = "test-user";
pub const TEST_TOKEN: &str = "test-token";

pub fn create_test_user() -> AuthenticatedUser {
    AuthenticatedUser {
        user_id: TEST_USER_ID.to_string(),
        session_id: Some("test-session".to_string()),
    }
}

/// Verifier accepting only `TEST_TOKEN`
pub struct AcceptingVerifier;

#[async_trait]
impl SessionVerifier for AcceptingVerifier {
    async fn verify(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        if token == TEST_TOKEN {
            Ok(create_test_user())
        } else {
            Err(AppError::Unauthorized("Invalid token".to_string()))
        }
    }
}

async fn inject_test_user_middleware(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(create_test_user());
    request
        .extensions_mut()
        .insert(BearerToken(TEST_TOKEN.to_string()));
    next.run(request).await
}

/// Wrap a router so every request is authenticated as `TEST_USER_ID`
pub fn with_test_user(router: Router) -> Router {
    router.layer(axum::middleware::from_fn(inject_test_user_middleware))
}
