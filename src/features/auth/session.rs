use async_trait::async_trait;
use std::sync::Arc;

use super::model::{AuthenticatedUser, BearerToken};
use crate::core::error::AppError;
use crate::features::analysis::{AnalysisError, SessionProvider};

/// Turns a bearer token into the user it was issued to
#[async_trait]
pub trait SessionVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<AuthenticatedUser, AppError>;
}

/// Session of one request, re-verified every time it is asked for the user.
///
/// An analysis run can outlive the token it started with; asking the verifier
/// again at insert time turns an expired token into `Unauthenticated`.
pub struct TokenSession {
    verifier: Arc<dyn SessionVerifier>,
    token: BearerToken,
}

impl TokenSession {
    pub fn new(verifier: Arc<dyn SessionVerifier>, token: BearerToken) -> Self {
        Self { verifier, token }
    }
}

#[async_trait]
impl SessionProvider for TokenSession {
    async fn current_user_id(&self) -> Result<String, AnalysisError> {
        self.verifier
            .verify(&self.token.0)
            .await
            .map(|user| user.user_id)
            .map_err(|e| {
                tracing::warn!("Session check failed: {}", e);
                AnalysisError::Unauthenticated
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Accepts tokens until `expire` is flipped
    struct ExpiringVerifier {
        expired: AtomicBool,
    }

    #[async_trait]
    impl SessionVerifier for ExpiringVerifier {
        async fn verify(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
            if self.expired.load(Ordering::SeqCst) {
                return Err(AppError::Unauthorized("ExpiredSignature".to_string()));
            }
            Ok(AuthenticatedUser {
                user_id: format!("user-of-{}", token),
                session_id: None,
            })
        }
    }

    #[tokio::test]
    async fn test_session_is_checked_on_every_call() {
        let verifier = Arc::new(ExpiringVerifier {
            expired: AtomicBool::new(false),
        });
        let session = TokenSession::new(verifier.clone(), BearerToken("abc".to_string()));

        assert_eq!(session.current_user_id().await.unwrap(), "user-of-abc");

        verifier.expired.store(true, Ordering::SeqCst);
        assert!(matches!(
            session.current_user_id().await,
            Err(AnalysisError::Unauthenticated)
        ));
    }
}
