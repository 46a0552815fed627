use super::model::AuthenticatedUser;
use super::session::SessionVerifier;
use crate::core::error::AppError;
use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::jwks::JwksClient;

/// Signing algorithms accepted from the identity provider
const ALLOWED_ALGORITHMS: &[Algorithm] = &[Algorithm::RS256, Algorithm::ES256];

pub struct JwtValidator {
    jwks_client: Arc<JwksClient>,
    issuer: String,
    audience: String,
    leeway: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct Claims {
    sub: String,
    #[serde(rename = "iss")]
    _iss: String,
    #[serde(rename = "aud")]
    _aud: AudienceClaim,
    #[serde(rename = "exp")]
    _exp: u64,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    role: Option<String>,
}

/// Audience can be either a single string or an array of strings
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
#[allow(dead_code)]
enum AudienceClaim {
    Single(String),
    Multiple(Vec<String>),
}

impl JwtValidator {
    pub fn new(
        jwks_client: Arc<JwksClient>,
        issuer: String,
        audience: String,
        leeway: Duration,
    ) -> Self {
        Self {
            jwks_client,
            issuer,
            audience,
            leeway: leeway.as_secs(),
        }
    }

    pub async fn validate_token(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let header = decode_header(token).map_err(|e| AppError::Unauthorized(e.to_string()))?;

        if !ALLOWED_ALGORITHMS.contains(&header.alg) {
            return Err(AppError::Unauthorized(format!(
                "Unsupported algorithm: {:?}",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| AppError::Unauthorized("Missing kid in token header".to_string()))?;

        let decoding_key = self
            .jwks_client
            .get_key(&kid)
            .await
            .map_err(|e| AppError::Unauthorized(e.to_string()))?;

        let mut validation = Validation::new(header.alg);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.leeway = self.leeway;
        validation.validate_nbf = true;

        let claims = decode::<Claims>(token, &decoding_key, &validation)
            .map_err(|e| AppError::Unauthorized(e.to_string()))?
            .claims;

        // Anonymous sign-ins carry a valid token but no account
        if claims.role.as_deref() == Some("anon") {
            return Err(AppError::Unauthorized(
                "Anonymous sessions cannot access this resource".to_string(),
            ));
        }

        Ok(AuthenticatedUser {
            user_id: claims.sub,
            session_id: claims.session_id,
        })
    }
}

#[async_trait]
impl SessionVerifier for JwtValidator {
    async fn verify(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        self.validate_token(token).await
    }
}
