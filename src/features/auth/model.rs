use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    /// Subject of the access token, the owner id on every row
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Raw bearer token of the current request
///
/// Kept so long-running work can re-check the session when it commits.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);
