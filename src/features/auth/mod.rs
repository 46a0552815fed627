mod jwks;
mod session;
mod validator;

pub mod model;

pub use jwks::JwksClient;
pub use model::{AuthenticatedUser, BearerToken};
pub use session::{SessionVerifier, TokenSession};
pub use validator::JwtValidator;
