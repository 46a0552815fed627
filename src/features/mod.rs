pub mod analysis;
pub mod auth;
pub mod profiles;
pub mod projects;
