mod project_service;

pub use project_service::{like_pattern, ProjectService};
