pub mod project_handler;

pub use project_handler::*;
