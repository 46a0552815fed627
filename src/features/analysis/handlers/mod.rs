pub mod analysis_handler;

pub use analysis_handler::*;
