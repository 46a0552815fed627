pub mod dtos;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use error::AnalysisError;
pub use handlers::AnalysisState;
pub use services::{
    AnalysisPipeline, AnalysisRequester, PersistenceWriter, ProjectStore, ReasoningModel,
    SessionProvider,
};
