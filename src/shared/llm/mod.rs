//! Helpers for structured output returned by language models.

mod parser;
mod response;

pub use parser::{extract_response, ParseError};
pub use response::LlmResponse;
