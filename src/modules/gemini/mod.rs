//! Gemini reasoning model client

mod client;
mod sse;

pub use client::{fragments_from_chunk, GeminiClient};
pub use sse::SseDecoder;
