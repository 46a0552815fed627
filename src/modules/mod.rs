//! Modules layer - Infrastructure components for external integrations
//!
//! Clients and adapters for object storage and the Gemini model API.

pub mod gemini;
pub mod storage;
