pub mod media;
pub mod project_analysis;
pub mod thought;

pub use media::{MediaFile, MediaKind, UploadStatus, UploadedFile};
pub use project_analysis::{ProjectAnalysis, SpecValue};
pub use thought::{Thought, ThoughtKind};
