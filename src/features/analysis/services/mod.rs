mod encoder;
mod extractor;
mod pipeline;
mod requester;
mod writer;

pub use encoder::encode_media;
pub use extractor::extract_analysis;
pub use pipeline::{AnalysisPipeline, PipelineOutcome};
pub use requester::{AnalysisRequester, Fragment, FragmentStream, ModelRequest, ReasoningModel};
pub use writer::{project_from_analysis, PersistenceWriter, ProjectStore, SessionProvider};
