mod analyze_dto;

pub use analyze_dto::{AnalyzeMediaDto, AnalyzeResponseDto};
