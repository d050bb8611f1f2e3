//! Analysis Context - AI 氛围/主题分析上下文

mod entities;
mod errors;

pub use entities::{
    AnalysisId, AnalysisSource, BookAnalysis, IntensityLevel, Mood, Pace, Setting, TimeOfDay,
    METADATA_ONLY_CONFIDENCE_CEILING,
};
pub use errors::AnalysisError;
