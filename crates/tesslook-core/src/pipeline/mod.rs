pub mod config;
mod orchestrator;
mod types;

pub use config::{PipelineConfig, TitleConfig};
pub use orchestrator::{run_direct, run_direct_reported, run_search, run_search_reported};
pub use types::{
    FrameSummary, ItemOutcome, ItemStatus, PipelineOutcome, PipelineReport, PipelineStage,
    ProgressReporter,
};
