#![allow(clippy::missing_docs_in_private_items, clippy::result_large_err)]

pub mod fetcher;
pub mod filter;
pub mod orchestrator;
pub mod packager;
pub mod pipeline;
pub mod summarizer;
pub mod utils;

pub use orchestrator::{JobHandle, Orchestrator};
pub use pipeline::{AnalysisConfig, AnalysisPipeline, AnalysisServices, AnalysisTuning};
