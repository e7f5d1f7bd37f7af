//! Answer augmentation: a direct model answer enriched with summaries of
//! web pages found for the same question.
//!
//! The pipeline moves through `AnsweringDirectly → SearchingWeb →
//! Summarizing → Done`, or ends in `Failed` when the direct answer cannot be
//! produced.

mod augmenter;
mod types;

pub use augmenter::{AnswerPipeline, AnswerPipelineBuilder};
pub use types::{AnswerBundle, AskError, PipelineOptions, PipelineState, Question, SourcedSummary};
