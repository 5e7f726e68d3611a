//! Energy-Consumption Metric Extraction & Evaluation
//!
//! This crate extracts structured energy-consumption metrics from PDF
//! reports with a hosted generative-model API and evaluates the extracted
//! records against ground truth supplied by subject-matter experts.
//!
//! # Features
//!
//! - Single-step (one call) and multi-step (four chained calls) extraction
//!   workflows over opaque, externally supplied prompt templates
//! - Bounded-concurrency batch processing of a document directory
//! - Field-tolerant pairwise evaluation of generated vs. expected JSONL
//!   records, producing a match log and a per-file accuracy report
//!
//! # Example
//!
//! ```no_run
//! use enermetrics::config::Workflow;
//! use enermetrics::eval::BatchEvaluator;
//! use enermetrics::pipeline::DataPaths;
//!
//! let paths = DataPaths::new("data");
//! let workflow = Workflow::SingleStep;
//! let evaluator = BatchEvaluator::new(
//!     paths.generated_dir(workflow),
//!     paths.expected_dir(),
//!     paths.match_log(workflow),
//!     paths.accuracy_report(workflow),
//! );
//! evaluator.run().expect("evaluation failed");
//! ```

pub mod config;
pub mod eval;
pub mod pipeline;
pub mod providers;
pub mod records;
pub mod templates;

pub use config::{Config, Workflow};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::config::{Config, GenerationSettings, Workflow};
    pub use crate::eval::{
        find_matches, BatchEvaluator, EvalError, MatchPair, NormalizedRecord, NumericField,
    };
    pub use crate::pipeline::{BatchDriver, BatchSummary, DataPaths, DriverConfig, PipelineError};
    pub use crate::providers::{
        create_provider, GenerationRequest, GenerationResponse, GenerativeProvider, Part,
        ProviderError, ProviderResult,
    };
    pub use crate::records::{load_jsonl, Record, RecordError};
}
