//! Document extraction pipeline
//!
//! Turns a PDF report into a line-delimited JSON file of metric records at a
//! well-known path under the data directory. The evaluation side consumes
//! only that file, never the pipeline itself.

pub mod driver;
pub mod multi_step;
pub mod single_step;

pub use driver::{BatchDriver, BatchSummary, DriverConfig};

use std::path::{Path, PathBuf};

use crate::config::Workflow;
use crate::providers::ProviderError;
use crate::records::RecordError;
use crate::templates::TemplateError;

/// Error type for per-document extraction
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("model returned an empty response")]
    EmptyResponse,
}

/// Resolves the on-disk layout under the data directory:
///
/// ```text
/// docs/<id>.pdf                                   input documents
/// output/single_step/<id>/out.txt                 raw model output
/// output/multi_step/<id>/out_step_{0..3}.txt      raw per-step output
/// validation/generated/<workflow>/<id>.jsonl      extracted records
/// validation/expected/<id>.jsonl                  ground truth
/// evaluation/<workflow>/matches.jsonl             match log
/// evaluation/<workflow>/coverage.txt              accuracy report
/// ```
#[derive(Debug, Clone)]
pub struct DataPaths {
    data_dir: PathBuf,
}

impl DataPaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn docs_dir(&self) -> PathBuf {
        self.data_dir.join("docs")
    }

    pub fn pdf_path(&self, document_id: &str) -> PathBuf {
        self.docs_dir().join(format!("{}.pdf", document_id))
    }

    /// Raw single-step model output for a document
    pub fn single_step_output(&self, document_id: &str) -> PathBuf {
        self.data_dir
            .join("output/single_step")
            .join(document_id)
            .join("out.txt")
    }

    /// Raw multi-step model output for one step of a document
    pub fn multi_step_output(&self, document_id: &str, step: u8) -> PathBuf {
        self.data_dir
            .join("output/multi_step")
            .join(document_id)
            .join(format!("out_step_{}.txt", step))
    }

    pub fn generated_dir(&self, workflow: Workflow) -> PathBuf {
        self.data_dir
            .join("validation/generated")
            .join(workflow.as_str())
    }

    pub fn generated_jsonl(&self, workflow: Workflow, document_id: &str) -> PathBuf {
        self.generated_dir(workflow)
            .join(format!("{}.jsonl", document_id))
    }

    pub fn expected_dir(&self) -> PathBuf {
        self.data_dir.join("validation/expected")
    }

    pub fn match_log(&self, workflow: Workflow) -> PathBuf {
        self.data_dir
            .join("evaluation")
            .join(workflow.as_str())
            .join("matches.jsonl")
    }

    pub fn accuracy_report(&self, workflow: Workflow) -> PathBuf {
        self.data_dir
            .join("evaluation")
            .join(workflow.as_str())
            .join("coverage.txt")
    }
}

/// A payload the model returned but left empty fails the document rather
/// than silently producing an empty record file.
pub(crate) fn reject_empty(payload: serde_json::Value) -> Result<serde_json::Value, PipelineError> {
    let empty = match &payload {
        serde_json::Value::Null => true,
        serde_json::Value::Object(map) => map.is_empty(),
        serde_json::Value::Array(items) => items.is_empty(),
        _ => false,
    };
    if empty {
        Err(PipelineError::EmptyResponse)
    } else {
        Ok(payload)
    }
}

pub(crate) fn read_pdf(paths: &DataPaths, document_id: &str) -> Result<Vec<u8>, PipelineError> {
    let path = paths.pdf_path(document_id);
    std::fs::read(&path).map_err(|source| PipelineError::Io { path, source })
}
