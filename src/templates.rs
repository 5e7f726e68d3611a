//! Prompt template and response schema loading
//!
//! Templates are opaque, externally supplied artifacts under
//! `<data_dir>/templates/`. Their content is never interpreted here; this
//! module only resolves the per-workflow, per-step file layout.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config::Workflow;

/// Error type for template loading
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("failed to read template {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in schema {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn read_template(path: PathBuf) -> Result<String, TemplateError> {
    tracing::debug!("Loading template {}", path.display());
    std::fs::read_to_string(&path).map_err(|source| TemplateError::Io { path, source })
}

/// Load the system instruction for a workflow. Multi-step workflows address
/// a step-numbered file; single-step uses the flat layout.
pub fn load_system_instruction(
    data_dir: &Path,
    workflow: Workflow,
    step: Option<u8>,
) -> Result<String, TemplateError> {
    let base = data_dir.join("templates").join(workflow.as_str());
    let path = match step {
        Some(step) => base
            .join("system_instruction")
            .join(format!("system_instruction_step_{}.txt", step)),
        None => base.join("system_instruction.txt"),
    };
    read_template(path)
}

/// Load the user instruction for a workflow.
pub fn load_user_instruction(
    data_dir: &Path,
    workflow: Workflow,
    step: Option<u8>,
) -> Result<String, TemplateError> {
    let base = data_dir.join("templates").join(workflow.as_str());
    let path = match step {
        Some(step) => base
            .join("user_instruction")
            .join(format!("user_instruction_step_{}.txt", step)),
        None => base.join("user_instruction.txt"),
    };
    read_template(path)
}

/// Load the JSON response schema constraining the model output.
pub fn load_response_schema(
    data_dir: &Path,
    workflow: Workflow,
    step: Option<u8>,
) -> Result<Value, TemplateError> {
    let base = data_dir.join("templates").join(workflow.as_str());
    let path = match step {
        Some(step) => base.join("schema").join(format!("step_{}_response.json", step)),
        None => base.join("response_schema.json"),
    };
    let content = read_template(path.clone())?;
    serde_json::from_str(&content).map_err(|source| TemplateError::Json { path, source })
}
