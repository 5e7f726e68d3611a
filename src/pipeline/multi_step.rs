//! Multi-step extraction: four chained model calls per document
//!
//! Step 0 extracts document metadata, step 1 identifies the metric codes
//! present, step 2 pulls value/unit/page/snippet for each metric, step 3
//! assigns year, scope and consumption classification. Steps 2 and 3 feed
//! the previous step's saved output back to the model as a text part.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use crate::config::{GenerationSettings, Workflow};
use crate::providers::{GenerationRequest, GenerativeProvider, Part};
use crate::records;
use crate::templates;

use super::{read_pdf, reject_empty, DataPaths, PipelineError};

const FINAL_STEP: u8 = 3;

/// Run the full four-step chain for one document and convert the final
/// output into the validation JSONL layout.
pub async fn run(
    provider: Arc<dyn GenerativeProvider>,
    paths: &DataPaths,
    settings: &GenerationSettings,
    document_id: &str,
) -> Result<(), PipelineError> {
    tracing::info!("Running multi-step extraction for {}", document_id);
    let start = Instant::now();

    let pdf = read_pdf(paths, document_id)?;

    for step in 0..=FINAL_STEP {
        run_step(provider.clone(), paths, settings, document_id, step, &pdf).await?;
    }

    records::convert_json_to_jsonl(
        &paths.multi_step_output(document_id, FINAL_STEP),
        &paths.generated_jsonl(Workflow::MultiStep, document_id),
        Workflow::MultiStep,
    )?;

    tracing::info!(
        "Multi-step extraction for {} completed in {:.2}s",
        document_id,
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

async fn run_step(
    provider: Arc<dyn GenerativeProvider>,
    paths: &DataPaths,
    settings: &GenerationSettings,
    document_id: &str,
    step: u8,
    pdf: &[u8],
) -> Result<Value, PipelineError> {
    tracing::info!("Step {} for {}", step, document_id);
    let workflow = Workflow::MultiStep;

    let system = templates::load_system_instruction(paths.data_dir(), workflow, Some(step))?;
    let user = templates::load_user_instruction(paths.data_dir(), workflow, Some(step))?;
    let schema = templates::load_response_schema(paths.data_dir(), workflow, Some(step))?;

    let mut parts = vec![Part::Pdf(pdf.to_vec())];
    // Steps 2 and 3 operate on the metric list produced by the step before.
    if step >= 2 {
        parts.push(Part::Text(load_step_output(paths, document_id, step - 1)?));
    }
    parts.push(Part::Text(user));

    let request = GenerationRequest::new(parts)
        .with_system(system)
        .with_schema(schema)
        .with_settings(settings.clone());

    let response = provider.generate(&request).await?;
    let payload = reject_empty(response.json_payload()?)?;

    records::save_json(&payload, &paths.multi_step_output(document_id, step))?;
    Ok(payload)
}

fn load_step_output(
    paths: &DataPaths,
    document_id: &str,
    step: u8,
) -> Result<String, PipelineError> {
    let path = paths.multi_step_output(document_id, step);
    std::fs::read_to_string(&path).map_err(|source| PipelineError::Io { path, source })
}
