//! Single-step extraction: one model call per document

use std::sync::Arc;
use std::time::Instant;

use crate::config::{GenerationSettings, Workflow};
use crate::providers::{GenerationRequest, GenerativeProvider, Part};
use crate::records;
use crate::templates;

use super::{read_pdf, reject_empty, DataPaths, PipelineError};

/// Extract all metrics from one document with a single model call, save the
/// raw JSON output and convert it into the validation JSONL layout.
pub async fn run(
    provider: Arc<dyn GenerativeProvider>,
    paths: &DataPaths,
    settings: &GenerationSettings,
    document_id: &str,
) -> Result<(), PipelineError> {
    tracing::info!("Running single-step extraction for {}", document_id);
    let start = Instant::now();

    let pdf = read_pdf(paths, document_id)?;
    let workflow = Workflow::SingleStep;

    let system = templates::load_system_instruction(paths.data_dir(), workflow, None)?;
    let user = templates::load_user_instruction(paths.data_dir(), workflow, None)?;
    let schema = templates::load_response_schema(paths.data_dir(), workflow, None)?;

    let request = GenerationRequest::new(vec![Part::Pdf(pdf), Part::Text(user)])
        .with_system(system)
        .with_schema(schema)
        .with_settings(settings.clone());

    let response = provider.generate(&request).await?;
    tracing::debug!(
        "Model {} finished ({}, {} output tokens, {}ms)",
        response.model,
        response.finish_reason,
        response.output_tokens,
        response.latency_ms
    );

    let payload = reject_empty(response.json_payload()?)?;

    let raw_path = paths.single_step_output(document_id);
    records::save_json(&payload, &raw_path)?;
    records::convert_json_to_jsonl(
        &raw_path,
        &paths.generated_jsonl(workflow, document_id),
        workflow,
    )?;

    tracing::info!(
        "Single-step extraction for {} completed in {:.2}s",
        document_id,
        start.elapsed().as_secs_f64()
    );
    Ok(())
}
