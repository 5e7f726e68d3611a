//! Integration tests for the extraction pipeline using a scripted provider
//! in place of the hosted model API.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use enermetrics::config::{GenerationSettings, Workflow};
use enermetrics::pipeline::{multi_step, single_step, BatchDriver, DataPaths, DriverConfig};
use enermetrics::providers::{
    GenerationRequest, GenerationResponse, GenerativeProvider, ProviderError, ProviderResult,
};
use enermetrics::records;

/// Returns scripted responses in order; fails the request when the script
/// entry is an Err.
struct ScriptedProvider {
    responses: Vec<Result<String, String>>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    fn new(responses: Vec<Result<String, String>>) -> Arc<Self> {
        Arc::new(Self {
            responses,
            calls: AtomicUsize::new(0),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerativeProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn generate(&self, _request: &GenerationRequest) -> ProviderResult<GenerationResponse> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        let entry = self
            .responses
            .get(index)
            .cloned()
            .unwrap_or_else(|| Err("script exhausted".to_string()));

        match entry {
            Ok(content) => Ok(GenerationResponse {
                content,
                model: "scripted-model".to_string(),
                input_tokens: 10,
                output_tokens: 10,
                finish_reason: "STOP".to_string(),
                latency_ms: 1,
            }),
            Err(message) => Err(ProviderError::Api {
                status: 500,
                message,
            }),
        }
    }
}

fn write_file(path: &Path, content: &[u8]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn setup_single_step_templates(data_dir: &Path) {
    let base = data_dir.join("templates/single_step");
    write_file(&base.join("system_instruction.txt"), b"system");
    write_file(&base.join("user_instruction.txt"), b"user");
    write_file(&base.join("response_schema.json"), b"{\"type\":\"object\"}");
}

fn setup_multi_step_templates(data_dir: &Path) {
    let base = data_dir.join("templates/multi_step");
    for step in 0..=3 {
        write_file(
            &base.join(format!("system_instruction/system_instruction_step_{step}.txt")),
            b"system",
        );
        write_file(
            &base.join(format!("user_instruction/user_instruction_step_{step}.txt")),
            b"user",
        );
        write_file(
            &base.join(format!("schema/step_{step}_response.json")),
            b"{\"type\":\"object\"}",
        );
    }
}

#[tokio::test]
async fn single_step_produces_validation_jsonl() {
    let dir = tempfile::tempdir().unwrap();
    let paths = DataPaths::new(dir.path());
    setup_single_step_templates(dir.path());
    write_file(&paths.pdf_path("doc1"), b"%PDF-1.4 stub");

    let provider = ScriptedProvider::new(vec![Ok(
        r#"{"company":"Acme","metrics":[{"code":"E1","value":10,"unit":"GJ"},{"code":"E2","value":-1,"unit":""}]}"#
            .to_string(),
    )]);

    single_step::run(
        provider.clone(),
        &paths,
        &GenerationSettings::default(),
        "doc1",
    )
    .await
    .unwrap();

    assert_eq!(provider.call_count(), 1);
    assert!(paths.single_step_output("doc1").exists());

    let generated =
        records::load_jsonl(&paths.generated_jsonl(Workflow::SingleStep, "doc1")).unwrap();
    assert_eq!(generated.len(), 2);
    assert_eq!(generated[0]["code"], serde_json::json!("E1"));
}

#[tokio::test]
async fn single_step_rejects_empty_payload() {
    let dir = tempfile::tempdir().unwrap();
    let paths = DataPaths::new(dir.path());
    setup_single_step_templates(dir.path());
    write_file(&paths.pdf_path("doc1"), b"%PDF-1.4 stub");

    let provider = ScriptedProvider::new(vec![Ok("{}".to_string())]);
    let result = single_step::run(
        provider,
        &paths,
        &GenerationSettings::default(),
        "doc1",
    )
    .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn multi_step_chains_four_calls() {
    let dir = tempfile::tempdir().unwrap();
    let paths = DataPaths::new(dir.path());
    setup_multi_step_templates(dir.path());
    write_file(&paths.pdf_path("doc1"), b"%PDF-1.4 stub");

    let provider = ScriptedProvider::new(vec![
        Ok(r#"{"company":"Acme","reporting_period":"FY23"}"#.to_string()),
        Ok(r#"{"metrics_found":[{"code":"E1","item":"Total energy"}]}"#.to_string()),
        Ok(r#"{"values":[{"code":"E1","value":10,"unit":"GJ","page":4}]}"#.to_string()),
        Ok(r#"[{"code":"E1","value":10,"unit":"GJ","year":2023}]"#.to_string()),
    ]);

    multi_step::run(
        provider.clone(),
        &paths,
        &GenerationSettings::default(),
        "doc1",
    )
    .await
    .unwrap();

    assert_eq!(provider.call_count(), 4);
    for step in 0..=3 {
        assert!(paths.multi_step_output("doc1", step).exists());
    }

    let generated =
        records::load_jsonl(&paths.generated_jsonl(Workflow::MultiStep, "doc1")).unwrap();
    assert_eq!(generated.len(), 1);
    assert_eq!(generated[0]["year"], serde_json::json!(2023));
}

#[tokio::test]
async fn driver_contains_per_document_failures() {
    let dir = tempfile::tempdir().unwrap();
    let paths = DataPaths::new(dir.path());
    setup_single_step_templates(dir.path());
    write_file(&paths.pdf_path("alpha"), b"%PDF alpha");
    write_file(&paths.pdf_path("beta"), b"%PDF beta");

    // Documents run sorted with concurrency 1: alpha succeeds, beta fails.
    let provider = ScriptedProvider::new(vec![
        Ok(r#"{"metrics":[{"code":"E1","value":1,"unit":"GJ"}]}"#.to_string()),
        Err("backend unavailable".to_string()),
    ]);

    let driver = BatchDriver::new(
        provider,
        paths.clone(),
        GenerationSettings::default(),
        DriverConfig {
            concurrency: 1,
            retry_count: 0,
            retry_delay_ms: 1,
            max_retry_delay_ms: 1,
        },
    );

    let summary = driver.run(Workflow::SingleStep).await.unwrap();
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.failed, 1);
    assert!(paths.generated_jsonl(Workflow::SingleStep, "alpha").exists());
    assert!(!paths.generated_jsonl(Workflow::SingleStep, "beta").exists());
}

#[tokio::test]
async fn driver_retries_transient_failures() {
    let dir = tempfile::tempdir().unwrap();
    let paths = DataPaths::new(dir.path());
    setup_single_step_templates(dir.path());
    write_file(&paths.pdf_path("doc1"), b"%PDF stub");

    let provider = ScriptedProvider::new(vec![
        Err("flaky".to_string()),
        Ok(r#"{"metrics":[{"code":"E1","value":1,"unit":"GJ"}]}"#.to_string()),
    ]);

    let driver = BatchDriver::new(
        provider.clone(),
        paths.clone(),
        GenerationSettings::default(),
        DriverConfig {
            concurrency: 1,
            retry_count: 2,
            retry_delay_ms: 1,
            max_retry_delay_ms: 2,
        },
    );

    let summary = driver.run(Workflow::SingleStep).await.unwrap();
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(provider.call_count(), 2);
}
