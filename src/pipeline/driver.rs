//! Bounded-concurrency batch driver
//!
//! Processes every PDF in the docs directory through the selected workflow.
//! Documents are independent units of work: each runs under a semaphore
//! permit with retry/backoff around transient provider failures, and one
//! failing document never aborts the batch.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::time::sleep;

use crate::config::{GenerationSettings, PipelineConfig, Workflow};
use crate::providers::{GenerativeProvider, ProviderError};
use crate::records;

use super::{multi_step, single_step, DataPaths, PipelineError};

/// Retry/concurrency settings for a batch run
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub concurrency: usize,
    pub retry_count: u32,
    pub retry_delay_ms: u64,
    pub max_retry_delay_ms: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            retry_count: 3,
            retry_delay_ms: 1000,
            max_retry_delay_ms: 60_000,
        }
    }
}

impl From<&PipelineConfig> for DriverConfig {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            concurrency: config.concurrency,
            retry_count: config.retry_count,
            retry_delay_ms: config.retry_delay_ms,
            max_retry_delay_ms: config.max_retry_delay_ms,
        }
    }
}

/// Outcome counts for a batch run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub failed: usize,
}

/// Drives per-document extraction across a directory of PDFs
pub struct BatchDriver {
    provider: Arc<dyn GenerativeProvider>,
    paths: DataPaths,
    settings: GenerationSettings,
    config: DriverConfig,
    semaphore: Arc<Semaphore>,
}

impl BatchDriver {
    pub fn new(
        provider: Arc<dyn GenerativeProvider>,
        paths: DataPaths,
        settings: GenerationSettings,
        config: DriverConfig,
    ) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));
        Self {
            provider,
            paths,
            settings,
            config,
            semaphore,
        }
    }

    /// Process every PDF in the docs directory through `workflow`.
    pub async fn run(&self, workflow: Workflow) -> Result<BatchSummary, PipelineError> {
        let docs_dir = self.paths.docs_dir();
        let document_ids = records::pdf_document_ids(&docs_dir)?;
        tracing::info!(
            "Found {} PDF files in {}",
            document_ids.len(),
            docs_dir.display()
        );

        if document_ids.is_empty() {
            tracing::warn!("No PDF files found in {}", docs_dir.display());
            return Ok(BatchSummary {
                processed: 0,
                failed: 0,
            });
        }

        let mut handles = Vec::new();
        for document_id in document_ids {
            let provider = self.provider.clone();
            let paths = self.paths.clone();
            let settings = self.settings.clone();
            let config = self.config.clone();
            let semaphore = self.semaphore.clone();

            handles.push(tokio::spawn(async move {
                // Semaphore is never closed while the driver lives.
                let _permit = semaphore.acquire().await.unwrap();
                let result = extract_with_retry(
                    provider,
                    &paths,
                    &settings,
                    &config,
                    workflow,
                    &document_id,
                )
                .await;
                (document_id, result)
            }));
        }

        let mut summary = BatchSummary {
            processed: 0,
            failed: 0,
        };
        for handle in handles {
            match handle.await {
                Ok((_, Ok(()))) => summary.processed += 1,
                Ok((document_id, Err(e))) => {
                    tracing::error!("Error processing document {}: {}", document_id, e);
                    summary.failed += 1;
                }
                Err(e) => {
                    tracing::error!("Extraction task panicked: {}", e);
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            "Batch complete: {} processed, {} failed",
            summary.processed,
            summary.failed
        );
        Ok(summary)
    }
}

async fn extract_with_retry(
    provider: Arc<dyn GenerativeProvider>,
    paths: &DataPaths,
    settings: &GenerationSettings,
    config: &DriverConfig,
    workflow: Workflow,
    document_id: &str,
) -> Result<(), PipelineError> {
    let mut last_error = None;
    let mut delay = config.retry_delay_ms;

    for attempt in 0..=config.retry_count {
        if attempt > 0 {
            tracing::info!("Retry {} for document {}", attempt, document_id);
            sleep(Duration::from_millis(delay)).await;
            delay = (delay * 2).min(config.max_retry_delay_ms);
        }

        let result = match workflow {
            Workflow::SingleStep => {
                single_step::run(provider.clone(), paths, settings, document_id).await
            }
            Workflow::MultiStep => {
                multi_step::run(provider.clone(), paths, settings, document_id).await
            }
        };

        match result {
            Ok(()) => return Ok(()),
            Err(PipelineError::Provider(ProviderError::RateLimited { retry_after_ms })) => {
                tracing::warn!(
                    "Rate limited on document {}, waiting {}ms",
                    document_id,
                    retry_after_ms
                );
                sleep(Duration::from_millis(retry_after_ms)).await;
                last_error = Some(PipelineError::Provider(ProviderError::RateLimited {
                    retry_after_ms,
                }));
            }
            // Local failures will not improve with another model call.
            Err(e @ (PipelineError::Template(_) | PipelineError::Io { .. })) => return Err(e),
            Err(e) => {
                tracing::error!("Attempt {} failed for {}: {}", attempt + 1, document_id, e);
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or(PipelineError::EmptyResponse))
}
