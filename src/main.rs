//! Extraction and evaluation CLI

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use enermetrics::config::{Config, Workflow};
use enermetrics::eval::BatchEvaluator;
use enermetrics::pipeline::{single_step, multi_step, BatchDriver, DataPaths, DriverConfig};
use enermetrics::providers::create_provider;

#[derive(Parser)]
#[command(name = "enermetrics")]
#[command(about = "Extract energy-consumption metrics from PDF reports and evaluate them against ground truth")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract metrics from a single document
    Extract {
        /// Document identifier (file stem of a PDF under <data_dir>/docs)
        document: String,

        /// Extraction workflow
        #[arg(short, long, value_enum, default_value = "single-step")]
        workflow: Workflow,
    },

    /// Extract metrics from every PDF in the docs directory
    ExtractAll {
        /// Extraction workflow
        #[arg(short, long, value_enum, default_value = "single-step")]
        workflow: Workflow,

        /// Number of documents processed concurrently
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Evaluate generated records against the expected ground truth
    Evaluate {
        /// Workflow whose generated records to evaluate
        #[arg(short, long, value_enum, default_value = "single-step")]
        workflow: Workflow,

        /// Override the generated-records directory
        #[arg(long)]
        generated_dir: Option<PathBuf>,

        /// Override the expected-records directory
        #[arg(long)]
        expected_dir: Option<PathBuf>,
    },

    /// Generate a sample configuration file
    InitConfig {
        /// Output path for the configuration file
        #[arg(short, long, default_value = "enermetrics.toml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("enermetrics=debug,info")
    } else {
        EnvFilter::new("enermetrics=info,warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load_or_default(),
    };

    match cli.command {
        Commands::Extract { document, workflow } => {
            extract_one(&config, workflow, &document).await?;
        }

        Commands::ExtractAll {
            workflow,
            concurrency,
        } => {
            extract_all(&config, workflow, concurrency).await?;
        }

        Commands::Evaluate {
            workflow,
            generated_dir,
            expected_dir,
        } => {
            evaluate(&config, workflow, generated_dir, expected_dir)?;
        }

        Commands::InitConfig { output } => {
            Config::default().save_toml(&output)?;
            println!("Wrote sample configuration to {}", output.display());
        }
    }

    Ok(())
}

async fn extract_one(
    config: &Config,
    workflow: Workflow,
    document: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let provider = create_provider(config)?;
    let paths = DataPaths::new(&config.data_dir);
    let settings = &config.model.generation;

    let start = Instant::now();
    match workflow {
        Workflow::SingleStep => {
            single_step::run(provider, &paths, settings, document).await?;
        }
        Workflow::MultiStep => {
            multi_step::run(provider, &paths, settings, document).await?;
        }
    }

    println!(
        "Extracted {} via {} in {:.2}s -> {}",
        document,
        workflow,
        start.elapsed().as_secs_f64(),
        paths.generated_jsonl(workflow, document).display()
    );
    Ok(())
}

async fn extract_all(
    config: &Config,
    workflow: Workflow,
    concurrency: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let provider = create_provider(config)?;
    let paths = DataPaths::new(&config.data_dir);

    let mut driver_config = DriverConfig::from(&config.pipeline);
    if let Some(concurrency) = concurrency {
        driver_config.concurrency = concurrency;
    }

    let driver = BatchDriver::new(
        provider,
        paths,
        config.model.generation.clone(),
        driver_config,
    );
    let summary = driver.run(workflow).await?;

    println!(
        "Batch extraction complete: {} processed, {} failed",
        summary.processed, summary.failed
    );
    if summary.failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn evaluate(
    config: &Config,
    workflow: Workflow,
    generated_dir: Option<PathBuf>,
    expected_dir: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let paths = DataPaths::new(&config.data_dir);

    let generated_dir = generated_dir.unwrap_or_else(|| paths.generated_dir(workflow));
    let expected_dir = expected_dir.unwrap_or_else(|| paths.expected_dir());
    let match_log = paths.match_log(workflow);
    let report = paths.accuracy_report(workflow);

    let evaluator = BatchEvaluator::new(generated_dir, expected_dir, &match_log, &report);
    evaluator.run()?;

    println!("Match log:       {}", match_log.display());
    println!("Accuracy report: {}", report.display());
    Ok(())
}
