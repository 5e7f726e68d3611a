//! Batch evaluation over two directories of JSONL files
//!
//! For every generated file with an identically named expected counterpart,
//! runs the matcher and appends to two artifacts: a JSONL match log and a
//! plain-text accuracy report. Both artifacts are truncated and rewritten on
//! each run; there is no resumable state.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::matcher::{find_matches, MatchPair};
use crate::records::{self, RecordError};

/// Error type for batch evaluation. Per-file and per-record failures are
/// absorbed with a log line; only the variants here escalate.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("failed to open output artifact {path}: {source}")]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write output artifact: {0}")]
    Write(#[from] std::io::Error),
}

/// One line of the match log
#[derive(Serialize)]
struct MatchLogLine<'a> {
    filename: &'a str,
    generated: &'a records::Record,
    expected: &'a records::Record,
}

/// Evaluates a directory of generated JSONL files against a directory of
/// expected (ground-truth) files. All paths are supplied at construction;
/// the evaluator owns its two output artifacts for the duration of a run.
pub struct BatchEvaluator {
    generated_dir: PathBuf,
    expected_dir: PathBuf,
    match_log_path: PathBuf,
    report_path: PathBuf,
}

impl BatchEvaluator {
    pub fn new(
        generated_dir: impl Into<PathBuf>,
        expected_dir: impl Into<PathBuf>,
        match_log_path: impl Into<PathBuf>,
        report_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            generated_dir: generated_dir.into(),
            expected_dir: expected_dir.into(),
            match_log_path: match_log_path.into(),
            report_path: report_path.into(),
        }
    }

    /// Run the evaluation. Produces no in-memory result: the match log and
    /// accuracy report are the outputs. A missing expected counterpart or a
    /// failing file pair is logged and skipped; failure to open either
    /// artifact aborts the whole batch.
    pub fn run(&self) -> Result<(), EvalError> {
        let mut match_log = self.create_artifact(&self.match_log_path)?;
        let mut report = self.create_artifact(&self.report_path)?;

        for filename in self.generated_filenames()? {
            let expected_path = self.expected_dir.join(&filename);
            if !expected_path.exists() {
                tracing::warn!(
                    "File {} not found in {}",
                    filename,
                    self.expected_dir.display()
                );
                continue;
            }

            let generated_path = self.generated_dir.join(&filename);
            match compare_file_pair(&expected_path, &generated_path) {
                Ok((matches, total_generated)) => {
                    log_matches(&mut match_log, &filename, &matches)?;
                    log_accuracy(&mut report, &filename, matches.len(), total_generated)?;
                }
                Err(e) => {
                    tracing::error!(
                        "Error comparing {} and {}: {}",
                        generated_path.display(),
                        expected_path.display(),
                        e
                    );
                }
            }
        }

        match_log.flush()?;
        report.flush()?;
        Ok(())
    }

    fn create_artifact(&self, path: &Path) -> Result<BufWriter<File>, EvalError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| EvalError::Artifact {
                    path: path.to_path_buf(),
                    source,
                })?;
            }
        }
        let file = File::create(path).map_err(|source| EvalError::Artifact {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(BufWriter::new(file))
    }

    /// JSONL filenames in the generated directory, sorted so reruns produce
    /// byte-identical artifacts.
    fn generated_filenames(&self) -> Result<Vec<String>, EvalError> {
        let entries = std::fs::read_dir(&self.generated_dir).map_err(|source| {
            EvalError::ReadDir {
                path: self.generated_dir.clone(),
                source,
            }
        })?;

        let mut filenames = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| EvalError::ReadDir {
                path: self.generated_dir.clone(),
                source,
            })?;
            if let Some(name) = entry.file_name().to_str() {
                if name.ends_with(".jsonl") {
                    filenames.push(name.to_string());
                }
            }
        }
        filenames.sort();
        Ok(filenames)
    }
}

/// Load both files of a pair and run the matcher. Returns the match pairs
/// and the generated-record count used as the accuracy denominator.
fn compare_file_pair(
    expected_path: &Path,
    generated_path: &Path,
) -> Result<(Vec<MatchPair>, usize), RecordError> {
    let expected = records::load_jsonl(expected_path)?;
    let generated = records::load_jsonl(generated_path)?;
    Ok(find_matches(&expected, &generated))
}

fn log_matches<W: Write>(
    match_log: &mut W,
    filename: &str,
    matches: &[MatchPair],
) -> Result<(), EvalError> {
    for pair in matches {
        let line = MatchLogLine {
            filename,
            generated: &pair.generated,
            expected: &pair.expected,
        };
        serde_json::to_writer(&mut *match_log, &line).map_err(std::io::Error::from)?;
        writeln!(match_log)?;
    }
    Ok(())
}

fn log_accuracy<W: Write>(
    report: &mut W,
    filename: &str,
    match_count: usize,
    total_generated: usize,
) -> Result<(), EvalError> {
    let accuracy = if total_generated > 0 {
        match_count as f64 / total_generated as f64 * 100.0
    } else {
        0.0
    };
    writeln!(report, "{}: {:.2}%", filename, accuracy)?;
    Ok(())
}
