//! Metric record I/O: line-delimited JSON loading/writing and conversion of
//! raw model output into the validation layout.
//!
//! A record is one JSON object per line with at least `code`, `value` and
//! `unit` fields (`year` optional). Records are read fresh for each
//! comparison and never persisted beyond the output artifacts.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config::Workflow;

/// An extracted or expected metric record, kept as a raw JSON object so that
/// extra fields survive into the match log untouched.
pub type Record = serde_json::Map<String, Value>;

/// Error type for record I/O
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("missing '{0}' key in extraction output")]
    MissingKey(&'static str),

    #[error("expected a JSON array of records in {0}")]
    NotAnArray(PathBuf),
}

fn io_err(path: &Path, source: std::io::Error) -> RecordError {
    RecordError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Load records from a JSONL file. A line that is not a valid JSON object is
/// logged and skipped; the rest of the file still loads. A missing or
/// unreadable file is an error.
pub fn load_jsonl(path: &Path) -> Result<Vec<Record>, RecordError> {
    let file = File::open(path).map_err(|e| io_err(path, e))?;
    let reader = BufReader::new(file);

    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| io_err(path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(&line) {
            Ok(Value::Object(record)) => records.push(record),
            Ok(_) => {
                tracing::warn!(
                    "{}:{}: line is not a JSON object, skipping",
                    path.display(),
                    idx + 1
                );
            }
            Err(e) => {
                tracing::warn!(
                    "{}:{}: skipping malformed JSON line: {}",
                    path.display(),
                    idx + 1,
                    e
                );
            }
        }
    }

    Ok(records)
}

/// Write one compact JSON object per line, creating parent directories.
pub fn write_jsonl(path: &Path, records: &[Value]) -> Result<(), RecordError> {
    ensure_parent(path)?;
    let file = File::create(path).map_err(|e| io_err(path, e))?;
    let mut writer = BufWriter::new(file);
    for record in records {
        let line = serde_json::to_string(record).map_err(|e| RecordError::Json {
            path: path.to_path_buf(),
            source: e,
        })?;
        writeln!(writer, "{}", line).map_err(|e| io_err(path, e))?;
    }
    writer.flush().map_err(|e| io_err(path, e))
}

/// Save a JSON value pretty-printed, creating parent directories.
pub fn save_json(value: &Value, path: &Path) -> Result<(), RecordError> {
    ensure_parent(path)?;
    let content = serde_json::to_string_pretty(value).map_err(|e| RecordError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    std::fs::write(path, content).map_err(|e| io_err(path, e))
}

/// Convert a raw extraction response (a JSON file) into the JSONL validation
/// layout. The single-step response nests its records under a top-level
/// `"metrics"` key; the multi-step final response is a top-level array.
pub fn convert_json_to_jsonl(
    input: &Path,
    output: &Path,
    workflow: Workflow,
) -> Result<(), RecordError> {
    let content = std::fs::read_to_string(input).map_err(|e| io_err(input, e))?;
    let data: Value = serde_json::from_str(&content).map_err(|e| RecordError::Json {
        path: input.to_path_buf(),
        source: e,
    })?;

    let items = match workflow {
        Workflow::SingleStep => data
            .get("metrics")
            .ok_or(RecordError::MissingKey("metrics"))?
            .as_array()
            .ok_or_else(|| RecordError::NotAnArray(input.to_path_buf()))?,
        Workflow::MultiStep => data
            .as_array()
            .ok_or_else(|| RecordError::NotAnArray(input.to_path_buf()))?,
    };

    write_jsonl(output, items)?;
    tracing::info!(
        "Converted {} to {} ({} records)",
        input.display(),
        output.display(),
        items.len()
    );
    Ok(())
}

/// Enumerate PDF document identifiers (file stems) in a directory, sorted.
pub fn pdf_document_ids(dir: &Path) -> Result<Vec<String>, RecordError> {
    let entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;

    let mut ids = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let path = entry.path();
        let is_pdf = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);
        if !is_pdf {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            ids.push(stem.to_string());
        }
    }
    ids.sort();
    Ok(ids)
}

fn ensure_parent(path: &Path) -> Result<(), RecordError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_load_jsonl_skips_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.jsonl");
        std::fs::write(
            &path,
            "{\"code\":\"E1\",\"value\":10}\nnot json at all\n\n42\n{\"code\":\"E2\",\"value\":-1}\n",
        )
        .unwrap();

        let records = load_jsonl(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["code"], json!("E1"));
        assert_eq!(records[1]["code"], json!("E2"));
    }

    #[test]
    fn test_load_jsonl_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_jsonl(&dir.path().join("absent.jsonl")).is_err());
    }

    #[test]
    fn test_convert_single_step_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("out.txt");
        let output = dir.path().join("generated/doc.jsonl");
        save_json(
            &json!({"company": "Acme", "metrics": [
                {"code": "E1", "value": 10, "unit": "GJ"},
                {"code": "E2", "value": -1, "unit": ""}
            ]}),
            &input,
        )
        .unwrap();

        convert_json_to_jsonl(&input, &output, Workflow::SingleStep).unwrap();
        let records = load_jsonl(&output).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["unit"], json!("GJ"));
    }

    #[test]
    fn test_convert_multi_step_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("out_step_3.txt");
        let output = dir.path().join("doc.jsonl");
        save_json(&json!([{"code": "E1", "value": "5"}]), &input).unwrap();

        convert_json_to_jsonl(&input, &output, Workflow::MultiStep).unwrap();
        assert_eq!(load_jsonl(&output).unwrap().len(), 1);
    }

    #[test]
    fn test_convert_single_step_requires_metrics_key() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("out.txt");
        save_json(&json!({"items": []}), &input).unwrap();

        let err = convert_json_to_jsonl(&input, &dir.path().join("x.jsonl"), Workflow::SingleStep);
        assert!(matches!(err, Err(RecordError::MissingKey("metrics"))));
    }

    #[test]
    fn test_pdf_document_ids_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pdf", "a.PDF", "notes.txt", "c.pdf"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let ids = pdf_document_ids(dir.path()).unwrap();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
