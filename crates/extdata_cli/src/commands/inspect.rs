//! Inspect command implementation.

use extdata_core::{codec, BACKUP_DATA_FOLDER, PLAYERS_DATA_FOLDER, PLUGINS_DATA_FOLDER};
use extdata_storage::{FileBackend, StorageBackend};
use serde::Serialize;
use std::path::Path;

/// Data directory inspection result.
#[derive(Debug, Default, Serialize)]
pub struct InspectResult {
    /// Data directory path.
    pub path: String,
    /// Entity-scoped records.
    pub entities: Vec<RecordInfo>,
    /// Named records.
    pub named: Vec<RecordInfo>,
    /// Archived stale records.
    pub backups: Vec<RecordInfo>,
}

/// One stored blob.
#[derive(Debug, Serialize)]
pub struct RecordInfo {
    /// Storage path.
    pub path: String,
    /// Owning namespace, when the path names one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Entity id or record name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Version the record was written under; `None` if the blob is unreadable.
    pub version: Option<String>,
    /// Blob size in bytes.
    pub size: usize,
}

/// Runs the inspect command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !path.is_dir() {
        return Err(format!("No data directory found at {:?}", path).into());
    }
    let backend = FileBackend::open(path)?;
    let mut result = collect(&backend)?;
    result.path = path.display().to_string();

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => print_text_output(&result),
    }
    Ok(())
}

/// Describes every blob in `backend`.
pub fn collect(backend: &dyn StorageBackend) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let mut result = InspectResult::default();
    for path in backend.list("")? {
        let blob = backend.read(&path)?;
        let (bucket, live) = if let Some(live) = path.strip_prefix(BACKUP_DATA_FOLDER) {
            (&mut result.backups, live)
        } else if path.starts_with(PLAYERS_DATA_FOLDER) {
            (&mut result.entities, path.as_str())
        } else if path.starts_with(PLUGINS_DATA_FOLDER) {
            (&mut result.named, path.as_str())
        } else {
            continue;
        };

        let (namespace, key) = split_live_path(live).unzip();
        bucket.push(RecordInfo {
            namespace,
            key,
            version: codec::read_version(&blob).ok().map(|v| v.to_string()),
            size: blob.len(),
            path: path.clone(),
        });
    }
    Ok(result)
}

/// Splits a live path into `(namespace, key)`.
fn split_live_path(path: &str) -> Option<(String, String)> {
    if let Some(rest) = path.strip_prefix(PLAYERS_DATA_FOLDER) {
        let (id, namespace) = rest.split_once('/')?;
        Some((namespace.to_string(), id.to_string()))
    } else {
        let rest = path.strip_prefix(PLUGINS_DATA_FOLDER)?;
        let (namespace, name) = rest.split_once('/')?;
        Some((namespace.to_string(), name.to_string()))
    }
}

fn print_text_output(result: &InspectResult) {
    println!("ExtData Directory Inspection");
    println!("============================");
    println!();
    println!("Path: {}", result.path);

    for (title, records) in [
        ("Entity data", &result.entities),
        ("Named data", &result.named),
        ("Backups", &result.backups),
    ] {
        println!();
        println!("{title} ({}):", records.len());
        for record in records {
            let version = record.version.as_deref().unwrap_or("unreadable");
            println!("  {}  v{}  {} bytes", record.path, version, record.size);
        }
    }
}
