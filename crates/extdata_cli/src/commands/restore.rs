//! Restore command implementation.

use extdata_core::reconcile::backup_path;
use extdata_storage::{validate_path, FileBackend, StorageBackend};
use std::path::Path;
use tracing::info;

/// Copies the archived copy of `record` back over the live record.
pub fn run(path: &Path, record: &str, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut backend = FileBackend::open(path)?;
    let backup = restore_record(&mut backend, record, force)?;

    println!("✓ Record restored");
    println!("  From: {backup}");
    println!("  To:   {record}");
    Ok(())
}

/// Restores `record` from its backup. Returns the backup path.
pub fn restore_record(
    backend: &mut dyn StorageBackend,
    record: &str,
    force: bool,
) -> Result<String, Box<dyn std::error::Error>> {
    validate_path(record)?;
    let backup = backup_path(record);
    if !backend.exists(&backup) {
        return Err(format!("No backup found at {backup}").into());
    }
    if backend.exists(record) && !force {
        return Err(format!("{record} already exists. Use --force to overwrite.").into());
    }

    info!("Restoring {} from {}", record, backup);
    let blob = backend.read(&backup)?;
    backend.write(record, &blob)?;
    Ok(backup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use extdata_storage::InMemoryBackend;
    use tempfile::tempdir;

    #[test]
    fn restore_requires_force_over_live_record() {
        let mut backend = InMemoryBackend::with_blobs([
            ("PlayersData/1/econ", b"new".to_vec()),
            ("Backup/PlayersData/1/econ", b"old".to_vec()),
        ]);

        assert!(restore_record(&mut backend, "PlayersData/1/econ", false).is_err());
        assert_eq!(backend.read("PlayersData/1/econ").unwrap(), b"new");

        restore_record(&mut backend, "PlayersData/1/econ", true).unwrap();
        assert_eq!(backend.read("PlayersData/1/econ").unwrap(), b"old");
    }

    #[test]
    fn restore_without_backup_fails() {
        let mut backend = InMemoryBackend::new();
        assert!(restore_record(&mut backend, "PlayersData/1/econ", true).is_err());
        assert!(restore_record(&mut backend, "../escape", true).is_err());
    }

    #[test]
    fn run_restores_into_data_directory() {
        let dir = tempdir().unwrap();
        {
            let mut backend = FileBackend::open(dir.path()).unwrap();
            backend.write("Backup/PluginsData/econ/bank", b"old").unwrap();
        }

        run(dir.path(), "PluginsData/econ/bank", false).unwrap();
        assert!(dir.path().join("PluginsData/econ/bank.dat").is_file());
    }
}
