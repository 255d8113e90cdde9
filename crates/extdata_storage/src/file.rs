//! File-based storage backend for persistent storage.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use crate::path::validate_path;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Lock file held for the lifetime of the backend.
const LOCK_FILE: &str = "LOCK";
/// Extension of every stored blob.
const BLOB_EXTENSION: &str = "dat";
/// Extension of a blob being written.
const TEMP_EXTENSION: &str = "tmp";

/// A file-based storage backend.
///
/// Every virtual path maps to one file below the root directory:
///
/// ```text
/// <root>/
/// ├─ LOCK                        # Advisory lock for single-writer
/// ├─ PlayersData/1001/econ.dat
/// ├─ PluginsData/econ/bank.dat
/// └─ Backup/PlayersData/1001/econ.dat
/// ```
///
/// # Durability
///
/// Writes go to a temporary sibling file which is synced and then renamed
/// over the destination, so a crash never leaves a half-written blob.
///
/// # Example
///
/// ```no_run
/// use extdata_storage::{StorageBackend, FileBackend};
/// use std::path::Path;
///
/// let mut backend = FileBackend::open(Path::new("data")).unwrap();
/// backend.write("PluginsData/econ/bank", b"persistent data").unwrap();
/// ```
#[derive(Debug)]
pub struct FileBackend {
    root: PathBuf,
    _lock_file: File,
}

impl FileBackend {
    /// Opens or creates a data directory at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory cannot be created
    /// - `root` exists but is not a directory
    /// - Another process holds the lock ([`StorageError::Locked`])
    pub fn open(root: &Path) -> StorageResult<Self> {
        if !root.exists() {
            fs::create_dir_all(root)?;
        }
        if !root.is_dir() {
            return Err(StorageError::Io(std::io::Error::new(
                ErrorKind::InvalidInput,
                format!("not a directory: {}", root.display()),
            )));
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(root.join(LOCK_FILE))?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(StorageError::Locked);
        }

        Ok(Self {
            root: root.to_path_buf(),
            _lock_file: lock_file,
        })
    }

    /// Returns the data directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the file that backs a virtual path.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is not a valid virtual path.
    pub fn file_path(&self, path: &str) -> StorageResult<PathBuf> {
        validate_path(path)?;
        let mut file = self.root.clone();
        let (dirs, name) = path.rsplit_once('/').unwrap_or(("", path));
        file.extend(dirs.split('/').filter(|s| !s.is_empty()));
        file.push(format!("{name}.{BLOB_EXTENSION}"));
        Ok(file)
    }

    fn collect(&self, dir: &Path, prefix: &str, out: &mut Vec<String>) -> StorageResult<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                self.collect(&path, prefix, out)?;
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(BLOB_EXTENSION) {
                continue;
            }
            let stem = path.with_extension("");
            let Ok(relative) = stem.strip_prefix(&self.root) else {
                continue;
            };
            let virtual_path = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            if virtual_path.starts_with(prefix) {
                out.push(virtual_path);
            }
        }
        Ok(())
    }
}

impl StorageBackend for FileBackend {
    fn exists(&self, path: &str) -> bool {
        self.file_path(path).map(|f| f.is_file()).unwrap_or(false)
    }

    fn read(&self, path: &str) -> StorageResult<Vec<u8>> {
        let file = self.file_path(path)?;
        match fs::read(&file) {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::not_found(path)),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, path: &str, data: &[u8]) -> StorageResult<()> {
        let file = self.file_path(path)?;
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp = file.with_extension(TEMP_EXTENSION);
        {
            let mut out = File::create(&temp)?;
            out.write_all(data)?;
            out.sync_all()?;
        }
        fs::rename(&temp, &file)?;
        Ok(())
    }

    fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let mut paths = Vec::new();
        self.collect(&self.root, prefix, &mut paths)?;
        paths.sort();
        Ok(paths)
    }
}
