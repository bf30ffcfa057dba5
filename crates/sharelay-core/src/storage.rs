//! Shared file helpers for the JSON-backed stores.

use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Default data directory (handoff slot and relay log).
pub fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "sharelay", "Sharelay")
        .map_or_else(|| PathBuf::from("."), |dirs| dirs.data_dir().to_path_buf())
}

/// Read a JSON document, `Ok(None)` when the file does not exist.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, String> {
    if !path.exists() {
        return Ok(None);
    }

    let file = fs::File::open(path).map_err(|e| format!("open {}: {e}", path.display()))?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .map(Some)
        .map_err(|e| format!("parse {}: {e}", path.display()))
}

/// Write a JSON document through a uniquely named sibling temp file and a
/// rename.
///
/// Readers see either the old document or the new one, never a partial write,
/// even with several processes writing the same path.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("create directory {}: {e}", parent.display()))?;
    }

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| format!("create temp file in {}: {e}", dir.display()))?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, value)
            .map_err(|e| format!("write {}: {e}", path.display()))?;
        writer
            .flush()
            .map_err(|e| format!("flush {}: {e}", path.display()))?;
    }

    tmp.persist(path)
        .map(|_| ())
        .map_err(|e| format!("replace {}: {}", path.display(), e.error))
}

/// Remove a file, treating "already gone" as success.
pub fn remove_if_exists(path: &Path) -> Result<(), String> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(format!("remove {}: {e}", path.display())),
    }
}
