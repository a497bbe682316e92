// src/store/json.rs

use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::errors::Result;
use crate::store::lock::{FileLock, lock_path_for};

/// Default bound on how long a caller waits for a document lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// Handle to the JSON documents shared between the scheduler and its agents.
///
/// The store itself is stateless apart from its lock timeout; all paths are
/// passed per call, so one handle serves every document of a run.
#[derive(Debug, Clone)]
pub struct JsonStore {
    lock_timeout: Duration,
}

impl Default for JsonStore {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_TIMEOUT)
    }
}

impl JsonStore {
    pub fn new(lock_timeout: Duration) -> Self {
        Self { lock_timeout }
    }

    /// Parse the current on-disk document without taking the lock.
    ///
    /// Only for reads where staleness is acceptable (e.g. exit checks
    /// between dispatch cycles). Never write back what this returns.
    pub fn read_only<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let contents = fs::read(path)?;
        Ok(serde_json::from_slice(&contents)?)
    }

    /// Locked read-modify-write of the document at `path`.
    ///
    /// - Takes the document's advisory lock (bounded by the lock timeout).
    /// - Re-reads the document *after* acquiring the lock.
    /// - Runs `mutate` on the in-memory document.
    /// - On `Ok`, writes the document back atomically; on `Err`, leaves the
    ///   file untouched and returns the error.
    ///
    /// The lock is held until the write-back has completed.
    pub fn locked_read_modify_write<T, R, F>(&self, path: &Path, mutate: F) -> Result<R>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut T) -> Result<R>,
    {
        let _lock = FileLock::acquire(&lock_path_for(path), self.lock_timeout)?;

        let mut document: T = self.read_only(path)?;
        let out = mutate(&mut document)?;
        write_atomic(path, &document)?;

        debug!(document = %path.display(), "locked read-modify-write committed");
        Ok(out)
    }

    /// Unconditionally replace the document at `path`.
    ///
    /// Same lock and atomic-rename guarantees as
    /// [`locked_read_modify_write`](Self::locked_read_modify_write), without
    /// the read phase.
    pub fn write<T: Serialize>(&self, path: &Path, document: &T) -> Result<()> {
        let _lock = FileLock::acquire(&lock_path_for(path), self.lock_timeout)?;
        write_atomic(path, document)?;
        debug!(document = %path.display(), "document overwritten");
        Ok(())
    }

    /// Write `document` only if nothing exists at `path` yet.
    ///
    /// Returns `true` if the document was created by this call.
    pub fn create_if_missing<T: Serialize>(&self, path: &Path, document: &T) -> Result<bool> {
        let _lock = FileLock::acquire(&lock_path_for(path), self.lock_timeout)?;
        if path.exists() {
            return Ok(false);
        }
        write_atomic(path, document)?;
        Ok(true)
    }
}

/// Serialize `document` into a temporary file next to `path`, then rename it
/// over `path`.
///
/// The temporary file is removed on every error path (the `NamedTempFile`
/// guard deletes it on drop), so a failed write leaves only the old content.
fn write_atomic<T: Serialize>(path: &Path, document: &T) -> Result<()> {
    let mut bytes = serde_json::to_vec_pretty(document)?;
    bytes.push(b'\n');

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".agentloop-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(&bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AgentloopError;
    use serde::Deserialize;
    use serde::ser::{Error as _, SerializeStruct};
    use serde_json::{Value, json};
    use tempfile::TempDir;

    /// Reads fine, but refuses to serialize once `v` goes past 1.
    #[derive(Deserialize)]
    struct Counter {
        v: u32,
    }

    impl Serialize for Counter {
        fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
            if self.v > 1 {
                return Err(S::Error::custom("counter overflow"));
            }
            let mut st = s.serialize_struct("Counter", 1)?;
            st.serialize_field("v", &self.v)?;
            st.end()
        }
    }

    fn seed(dir: &TempDir, name: &str, value: &Value) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, serde_json::to_vec(value).unwrap()).unwrap();
        path
    }

    fn leftover_tmp_files(dir: &TempDir) -> usize {
        fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count()
    }

    #[test]
    fn modification_is_persisted() {
        let dir = TempDir::new().unwrap();
        let path = seed(&dir, "data.json", &json!({"counter": 0}));
        let store = JsonStore::default();

        store
            .locked_read_modify_write(&path, |doc: &mut Value| {
                doc["counter"] = json!(99);
                Ok(())
            })
            .unwrap();

        let back: Value = store.read_only(&path).unwrap();
        assert_eq!(back, json!({"counter": 99}));
    }

    #[test]
    fn works_with_array_root() {
        let dir = TempDir::new().unwrap();
        let path = seed(&dir, "state.json", &json!([{"iteration": 1}]));
        let store = JsonStore::default();

        store
            .locked_read_modify_write(&path, |doc: &mut Vec<Value>| {
                doc.push(json!({"iteration": 2}));
                Ok(())
            })
            .unwrap();

        let back: Vec<Value> = store.read_only(&path).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[1]["iteration"], 2);
    }

    #[test]
    fn mutator_error_leaves_file_byte_identical() {
        let dir = TempDir::new().unwrap();
        let path = seed(&dir, "data.json", &json!({"v": 1}));
        let before = fs::read(&path).unwrap();
        let store = JsonStore::default();

        let err = store
            .locked_read_modify_write(&path, |doc: &mut Value| -> Result<()> {
                doc["v"] = json!(2);
                Err(AgentloopError::TaskNotFound("simulated".into()))
            })
            .unwrap_err();

        assert!(matches!(err, AgentloopError::TaskNotFound(_)));
        assert_eq!(fs::read(&path).unwrap(), before);
        assert_eq!(leftover_tmp_files(&dir), 0);
    }

    #[test]
    fn mutator_return_value_is_passed_through() {
        let dir = TempDir::new().unwrap();
        let path = seed(&dir, "obstacles.json", &json!({"obstacles": []}));
        let store = JsonStore::default();

        let len = store
            .locked_read_modify_write(&path, |doc: &mut Value| {
                Ok(doc["obstacles"].as_array().map(|a| a.len()).unwrap_or(0))
            })
            .unwrap();
        assert_eq!(len, 0);
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fresh.json");
        let store = JsonStore::default();
        let doc = json!({"tasks": [{"id": "T1", "attempts": 2}]});

        store.write(&path, &doc).unwrap();

        let back: Value = store.read_only(&path).unwrap();
        assert_eq!(back, doc);
        assert_eq!(leftover_tmp_files(&dir), 0);
    }

    #[test]
    fn corrupt_document_is_an_error_and_not_rewritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, b"{not json").unwrap();
        let store = JsonStore::default();

        let res = store.locked_read_modify_write(&path, |_doc: &mut Value| Ok(()));
        assert!(matches!(res, Err(AgentloopError::JsonError(_))));
        assert_eq!(fs::read(&path).unwrap(), b"{not json");
    }

    #[test]
    fn create_if_missing_does_not_clobber() {
        let dir = TempDir::new().unwrap();
        let path = seed(&dir, "state.json", &json!([{"task_id": "T1"}]));
        let store = JsonStore::default();

        assert!(!store.create_if_missing(&path, &json!([])).unwrap());
        let back: Value = store.read_only(&path).unwrap();
        assert_eq!(back, json!([{"task_id": "T1"}]));

        let other = dir.path().join("obstacles.json");
        assert!(store.create_if_missing(&other, &json!({"obstacles": []})).unwrap());
    }

    #[test]
    fn missing_document_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::default();
        let res: Result<Value> = store.read_only(&dir.path().join("nope.json"));
        assert!(matches!(res, Err(AgentloopError::IoError(_))));
    }

    #[test]
    fn serialization_failure_leaves_file_byte_identical() {
        let dir = TempDir::new().unwrap();
        let path = seed(&dir, "data.json", &json!({"v": 1}));
        let before = fs::read(&path).unwrap();
        let store = JsonStore::default();

        let err = store
            .locked_read_modify_write(&path, |doc: &mut Counter| {
                doc.v = 2;
                Ok(())
            })
            .unwrap_err();

        assert!(matches!(err, AgentloopError::JsonError(_)));
        assert_eq!(fs::read(&path).unwrap(), before);
        assert_eq!(leftover_tmp_files(&dir), 0);
    }

    #[test]
    fn failed_rename_removes_the_temp_file() {
        let dir = TempDir::new().unwrap();
        // A non-empty directory where the document should be makes the
        // final rename fail after the temp file was written.
        let path = dir.path().join("tasks.json");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), b"x").unwrap();
        let store = JsonStore::default();

        let err = store.write(&path, &json!({"tasks": []})).unwrap_err();

        assert!(matches!(err, AgentloopError::IoError(_)));
        assert!(path.join("keep").exists());
        assert_eq!(leftover_tmp_files(&dir), 0);
    }
}
