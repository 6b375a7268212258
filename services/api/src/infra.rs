use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use property_ledger::portfolio::{DocumentStore, DocumentStoreError};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Writes uploaded documents under a single directory. Stored paths are the
/// full file paths, so records stay valid if the working directory changes.
#[derive(Debug, Clone)]
pub(crate) struct DiskDocumentStore {
    root: PathBuf,
}

impl DiskDocumentStore {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub(crate) fn root(&self) -> &Path {
        &self.root
    }
}

fn missing_as(path: &str, err: std::io::Error) -> DocumentStoreError {
    if err.kind() == ErrorKind::NotFound {
        DocumentStoreError::Missing(path.to_string())
    } else {
        DocumentStoreError::Io(err)
    }
}

impl DocumentStore for DiskDocumentStore {
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<String, DocumentStoreError> {
        fs::create_dir_all(&self.root)?;
        let target = self.root.join(file_name);
        fs::write(&target, bytes)?;
        Ok(target.to_string_lossy().into_owned())
    }

    fn load(&self, path: &str) -> Result<Vec<u8>, DocumentStoreError> {
        fs::read(path).map_err(|err| missing_as(path, err))
    }

    fn remove(&self, path: &str) -> Result<(), DocumentStoreError> {
        fs::remove_file(path).map_err(|err| missing_as(path, err))
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    property_ledger::portfolio::parse_date(raw)
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
