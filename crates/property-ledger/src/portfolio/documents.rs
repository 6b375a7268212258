use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::NaiveDate;
use tracing::{info, warn};

use super::domain::{Document, DocumentId, OwnerId, PropertyId};
use super::repository::PortfolioStore;
use super::service::{PortfolioError, PortfolioService};

/// Byte storage for uploaded documents. The portfolio tables only keep the
/// returned storage path.
pub trait DocumentStore: Send + Sync {
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<String, DocumentStoreError>;
    fn load(&self, path: &str) -> Result<Vec<u8>, DocumentStoreError>;
    fn remove(&self, path: &str) -> Result<(), DocumentStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentStoreError {
    #[error("stored file missing: {0}")]
    Missing(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Keeps document bytes in process memory; used by the demo and tests.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryDocumentStore {
    pub fn len(&self) -> usize {
        self.files.lock().map(|files| files.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<String, DocumentStoreError> {
        let path = format!("memory://{file_name}");
        let mut files = self
            .files
            .lock()
            .map_err(|_| std::io::Error::other("document store lock poisoned"))?;
        files.insert(path.clone(), bytes.to_vec());
        Ok(path)
    }

    fn load(&self, path: &str) -> Result<Vec<u8>, DocumentStoreError> {
        let files = self
            .files
            .lock()
            .map_err(|_| std::io::Error::other("document store lock poisoned"))?;
        files
            .get(path)
            .cloned()
            .ok_or_else(|| DocumentStoreError::Missing(path.to_string()))
    }

    fn remove(&self, path: &str) -> Result<(), DocumentStoreError> {
        let mut files = self
            .files
            .lock()
            .map_err(|_| std::io::Error::other("document store lock poisoned"))?;
        files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| DocumentStoreError::Missing(path.to_string()))
    }
}

/// Reduces a client-supplied file name to a safe basename.
///
/// Directory components are dropped, whitespace becomes `_`, anything outside
/// `[A-Za-z0-9._-]` is removed and leading dots are stripped.
pub fn sanitize_file_name(raw: &str) -> Option<String> {
    let basename = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    let cleaned: String = basename
        .chars()
        .filter_map(|ch| match ch {
            ch if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_') => Some(ch),
            ch if ch.is_whitespace() => Some('_'),
            _ => None,
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

fn extension_of(file_name: &str) -> Option<String> {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

impl<S, D> PortfolioService<S, D>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    /// Stores the bytes first, then records the document; the bytes are
    /// removed again if the record cannot be written.
    pub fn upload_document(
        &self,
        owner: OwnerId,
        property_id: &PropertyId,
        title: Option<String>,
        file_name: &str,
        bytes: &[u8],
        today: NaiveDate,
    ) -> Result<Document, PortfolioError> {
        let exists = self.read(|tables| tables.owned_property(owner, property_id).is_some())?;
        if !exists {
            return Err(PortfolioError::NotFound);
        }

        let file_name = sanitize_file_name(file_name)
            .filter(|name| {
                extension_of(name).is_some_and(|ext| self.policy.allowed_extensions.contains(&ext))
            })
            .ok_or_else(|| PortfolioError::validation("Invalid file"))?;
        let title = title
            .map(|title| title.trim().to_string())
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| file_name.clone());

        let stored_name = format!("{}_{}", uuid::Uuid::new_v4().simple(), file_name);
        let file_path = self.files.save(&stored_name, bytes)?;

        let recorded = self.store.transaction(|tables| {
            if tables.owned_property(owner, property_id).is_none() {
                return Err(PortfolioError::NotFound);
            }
            let document = Document {
                document_id: DocumentId(tables.next_id()),
                property_id: property_id.clone(),
                title,
                file_path: file_path.clone(),
                upload_date: today,
            };
            tables.insert_document(document.clone());
            Ok(document)
        });

        match recorded {
            Ok(document) => {
                info!(
                    document_id = document.document_id.0,
                    property_id = %property_id,
                    "document uploaded"
                );
                Ok(document)
            }
            Err(err) => {
                if let Err(cleanup) = self.files.remove(&file_path) {
                    warn!(%file_path, error = %cleanup, "orphaned upload left in storage");
                }
                Err(err)
            }
        }
    }

    pub fn documents(
        &self,
        owner: OwnerId,
        property_id: &PropertyId,
    ) -> Result<Vec<Document>, PortfolioError> {
        self.read(|tables| {
            tables
                .owned_property(owner, property_id)
                .map(|_| tables.documents_for(property_id).into_iter().cloned().collect())
        })?
        .ok_or(PortfolioError::NotFound)
    }

    pub fn document(&self, owner: OwnerId, id: DocumentId) -> Result<Document, PortfolioError> {
        self.read(|tables| {
            tables
                .document(id)
                .filter(|document| tables.owned_property(owner, &document.property_id).is_some())
                .cloned()
        })?
        .ok_or(PortfolioError::NotFound)
    }

    pub fn document_contents(
        &self,
        owner: OwnerId,
        id: DocumentId,
    ) -> Result<(Document, Vec<u8>), PortfolioError> {
        let document = self.document(owner, id)?;
        match self.files.load(&document.file_path) {
            Ok(bytes) => Ok((document, bytes)),
            Err(DocumentStoreError::Missing(_)) => Err(PortfolioError::NotFound),
            Err(err) => Err(err.into()),
        }
    }

    pub fn delete_document(
        &self,
        owner: OwnerId,
        id: DocumentId,
    ) -> Result<Document, PortfolioError> {
        let removed = self.store.transaction(|tables| {
            let owned = tables
                .document(id)
                .is_some_and(|document| tables.owned_property(owner, &document.property_id).is_some());
            if !owned {
                return Err(PortfolioError::NotFound);
            }
            tables.remove_document(id).ok_or(PortfolioError::NotFound)
        })?;

        self.discard_files([removed.file_path.as_str()]);
        info!(document_id = id.0, "document deleted");
        Ok(removed)
    }

    pub(crate) fn discard_files<'a>(&self, paths: impl IntoIterator<Item = &'a str>) {
        for path in paths {
            match self.files.remove(path) {
                Ok(()) | Err(DocumentStoreError::Missing(_)) => {}
                Err(err) => warn!(%path, error = %err, "failed to remove stored document"),
            }
        }
    }
}
