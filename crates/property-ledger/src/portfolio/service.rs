use std::sync::Arc;

use crate::config::AppConfig;

use super::documents::{DocumentStore, DocumentStoreError};
use super::repository::{PortfolioStore, RepositoryError};

/// Tunables the services enforce on every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortfolioPolicy {
    pub min_password_length: usize,
    pub hash_memory_kib: u32,
    pub hash_iterations: u32,
    pub allowed_extensions: Vec<String>,
}

impl PortfolioPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            min_password_length: config.accounts.min_password_length,
            hash_memory_kib: config.accounts.hash_memory_kib,
            hash_iterations: config.accounts.hash_iterations,
            allowed_extensions: config.storage.allowed_extensions.clone(),
        }
    }
}

impl Default for PortfolioPolicy {
    fn default() -> Self {
        Self {
            min_password_length: 8,
            hash_memory_kib: 19_456,
            hash_iterations: 2,
            allowed_extensions: ["pdf", "png", "jpg", "jpeg", "gif"]
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Entry point for every owner-scoped operation: accounts, properties,
/// occupancy lifecycle, reporting, reminders and documents.
///
/// Each write runs inside exactly one store transaction; callers pass the
/// resolved owner explicitly.
pub struct PortfolioService<S, D> {
    pub(crate) store: Arc<S>,
    pub(crate) files: Arc<D>,
    pub(crate) policy: PortfolioPolicy,
}

impl<S, D> PortfolioService<S, D>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    pub fn new(store: Arc<S>, files: Arc<D>, policy: PortfolioPolicy) -> Self {
        Self {
            store,
            files,
            policy,
        }
    }

    pub fn policy(&self) -> &PortfolioPolicy {
        &self.policy
    }

    pub(crate) fn read<T>(
        &self,
        view: impl FnOnce(&super::repository::PortfolioTables) -> T,
    ) -> Result<T, PortfolioError> {
        Ok(self.store.read(view)?)
    }
}

/// Error raised by the portfolio services.
#[derive(Debug, thiserror::Error)]
pub enum PortfolioError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("resource not found")]
    NotFound,
    #[error("authentication required")]
    Unauthenticated,
    #[error("storage failure")]
    Storage(#[from] RepositoryError),
    #[error("document storage failure")]
    Files(#[from] DocumentStoreError),
    #[error("credential processing failed")]
    Credential(String),
    #[error("export failed")]
    Export(String),
}

impl PortfolioError {
    pub(crate) fn validation(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }

    pub(crate) fn conflict(reason: impl Into<String>) -> Self {
        Self::Conflict(reason.into())
    }
}
