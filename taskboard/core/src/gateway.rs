//! Remote gateway abstraction.
//!
//! The backend owns the durable copy of every task. This trait is the only I/O
//! boundary the synchronizer depends on; the HTTP implementation lives in the
//! client crate. Implementations do not retry and do not deduplicate `create`.

use crate::task::{TaskDraft, TaskId, TaskPatch, TaskRecord};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors reported by a remote gateway.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Transport failure, timeout, or an error response without a usable message
    #[error("Network error: {0}")]
    Network(String),
    /// The backend rejected the request with a message, or answered with a body
    /// that does not have the expected shape
    #[error("{0}")]
    Validation(String),
}

impl GatewayError {
    pub(crate) fn timed_out() -> Self {
        GatewayError::Network("request timed out".to_string())
    }

    /// The message to show to a user.
    pub fn message(&self) -> &str {
        match self {
            GatewayError::Network(message) | GatewayError::Validation(message) => message,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, GatewayError::Validation(_))
    }
}

/// Operations the board needs from the backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Loads every task.
    async fn fetch_all(&self) -> Result<Vec<TaskRecord>, GatewayError>;

    /// Applies `patch` to the task and returns the server's version of it.
    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<TaskRecord, GatewayError>;

    /// Creates a task and returns it with its server-assigned id.
    async fn create(&self, draft: &TaskDraft) -> Result<TaskRecord, GatewayError>;
}

#[async_trait]
impl<G: RemoteGateway + ?Sized> RemoteGateway for Arc<G> {
    async fn fetch_all(&self) -> Result<Vec<TaskRecord>, GatewayError> {
        (**self).fetch_all().await
    }

    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<TaskRecord, GatewayError> {
        (**self).update(id, patch).await
    }

    async fn create(&self, draft: &TaskDraft) -> Result<TaskRecord, GatewayError> {
        (**self).create(draft).await
    }
}
