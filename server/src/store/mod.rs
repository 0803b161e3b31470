//! Remote table store access.
//!
//! The reconciliation pass talks to the store only through [`RemoteStore`];
//! [`StoreConnector`] performs the per-pass credential exchange and hands
//! out an authenticated store.

mod feishu;
#[cfg(test)]
pub mod mock;

pub use feishu::*;

use async_trait::async_trait;
use bondsync_engine::{CanonicalRecord, RecordId, RemotePage, UpdateEntry};
use serde::{Deserialize, Serialize};

/// Errors raised while talking to the store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("store returned code {code}: {msg}")]
    Api { code: i64, msg: String },

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("invalid pagination: {0}")]
    Pagination(#[from] bondsync_engine::Error),
}

/// Status the store attached to a batch request.
///
/// A non-zero code means the store accepted the request but refused some or
/// all of its rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub code: i64,
    pub msg: String,
}

impl BatchResponse {
    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}

/// A paginated table with batch mutations.
///
/// Batch methods must not be called with an empty slice.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch one page. `page_token` is `None` for the first page.
    async fn query(
        &self,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<RemotePage, StoreError>;

    async fn create_batch(&self, records: &[CanonicalRecord])
        -> Result<BatchResponse, StoreError>;

    async fn update_batch(&self, records: &[UpdateEntry]) -> Result<BatchResponse, StoreError>;

    async fn delete_batch(&self, ids: &[RecordId]) -> Result<BatchResponse, StoreError>;
}

/// Produces an authenticated [`RemoteStore`] for one pass.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    type Store: RemoteStore;

    async fn connect(&self) -> Result<Self::Store, StoreError>;
}
