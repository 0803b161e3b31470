//! Scripted in-memory store for tests.

use super::{BatchResponse, RemoteStore, StoreConnector, StoreError};
use crate::sync::BatchKind;
use async_trait::async_trait;
use bondsync_engine::{CanonicalRecord, RecordId, RemotePage, UpdateEntry};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Barrier;

/// A request the store received.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Query {
        page_size: u32,
        page_token: Option<String>,
    },
    Create(Vec<CanonicalRecord>),
    Update(Vec<UpdateEntry>),
    Delete(Vec<RecordId>),
}

/// Serves queued pages and records every call.
#[derive(Debug, Default)]
pub struct MockStore {
    pages: Mutex<VecDeque<Result<RemotePage, StoreError>>>,
    calls: Mutex<Vec<Call>>,
    failing: Vec<BatchKind>,
    rejecting: Vec<BatchKind>,
    slow: Vec<(BatchKind, Duration)>,
    gate: Option<Arc<Barrier>>,
}

impl MockStore {
    pub fn with_pages(pages: Vec<RemotePage>) -> Self {
        Self {
            pages: Mutex::new(pages.into_iter().map(Ok).collect()),
            ..Default::default()
        }
    }

    /// Queue a query failure after the pages queued so far.
    pub fn then_fail_query(self, code: i64) -> Self {
        self.pages.lock().unwrap().push_back(Err(StoreError::Api {
            code,
            msg: "query refused".into(),
        }));
        self
    }

    /// Batch requests of this kind fail in transport.
    pub fn failing(mut self, kind: BatchKind) -> Self {
        self.failing.push(kind);
        self
    }

    /// Batch requests of this kind are answered with a non-zero code.
    pub fn rejecting(mut self, kind: BatchKind) -> Self {
        self.rejecting.push(kind);
        self
    }

    /// Batch requests of this kind take `delay` to answer.
    pub fn slow(mut self, kind: BatchKind, delay: Duration) -> Self {
        self.slow.push((kind, delay));
        self
    }

    /// Every batch request waits until `n` batch requests are in flight.
    pub fn gated(mut self, n: usize) -> Self {
        self.gate = Some(Arc::new(Barrier::new(n)));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn query_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Query { .. }))
            .count()
    }

    pub fn mutation_count(&self) -> usize {
        self.calls().len() - self.query_count()
    }

    async fn answer(&self, kind: BatchKind, call: Call) -> Result<BatchResponse, StoreError> {
        self.calls.lock().unwrap().push(call);

        if let Some(gate) = &self.gate {
            gate.wait().await;
        }
        if let Some((_, delay)) = self.slow.iter().find(|(slow, _)| *slow == kind) {
            tokio::time::sleep(*delay).await;
        }

        if self.failing.contains(&kind) {
            return Err(StoreError::Decode(format!("{} connection reset", kind)));
        }
        if self.rejecting.contains(&kind) {
            return Ok(BatchResponse {
                code: 1254001,
                msg: "WrongRequestBody".into(),
            });
        }
        Ok(BatchResponse {
            code: 0,
            msg: "success".into(),
        })
    }
}

#[async_trait]
impl RemoteStore for Arc<MockStore> {
    async fn query(
        &self,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<RemotePage, StoreError> {
        self.calls.lock().unwrap().push(Call::Query {
            page_size,
            page_token: page_token.map(str::to_string),
        });

        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(RemotePage::last(vec![])))
    }

    async fn create_batch(
        &self,
        records: &[CanonicalRecord],
    ) -> Result<BatchResponse, StoreError> {
        self.answer(BatchKind::Create, Call::Create(records.to_vec())).await
    }

    async fn update_batch(&self, records: &[UpdateEntry]) -> Result<BatchResponse, StoreError> {
        self.answer(BatchKind::Update, Call::Update(records.to_vec())).await
    }

    async fn delete_batch(&self, ids: &[RecordId]) -> Result<BatchResponse, StoreError> {
        self.answer(BatchKind::Delete, Call::Delete(ids.to_vec())).await
    }
}

/// Hands out a shared [`MockStore`], or refuses to authenticate.
#[derive(Debug, Default)]
pub struct MockConnector {
    pub store: Arc<MockStore>,
    pub refuse: bool,
}

impl MockConnector {
    pub fn new(store: MockStore) -> Self {
        Self {
            store: Arc::new(store),
            refuse: false,
        }
    }

    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Default::default()
        }
    }
}

#[async_trait]
impl StoreConnector for MockConnector {
    type Store = Arc<MockStore>;

    async fn connect(&self) -> Result<Arc<MockStore>, StoreError> {
        if self.refuse {
            return Err(StoreError::Api {
                code: 10014,
                msg: "app secret invalid".into(),
            });
        }
        Ok(self.store.clone())
    }
}
