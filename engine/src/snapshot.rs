//! Remote table snapshots assembled from paginated query results.
//!
//! The engine does no I/O: callers feed each page they receive into a
//! [`SnapshotBuilder`], which tells them whether to ask for another page and
//! with which continuation token. Only a builder that has seen the store's
//! exhaustion flag yields a [`RemoteSnapshot`].

use crate::{error::Result, record::RemoteEntry, Error};
use serde::{Deserialize, Serialize};

/// Default page size, which is also the store's maximum.
pub const DEFAULT_PAGE_SIZE: u32 = 500;

/// Largest page size the store accepts.
pub const MAX_PAGE_SIZE: u32 = 500;

/// Clamp a requested page size into what the store accepts.
pub fn clamp_page_size(requested: u32) -> u32 {
    requested.clamp(1, MAX_PAGE_SIZE)
}

/// One page of a paginated query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePage {
    pub entries: Vec<RemoteEntry>,
    /// Whether the store has more pages after this one
    pub has_more: bool,
    /// Continuation token for the next page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
    /// Row count of the whole table, when the store reports it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

impl RemotePage {
    /// A final page.
    pub fn last(entries: Vec<RemoteEntry>) -> Self {
        Self {
            entries,
            ..Default::default()
        }
    }

    /// A page followed by more.
    pub fn more(entries: Vec<RemoteEntry>, page_token: impl Into<String>) -> Self {
        Self {
            entries,
            has_more: true,
            page_token: Some(page_token.into()),
            total: None,
        }
    }
}

/// The full contents of the remote table at the start of a pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSnapshot {
    /// Entries in first-seen order
    pub entries: Vec<RemoteEntry>,
    /// Continuation tokens consumed while assembling the snapshot
    pub tokens: Vec<String>,
    /// Number of queries issued
    pub pages_fetched: usize,
}

impl RemoteSnapshot {
    /// A snapshot from already-known entries.
    pub fn from_entries(entries: Vec<RemoteEntry>) -> Self {
        Self {
            entries,
            tokens: Vec::new(),
            pages_fetched: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What the reader should do after a page was absorbed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    /// Query again with this token
    Fetch(String),
    /// The store reported no further pages
    Done,
}

/// Accumulates pages into a [`RemoteSnapshot`].
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    snapshot: RemoteSnapshot,
    exhausted: bool,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a page and decide whether another query is needed.
    ///
    /// A page claiming `has_more` without a token is an error: re-querying
    /// without a token would restart from the first page.
    pub fn absorb(&mut self, page: RemotePage) -> Result<NextPage> {
        self.snapshot.pages_fetched += 1;
        self.snapshot.entries.extend(page.entries);

        if !page.has_more {
            self.exhausted = true;
            return Ok(NextPage::Done);
        }

        match page.page_token.filter(|t| !t.is_empty()) {
            Some(token) => {
                self.snapshot.tokens.push(token.clone());
                Ok(NextPage::Fetch(token))
            }
            None => Err(Error::MissingPageToken {
                page: self.snapshot.pages_fetched,
            }),
        }
    }

    pub fn pages_fetched(&self) -> usize {
        self.snapshot.pages_fetched
    }

    /// The assembled snapshot, or `None` if the store has not reported the
    /// last page yet.
    pub fn finish(self) -> Option<RemoteSnapshot> {
        self.exhausted.then_some(self.snapshot)
    }
}
