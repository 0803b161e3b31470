//! Remote snapshot reader.

use crate::error::SyncError;
use crate::store::{RemoteStore, StoreError};
use bondsync_engine::{clamp_page_size, NextPage, RemoteSnapshot, SnapshotBuilder};

/// Read the whole remote table, page by page.
///
/// Pages are requested strictly one after another, each with the token from
/// the previous response, until the store reports no further pages. Any
/// failure discards what was read so far.
pub async fn fetch_all<S: RemoteStore + ?Sized>(
    store: &S,
    page_size: u32,
) -> Result<RemoteSnapshot, SyncError> {
    let page_size = clamp_page_size(page_size);
    let mut builder = SnapshotBuilder::new();
    let mut token: Option<String> = None;

    loop {
        let page = store
            .query(page_size, token.as_deref())
            .await
            .map_err(|source| SyncError::IncompleteSnapshot {
                pages_fetched: builder.pages_fetched(),
                source,
            })?;

        tracing::debug!(
            page = builder.pages_fetched() + 1,
            rows = page.entries.len(),
            has_more = page.has_more,
            "fetched snapshot page"
        );

        match builder.absorb(page) {
            Ok(NextPage::Fetch(next)) => token = Some(next),
            Ok(NextPage::Done) => break,
            Err(e) => {
                return Err(SyncError::IncompleteSnapshot {
                    pages_fetched: builder.pages_fetched(),
                    source: StoreError::Pagination(e),
                })
            }
        }
    }

    let pages_fetched = builder.pages_fetched();
    builder.finish().ok_or(SyncError::IncompleteSnapshot {
        pages_fetched,
        source: StoreError::Decode("store never reported the last page".into()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mock::{Call, MockStore};
    use bondsync_engine::{fields, CanonicalRecord, RemoteEntry, RemotePage};
    use std::sync::Arc;

    fn entry(id: &str, code: &str) -> RemoteEntry {
        RemoteEntry::new(id, CanonicalRecord::new().with(fields::CODE, code))
    }

    #[tokio::test]
    async fn empty_table_still_queries_once() {
        let store = Arc::new(MockStore::with_pages(vec![RemotePage::last(vec![])]));

        let snapshot = fetch_all(&store, 500).await.unwrap();

        assert!(snapshot.is_empty());
        assert_eq!(
            store.calls(),
            vec![Call::Query {
                page_size: 500,
                page_token: None
            }]
        );
    }

    #[tokio::test]
    async fn two_pages_in_request_order() {
        let store = Arc::new(MockStore::with_pages(vec![
            RemotePage::more(vec![entry("r1", "a"), entry("r2", "b")], "tok1"),
            RemotePage::last(vec![entry("r3", "c")]),
        ]));

        let snapshot = fetch_all(&store, 2).await.unwrap();

        let ids: Vec<_> = snapshot.entries.iter().map(|e| e.record_id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r2", "r3"]);
        assert_eq!(
            store.calls(),
            vec![
                Call::Query {
                    page_size: 2,
                    page_token: None
                },
                Call::Query {
                    page_size: 2,
                    page_token: Some("tok1".into())
                },
            ]
        );
    }

    #[tokio::test]
    async fn page_size_is_clamped_to_store_maximum() {
        let store = Arc::new(MockStore::with_pages(vec![RemotePage::last(vec![])]));
        fetch_all(&store, 5_000).await.unwrap();

        assert_eq!(
            store.calls()[0],
            Call::Query {
                page_size: 500,
                page_token: None
            }
        );
    }

    #[tokio::test]
    async fn failed_page_aborts_whole_fetch() {
        let store = Arc::new(
            MockStore::with_pages(vec![RemotePage::more(vec![entry("r1", "a")], "tok1")])
                .then_fail_query(1254040),
        );

        let err = fetch_all(&store, 500).await.unwrap_err();

        match err {
            SyncError::IncompleteSnapshot {
                pages_fetched,
                source: StoreError::Api { code, .. },
            } => {
                assert_eq!(pages_fetched, 1);
                assert_eq!(code, 1254040);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn has_more_without_token_aborts() {
        let page = RemotePage {
            entries: vec![entry("r1", "a")],
            has_more: true,
            page_token: None,
            total: None,
        };
        let store = Arc::new(MockStore::with_pages(vec![page]));

        let err = fetch_all(&store, 500).await.unwrap_err();

        assert!(matches!(
            err,
            SyncError::IncompleteSnapshot {
                source: StoreError::Pagination(_),
                ..
            }
        ));
        assert_eq!(store.query_count(), 1);
    }
}
