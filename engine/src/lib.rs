//! # Bondsync Engine
//!
//! Deterministic reconciliation of scraped bond quotes against a remote
//! paginated table.
//!
//! This crate holds the pure half of a reconciliation pass: mapping raw
//! quotes into the table's schema, assembling a snapshot from query pages,
//! and diffing that snapshot against the target rows. Network access lives
//! in the service crate.
//!
//! ## Design Principles
//!
//! - **No IO**: the engine never talks to the store; callers feed it pages
//! - **Deterministic**: same snapshot and target always give the same plan
//! - **Keyed by business code**: remote identifiers are only carried along
//!
//! ## Core Concepts
//!
//! ### Records
//!
//! - [`RawRecord`] - one scraped quote, as the producer sends it
//! - [`CanonicalRecord`] - the same quote in the table's column layout
//! - [`RemoteEntry`] - a canonical row plus the store's record id
//!
//! ### Snapshot
//!
//! [`SnapshotBuilder`] absorbs query pages until the store reports
//! exhaustion, then yields a [`RemoteSnapshot`].
//!
//! ### Reconciliation
//!
//! [`Reconciler`] partitions the target into a [`ReconciliationPlan`]:
//! rows to create, rows to update (with the matched record id) and rows to
//! delete. Every code ends up in exactly one of the three.
//!
//! ## Quick Start
//!
//! ```rust
//! use bondsync_engine::{
//!     map, plan, RawRecord, RemoteEntry, RemoteSnapshot, CanonicalRecord, fields,
//! };
//!
//! let raw = RawRecord {
//!     bond_id: Some("113050".into()),
//!     bond_nm: Some("南银转债".into()),
//!     price: Some(112.3.into()),
//!     premium_rt: Some(12.5.into()),
//!     dblow: Some(124.8.into()),
//!     btype: Some("C".into()),
//!     year_left: Some(2.35.into()),
//!     short_maturity_dt: Some("26-06-15".into()),
//! };
//! let target = vec![map(&raw).unwrap()];
//!
//! let snapshot = RemoteSnapshot::from_entries(vec![
//!     RemoteEntry::new("rec1", CanonicalRecord::new().with(fields::CODE, "113050")),
//!     RemoteEntry::new("rec2", CanonicalRecord::new().with(fields::CODE, "128001")),
//! ]);
//!
//! let plan = plan(snapshot, target);
//! assert_eq!(plan.to_update[0].record_id, "rec1");
//! assert_eq!(plan.to_delete[0].record_id, "rec2");
//! assert!(plan.to_create.is_empty());
//! ```

pub mod error;
pub mod mapper;
pub mod reconcile;
pub mod record;
pub mod snapshot;

// Re-export main types at crate root
pub use error::Error;
pub use mapper::{map, map_all, MappedBatch, MappingFailure, MappingPolicy};
pub use reconcile::{
    plan, DeleteEntry, PlanSummary, ReconciliationPlan, Reconciler, UpdateEntry,
};
pub use record::{
    dedupe_by_code, fields, BondType, CanonicalRecord, RawNumber, RawRecord, RemoteEntry,
};
pub use snapshot::{
    clamp_page_size, NextPage, RemotePage, RemoteSnapshot, SnapshotBuilder, DEFAULT_PAGE_SIZE,
    MAX_PAGE_SIZE,
};

/// Type aliases for clarity
pub type RecordId = String;
pub type Code = String;
/// Milliseconds since the Unix epoch
pub type Timestamp = i64;
