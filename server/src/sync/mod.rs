//! Reconciliation pass over the remote store.

mod executor;
mod ledger;
mod pass;
mod reader;

pub use executor::*;
pub use ledger::*;
pub use pass::*;
pub use reader::*;
