//! Flat-file persistence for the rename queue and ledger
//!
//! Both stores are JSON array files with the same discipline: loaded
//! wholesale at startup, rewritten wholesale after every mutation, and a
//! missing file means an empty store rather than an error. Each store
//! serializes its writers behind an internal mutex, so the backing file
//! never sees more than one writer.

mod ledger;
mod queue;

pub use ledger::LedgerStore;
pub use queue::QueueStore;
