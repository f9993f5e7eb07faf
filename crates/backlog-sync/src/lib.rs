//! Reconciliation of remote backlog data into the local record store.
//!
//! Every read goes through [`BacklogSync`], which serves from the store when
//! it can and otherwise fetches from the remote source, merges the result
//! idempotently, and re-reads what was durably written.

pub mod engine;

pub use engine::BacklogSync;
