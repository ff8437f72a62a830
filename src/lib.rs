//! Purpose: Typed flat-file record store shared by the `recfile` CLI and tests.
//! Exports: `api` (stable surface) and `core` (codec, field mapping, store, errors).
//! Role: Library backing the binary; record types plug in through `api::Record`.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
//! Invariants: Loading never aborts on a malformed line; only the error policy can stop it.
pub mod api;
pub mod core;
