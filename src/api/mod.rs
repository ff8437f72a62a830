//! Purpose: Define the public Rust API boundary for recfile.
//! Exports: Record traits, field descriptors, store, load policy, and errors.
//! Role: Additive-only surface re-exported from `core`.
//! Invariants: Callers describe record types through `Record::fields`, never by hand-written parsing.

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::backend::{Backend, FileBackend, MemoryBackend};
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::field::{
    Assign, Coercion, CoercionReason, Field, FieldKind, Record, Scalar, ScalarKind, Schema,
    Variants,
};
pub use crate::core::load::{
    ErrorPolicy, FieldIssue, LoadOptions, LoadReport, decode_records, encode_records,
};
pub use crate::core::store::Store;
