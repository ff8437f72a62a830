// Core modules implementing the record codec, field mapping, storage, and error modeling.
pub mod backend;
pub mod codec;
pub mod error;
pub mod field;
pub mod format;
pub mod load;
pub mod store;
