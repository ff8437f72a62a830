// Typed record collection backed by a flat file: load, save, and first-match CRUD.
// Single-threaded; callers that share a store must provide their own locking.
use std::any::Any;
use std::path::Path;

use tracing::debug;

use crate::core::backend::{Backend, FileBackend};
use crate::core::codec;
use crate::core::error::Error;
use crate::core::field::{Record, Schema};
use crate::core::load::{self, LoadOptions, LoadReport};

pub struct Store<R: Record, B: Backend = FileBackend> {
    backend: B,
    schema: Schema<R>,
    options: LoadOptions,
    items: Vec<R>,
    last_report: LoadReport,
}

impl<R: Record> Store<R, FileBackend> {
    /// Open a file-backed store and load it. A missing file yields an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::open_with(path, LoadOptions::default())
    }

    pub fn open_with(path: impl AsRef<Path>, options: LoadOptions) -> Result<Self, Error> {
        Self::with_backend(FileBackend::new(path), options)
    }

    pub fn path(&self) -> &Path {
        self.backend.path()
    }
}

impl<R: Record, B: Backend> Store<R, B> {
    pub fn with_backend(backend: B, options: LoadOptions) -> Result<Self, Error> {
        let mut store = Self {
            backend,
            schema: Schema::new(),
            options,
            items: Vec::new(),
            last_report: LoadReport::default(),
        };
        store.load()?;
        Ok(store)
    }

    /// Replace the collection with the backing contents. On error the collection is unchanged.
    pub fn load(&mut self) -> Result<LoadReport, Error> {
        let Some(bytes) = self.backend.read()? else {
            debug!("record file absent; starting empty");
            self.items.clear();
            self.last_report = LoadReport::default();
            return Ok(self.last_report.clone());
        };

        let text = codec::decode_text(&bytes);
        let (items, report) = load::decode_records(&text, &self.schema, self.options)?;
        debug!(
            records = report.records,
            assigned = report.assigned,
            ignored = report.ignored,
            issues = report.issues.len(),
            "loaded records"
        );
        self.items = items;
        self.last_report = report;
        Ok(self.last_report.clone())
    }

    /// Serialize the whole collection and overwrite the backing resource.
    pub fn save(&mut self) -> Result<(), Error> {
        let text = load::encode_records(&self.items, &self.schema);
        self.backend.write(text.as_bytes())?;
        debug!(records = self.items.len(), bytes = text.len(), "saved records");
        Ok(())
    }

    /// The live collection, in insertion order.
    pub fn get_all(&self) -> &[R] {
        &self.items
    }

    pub fn get_all_mut(&mut self) -> &mut Vec<R> {
        &mut self.items
    }

    pub fn create(&mut self, item: R) {
        self.items.push(item);
    }

    /// First record whose `key_field` equals `key`.
    pub fn find(&self, key_field: &str, key: &dyn Any) -> Result<Option<&R>, Error> {
        let position = self.position(key_field, key)?;
        Ok(position.map(|index| &self.items[index]))
    }

    /// Mutate the first match in place. `Ok(false)` when nothing matches.
    pub fn update<F>(&mut self, key_field: &str, key: &dyn Any, mutate: F) -> Result<bool, Error>
    where
        F: FnOnce(&mut R),
    {
        let Some(index) = self.position(key_field, key)? else {
            return Ok(false);
        };
        mutate(&mut self.items[index]);
        Ok(true)
    }

    /// Remove only the first match, keeping the order of the rest.
    pub fn delete(&mut self, key_field: &str, key: &dyn Any) -> Result<bool, Error> {
        let Some(index) = self.position(key_field, key)? else {
            return Ok(false);
        };
        self.items.remove(index);
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn schema(&self) -> &Schema<R> {
        &self.schema
    }

    pub fn options(&self) -> LoadOptions {
        self.options
    }

    pub fn last_report(&self) -> &LoadReport {
        &self.last_report
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn position(&self, key_field: &str, key: &dyn Any) -> Result<Option<usize>, Error> {
        let field = self.schema.key_field(key_field)?;
        Ok(self.items.iter().position(|item| field.matches(item, key)))
    }
}
