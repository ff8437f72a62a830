//! Purpose: Compose the codec and field mapper into whole-collection decode/encode.
//! Exports: `ErrorPolicy`, `LoadOptions`, `LoadReport`, `FieldIssue`, `decode_records`,
//! `encode_records`.
//! Role: Applies the configured coercion policy and aggregates per-field outcomes.
//! Invariants: Malformed lines never reach this layer; only coercion failures are policy-driven.
//! Invariants: Under `Skip`, every failure is recorded and the load always completes.

use tracing::trace;

use crate::core::codec::{self, Event, Parser};
use crate::core::error::{Error, ErrorKind};
use crate::core::field::{Assign, CoercionReason, Record, Schema};

/// What a coercion failure does to an in-progress load.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum ErrorPolicy {
    /// Record the failure, keep the field's prior value, continue.
    #[default]
    Skip,
    /// Skip integer and list-shape failures, abort on unknown enum variants.
    StopOnEnum,
    /// Abort on the first coercion failure.
    Stop,
}

impl ErrorPolicy {
    fn aborts(self, reason: CoercionReason) -> bool {
        match self {
            ErrorPolicy::Skip => false,
            ErrorPolicy::StopOnEnum => reason == CoercionReason::UnknownVariant,
            ErrorPolicy::Stop => true,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct LoadOptions {
    pub errors: ErrorPolicy,
}

impl LoadOptions {
    pub fn with_errors(mut self, errors: ErrorPolicy) -> Self {
        self.errors = errors;
        self
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldIssue {
    /// Index of the record within the loaded collection.
    pub record: usize,
    pub line: usize,
    pub key: String,
    pub raw: String,
    pub reason: CoercionReason,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LoadReport {
    pub records: usize,
    pub assigned: u64,
    /// Keys with no matching field, or matching a read-only field.
    pub ignored: u64,
    pub issues: Vec<FieldIssue>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

pub fn decode_records<R: Record>(
    text: &str,
    schema: &Schema<R>,
    options: LoadOptions,
) -> Result<(Vec<R>, LoadReport), Error> {
    let mut records = Vec::<R>::new();
    let mut report = LoadReport::default();

    for event in Parser::new(text) {
        match event {
            Event::Section { .. } => records.push(R::default()),
            Event::Field { key, value, line } => {
                let Some(index) = records.len().checked_sub(1) else {
                    continue;
                };
                match schema.assign(&mut records[index], key, value) {
                    Assign::Set => report.assigned += 1,
                    Assign::Ignored => report.ignored += 1,
                    Assign::Failed(coercion) => {
                        if options.errors.aborts(coercion.reason) {
                            return Err(Error::new(ErrorKind::Coercion)
                                .with_message(coercion.to_string())
                                .with_field(key)
                                .with_line(line)
                                .with_hint("Fix the value or load with the skip error policy.")
                                .with_source(coercion));
                        }
                        trace!(line, key, reason = coercion.reason.as_str(), "field left unset");
                        report.issues.push(FieldIssue {
                            record: index,
                            line,
                            key: key.to_owned(),
                            raw: coercion.raw,
                            reason: coercion.reason,
                        });
                    }
                }
            }
        }
    }

    report.records = records.len();
    Ok((records, report))
}

pub fn encode_records<R: Record>(records: &[R], schema: &Schema<R>) -> String {
    let sections = records
        .iter()
        .map(|record| schema.encode(record))
        .collect::<Vec<_>>();
    codec::render(sections.iter().map(Vec::as_slice))
}
