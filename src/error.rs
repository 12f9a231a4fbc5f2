//! Error types for GPSD JSON report decoding
//!
//! This module defines two layers of errors:
//!
//! - [`DecodeError`]: one failed record. It carries the failure kind, the
//!   report class (when it could be read) and the untouched raw record, so
//!   the caller can skip, replay or surface it.
//! - [`GpsdJsonError`]: the crate-level error returned by the line reading
//!   helpers, which additionally covers I/O and JSON tokenizing failures.

use serde_json::Value;

/// Semantic type of a wire value, as declared by a schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Boolean,
    Integer,
    Number,
    String,
    Timestamp,
    Enum,
    Flags,
    Array,
    Object,
}

impl core::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            ValueKind::Boolean => "boolean",
            ValueKind::Integer => "integer",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Timestamp => "timestamp",
            ValueKind::Enum => "enumerated code",
            ValueKind::Flags => "flag bits",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
        };
        f.write_str(name)
    }
}

/// Reason a single record could not be decoded
///
/// Field names are the wire keys, i.e. the names found in the raw record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeErrorKind {
    /// No schema is registered for the record's class
    #[error("unknown report class `{class}`")]
    UnknownReportType { class: String },

    /// The wire value has a different JSON type than the schema declares
    #[error("field `{field}`: expected {expected}, found `{value}`")]
    FieldTypeMismatch {
        field: &'static str,
        expected: ValueKind,
        value: Value,
    },

    /// A closed-set field holds a code outside its table
    #[error("field `{field}`: invalid code `{value}`")]
    InvalidEnumValue { field: &'static str, value: Value },

    /// A date-time field could not be parsed
    #[error("field `{field}`: invalid timestamp `{value}`")]
    InvalidTimestamp { field: &'static str, value: String },

    /// One element of a nested list failed; the whole list is rejected
    #[error("field `{field}` element {index}: {source}")]
    InvalidElement {
        field: &'static str,
        index: usize,
        source: Box<DecodeErrorKind>,
    },

    /// Structurally broken input
    #[error("malformed record: {reason}")]
    MalformedRecord {
        field: Option<&'static str>,
        reason: &'static str,
    },
}

impl DecodeErrorKind {
    /// Wire key of the offending field, if the failure concerns one
    ///
    /// For nested failures this is the outer list field.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            DecodeErrorKind::UnknownReportType { .. } => None,
            DecodeErrorKind::FieldTypeMismatch { field, .. }
            | DecodeErrorKind::InvalidEnumValue { field, .. }
            | DecodeErrorKind::InvalidTimestamp { field, .. }
            | DecodeErrorKind::InvalidElement { field, .. } => Some(*field),
            DecodeErrorKind::MalformedRecord { field, .. } => *field,
        }
    }

    /// Innermost cause, following nested list failures down
    pub fn root(&self) -> &DecodeErrorKind {
        let mut kind = self;
        while let DecodeErrorKind::InvalidElement { source, .. } = kind {
            kind = source.as_ref();
        }
        kind
    }
}

/// Failure to decode one record
///
/// The raw record is kept as it was received for diagnostics or replay.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{} report: {kind}", .class.as_deref().unwrap_or("unclassified"))]
pub struct DecodeError {
    kind: DecodeErrorKind,
    class: Option<String>,
    record: Value,
}

impl DecodeError {
    pub(crate) fn new(kind: DecodeErrorKind, class: Option<String>, record: Value) -> Self {
        DecodeError {
            kind,
            class,
            record,
        }
    }

    pub fn kind(&self) -> &DecodeErrorKind {
        &self.kind
    }

    /// Discriminator of the record, when present and a string
    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    /// Wire key of the offending field, if any
    pub fn field(&self) -> Option<&'static str> {
        self.kind.field()
    }

    /// The record exactly as it was handed to the dispatcher
    pub fn record(&self) -> &Value {
        &self.record
    }

    pub fn into_record(self) -> Value {
        self.record
    }
}

/// Main error type for GPSD JSON operations
#[derive(Debug, thiserror::Error)]
pub enum GpsdJsonError {
    /// I/O error occurred while reading lines
    #[error("IoError: {0}")]
    IoError(#[from] std::io::Error),

    /// The line is not a valid JSON document
    #[error("SerdeError: {0}")]
    SerdeError(#[from] serde_json::Error),

    /// The line is valid JSON but not a valid report
    #[error("DecodeError: {0}")]
    Decode(#[from] DecodeError),

    /// GPSD protocol version is not supported
    ///
    /// The tuple contains (major, minor) version numbers.
    #[error("UnsupportedProtocolVersion: {}.{}", .0.0, .0.1)]
    UnsupportedProtocolVersion((i32, i32)),
}
