//! Discriminator registry and record dispatcher
//!
//! A [`Registry`] maps report classes to [`ReportSchema`]s. It is filled once,
//! before decoding starts, and is read-only afterwards; decoding needs no
//! locking and keeps no state between records.

use std::collections::HashMap;

use log::{debug, trace};
use serde_json::Value;

use crate::{
    Result,
    error::{DecodeError, DecodeErrorKind},
    protocol::schema::{FieldSpec, Record, Report},
};

/// Wire key holding the report discriminator
pub const CLASS_KEY: &str = "class";

/// Decoding entry for one report class
///
/// `M` is the output type shared by every schema of a registry, usually
/// a closed enum of report variants.
pub struct ReportSchema<M> {
    class: &'static str,
    fields: &'static [FieldSpec],
    decode: fn(&Record) -> core::result::Result<M, DecodeErrorKind>,
}

impl<M> ReportSchema<M> {
    /// Schema of report type `R`, converted into `M` on success
    pub fn of<R>() -> Self
    where
        R: Report + Into<M>,
    {
        ReportSchema {
            class: R::CLASS,
            fields: R::FIELDS,
            decode: decode_into::<R, M>,
        }
    }

    /// Discriminator of the underlying report type
    pub fn class(&self) -> &'static str {
        self.class
    }

    /// Rename table of the underlying report type
    pub fn fields(&self) -> &'static [FieldSpec] {
        self.fields
    }

    pub fn decode(&self, record: &Record) -> core::result::Result<M, DecodeErrorKind> {
        (self.decode)(record)
    }
}

impl<M> Clone for ReportSchema<M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M> Copy for ReportSchema<M> {}

impl<M> core::fmt::Debug for ReportSchema<M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ReportSchema")
            .field("class", &self.class)
            .field("fields", &self.fields.len())
            .finish()
    }
}

fn decode_into<R, M>(record: &Record) -> core::result::Result<M, DecodeErrorKind>
where
    R: Report + Into<M>,
{
    R::decode_fields(record).map(Into::into)
}

/// Report class registry
#[derive(Debug)]
pub struct Registry<M> {
    schemas: HashMap<&'static str, ReportSchema<M>>,
}

impl<M> Default for Registry<M> {
    fn default() -> Self {
        Registry {
            schemas: HashMap::new(),
        }
    }
}

impl<M> Registry<M> {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `schema` under `class`, returning the schema it replaces
    ///
    /// The class need not equal `schema.class()`, which allows aliases.
    pub fn register(
        &mut self,
        class: &'static str,
        schema: ReportSchema<M>,
    ) -> Option<ReportSchema<M>> {
        debug!(
            "registering {} schema under class {} ({} fields)",
            schema.class(),
            class,
            schema.fields().len()
        );
        self.schemas.insert(class, schema)
    }

    /// Registers report type `R` under its own class
    pub fn with<R>(mut self) -> Self
    where
        R: Report + Into<M>,
    {
        self.register(R::CLASS, ReportSchema::of::<R>());
        self
    }

    pub fn lookup(&self, class: &str) -> Option<&ReportSchema<M>> {
        self.schemas.get(class)
    }

    /// Registered classes, in no particular order
    pub fn classes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.schemas.keys().copied()
    }

    /// Decodes `record` with the schema registered for `class`
    ///
    /// On failure the record is handed back untouched inside the error.
    pub fn dispatch(
        &self,
        class: &str,
        record: Record,
    ) -> core::result::Result<M, DecodeError> {
        let Some(schema) = self.lookup(class) else {
            debug!("no schema registered for class {class}");
            return Err(DecodeError::new(
                DecodeErrorKind::UnknownReportType {
                    class: class.to_owned(),
                },
                Some(class.to_owned()),
                Value::Object(record),
            ));
        };

        trace!("decoding {class} record with {} keys", record.len());
        schema.decode(&record).map_err(|kind| {
            debug!("failed to decode {class} record: {kind}");
            DecodeError::new(kind, Some(class.to_owned()), Value::Object(record))
        })
    }

    /// Reads the discriminator of `record` and dispatches it
    pub fn decode_record(&self, record: Record) -> core::result::Result<M, DecodeError> {
        let class = match record.get(CLASS_KEY) {
            Some(Value::String(class)) => class.clone(),
            Some(_) => {
                return Err(malformed(
                    "discriminator is not a string",
                    Value::Object(record),
                ));
            }
            None => return Err(malformed("missing discriminator", Value::Object(record))),
        };

        self.dispatch(&class, record)
    }

    /// Decodes one parsed JSON document, which must be an object
    pub fn decode_value(&self, value: Value) -> core::result::Result<M, DecodeError> {
        match value {
            Value::Object(record) => self.decode_record(record),
            other => Err(DecodeError::new(
                DecodeErrorKind::MalformedRecord {
                    field: None,
                    reason: "record is not a JSON object",
                },
                None,
                other,
            )),
        }
    }

    /// Parses and decodes one line of text
    pub fn decode_str(&self, line: &str) -> Result<M> {
        let value: Value = serde_json::from_str(line)?;
        Ok(self.decode_value(value)?)
    }
}

fn malformed(reason: &'static str, record: Value) -> DecodeError {
    debug!("malformed record: {reason}");
    DecodeError::new(
        DecodeErrorKind::MalformedRecord {
            field: Some(CLASS_KEY),
            reason,
        },
        None,
        record,
    )
}
