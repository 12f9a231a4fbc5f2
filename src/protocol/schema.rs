//! Field binding between raw wire records and typed report entities
//!
//! Every entity declares a rename table ([`FieldSpec`]) that pairs each Rust
//! field with its wire key, semantic type and presence rule. The table,
//! the struct, its decoder and its encoder are all generated from a single
//! [`schema!`] declaration, so they cannot drift apart.
//!
//! Binding rules:
//! - an absent key or a JSON `null` binds an optional field to `None`
//! - a defaulted field falls back to its declared default instead
//! - a required field that is absent fails with `MalformedRecord`
//! - wire keys not named by the schema are ignored

use chrono::{DateTime, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use serde_json::{Map, Value};

use crate::error::{DecodeErrorKind, ValueKind};

/// Raw record as handed over by the JSON layer
pub type Record = Map<String, Value>;

/// How a field behaves when its wire key is absent or null
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Presence {
    Required,
    Optional,
    Defaulted,
}

/// One row of a schema's rename table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldSpec {
    /// Rust field name
    pub name: &'static str,
    /// Key on the wire
    pub wire: &'static str,
    pub kind: ValueKind,
    pub presence: Presence,
}

/// A value type that can be carried by a present wire value
pub trait WireValue: Sized {
    const KIND: ValueKind;

    /// Converts a present, non-null wire value
    fn from_wire(field: &'static str, value: &Value) -> Result<Self, DecodeErrorKind>;

    fn to_wire(&self) -> Value;
}

/// A schema field: a wire value plus its presence rule
pub trait Field: Sized {
    const KIND: ValueKind;
    const PRESENCE: Presence;

    /// Binds the value found under `field`, or `None` when the key is absent
    fn bind(field: &'static str, value: Option<&Value>) -> Result<Self, DecodeErrorKind>;

    /// Same as [`Field::bind`], but absence yields `default`
    fn bind_or(
        field: &'static str,
        value: Option<&Value>,
        default: Self,
    ) -> Result<Self, DecodeErrorKind> {
        match value {
            None | Some(Value::Null) => Ok(default),
            Some(_) => Self::bind(field, value),
        }
    }

    /// Wire value to emit, `None` when the field is absent
    fn unbind(&self) -> Option<Value>;
}

/// An entity decoded from, and encoded to, a string-keyed record
pub trait Schema: Sized {
    /// Rename table, in declaration order
    const FIELDS: &'static [FieldSpec];

    fn decode_fields(record: &Record) -> Result<Self, DecodeErrorKind>;

    fn encode_fields(&self, record: &mut Record);

    /// Encodes into a fresh record, absent fields omitted
    fn to_record(&self) -> Record {
        let mut record = Record::new();
        self.encode_fields(&mut record);
        record
    }

    /// Looks up a rename table row by Rust field name
    fn field(name: &str) -> Option<&'static FieldSpec> {
        Self::FIELDS.iter().find(|spec| spec.name == name)
    }
}

/// A top-level report, identified on the wire by a fixed discriminator
pub trait Report: Schema {
    const CLASS: &'static str;
}

pub(crate) fn type_mismatch(
    field: &'static str,
    expected: ValueKind,
    value: &Value,
) -> DecodeErrorKind {
    DecodeErrorKind::FieldTypeMismatch {
        field,
        expected,
        value: value.clone(),
    }
}

pub(crate) fn bind_required<T: WireValue>(
    field: &'static str,
    value: Option<&Value>,
) -> Result<T, DecodeErrorKind> {
    match value {
        None | Some(Value::Null) => Err(DecodeErrorKind::MalformedRecord {
            field: Some(field),
            reason: "missing required field",
        }),
        Some(value) => T::from_wire(field, value),
    }
}

impl<T: WireValue> Field for Option<T> {
    const KIND: ValueKind = T::KIND;
    const PRESENCE: Presence = Presence::Optional;

    fn bind(field: &'static str, value: Option<&Value>) -> Result<Self, DecodeErrorKind> {
        match value {
            None | Some(Value::Null) => Ok(None),
            Some(value) => T::from_wire(field, value).map(Some),
        }
    }

    fn unbind(&self) -> Option<Value> {
        self.as_ref().map(WireValue::to_wire)
    }
}

impl<T: Schema> Field for Vec<T> {
    const KIND: ValueKind = ValueKind::Array;
    const PRESENCE: Presence = Presence::Required;

    fn bind(field: &'static str, value: Option<&Value>) -> Result<Self, DecodeErrorKind> {
        bind_required(field, value)
    }

    fn unbind(&self) -> Option<Value> {
        Some(self.to_wire())
    }
}

/// Implements [`Field`] as a required field for plain wire value types
macro_rules! required_field {
    ($($ty:ty),* $(,)?) => {$(
        impl $crate::protocol::schema::Field for $ty {
            const KIND: $crate::error::ValueKind =
                <$ty as $crate::protocol::schema::WireValue>::KIND;
            const PRESENCE: $crate::protocol::schema::Presence =
                $crate::protocol::schema::Presence::Required;

            fn bind(
                field: &'static str,
                value: Option<&::serde_json::Value>,
            ) -> ::core::result::Result<Self, $crate::error::DecodeErrorKind> {
                $crate::protocol::schema::bind_required(field, value)
            }

            fn unbind(&self) -> Option<::serde_json::Value> {
                Some($crate::protocol::schema::WireValue::to_wire(self))
            }
        }
    )*};
}
pub(crate) use required_field;

required_field!(bool, i16, i32, i64, u8, u16, u32, f64, String, DateTime<Utc>);

impl WireValue for bool {
    const KIND: ValueKind = ValueKind::Boolean;

    fn from_wire(field: &'static str, value: &Value) -> Result<Self, DecodeErrorKind> {
        value
            .as_bool()
            .ok_or_else(|| type_mismatch(field, <Self as WireValue>::KIND, value))
    }

    fn to_wire(&self) -> Value {
        Value::Bool(*self)
    }
}

impl WireValue for f64 {
    const KIND: ValueKind = ValueKind::Number;

    fn from_wire(field: &'static str, value: &Value) -> Result<Self, DecodeErrorKind> {
        value
            .as_f64()
            .ok_or_else(|| type_mismatch(field, <Self as WireValue>::KIND, value))
    }

    fn to_wire(&self) -> Value {
        Value::from(*self)
    }
}

macro_rules! wire_integer {
    ($($ty:ty),*) => {$(
        impl WireValue for $ty {
            const KIND: ValueKind = ValueKind::Integer;

            // Fractional numbers and values out of range are type mismatches.
            fn from_wire(field: &'static str, value: &Value) -> Result<Self, DecodeErrorKind> {
                value
                    .as_i64()
                    .and_then(|n| <$ty>::try_from(n).ok())
                    .ok_or_else(|| type_mismatch(field, <Self as WireValue>::KIND, value))
            }

            fn to_wire(&self) -> Value {
                Value::from(*self)
            }
        }
    )*};
}

wire_integer!(i16, i32, i64, u8, u16, u32);

impl WireValue for String {
    const KIND: ValueKind = ValueKind::String;

    fn from_wire(field: &'static str, value: &Value) -> Result<Self, DecodeErrorKind> {
        value
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| type_mismatch(field, <Self as WireValue>::KIND, value))
    }

    fn to_wire(&self) -> Value {
        Value::String(self.clone())
    }
}

/// ISO 8601 UTC timestamps, e.g. `2024-01-01T10:00:00.000Z`
///
/// A missing offset is read as UTC; any offset other than zero is rejected,
/// never converted. Digits past the millisecond are truncated.
impl WireValue for DateTime<Utc> {
    const KIND: ValueKind = ValueKind::Timestamp;

    fn from_wire(field: &'static str, value: &Value) -> Result<Self, DecodeErrorKind> {
        let Some(text) = value.as_str() else {
            return Err(type_mismatch(field, <Self as WireValue>::KIND, value));
        };

        let parsed = match DateTime::parse_from_rfc3339(text) {
            Ok(dt) if dt.offset().local_minus_utc() == 0 => Some(dt.with_timezone(&Utc)),
            Ok(_) => None,
            Err(_) => NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.and_utc()),
        };

        parsed
            .map(|dt| dt.trunc_subsecs(3))
            .ok_or_else(|| DecodeErrorKind::InvalidTimestamp {
                field,
                value: text.to_owned(),
            })
    }

    fn to_wire(&self) -> Value {
        Value::String(self.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}

/// Nested entity lists, decoded element by element in wire order
///
/// The first failing element rejects the whole list.
impl<T: Schema> WireValue for Vec<T> {
    const KIND: ValueKind = ValueKind::Array;

    fn from_wire(field: &'static str, value: &Value) -> Result<Self, DecodeErrorKind> {
        let Some(elements) = value.as_array() else {
            return Err(type_mismatch(field, <Self as WireValue>::KIND, value));
        };

        elements
            .iter()
            .enumerate()
            .map(|(index, element)| {
                let decoded = match element.as_object() {
                    Some(record) => T::decode_fields(record),
                    None => Err(type_mismatch(field, ValueKind::Object, element)),
                };
                decoded.map_err(|source| DecodeErrorKind::InvalidElement {
                    field,
                    index,
                    source: Box::new(source),
                })
            })
            .collect()
    }

    fn to_wire(&self) -> Value {
        Value::Array(
            self.iter()
                .map(|element| Value::Object(element.to_record()))
                .collect(),
        )
    }
}

/// Presence rule of a declared field
macro_rules! presence {
    ($ty:ty) => {
        <$ty as $crate::protocol::schema::Field>::PRESENCE
    };
    ($ty:ty, $default:expr) => {
        $crate::protocol::schema::Presence::Defaulted
    };
}
pub(crate) use presence;

/// Binds a declared field from a record
macro_rules! bind_field {
    ($record:ident, $ty:ty, $wire:literal) => {
        <$ty as $crate::protocol::schema::Field>::bind($wire, $record.get($wire))
    };
    ($record:ident, $ty:ty, $wire:literal, $default:expr) => {
        <$ty as $crate::protocol::schema::Field>::bind_or($wire, $record.get($wire), $default)
    };
}
pub(crate) use bind_field;

/// Declares an entity together with its rename table, decoder and encoder
///
/// ```ignore
/// schema! {
///     pub struct Satellite {
///         pub prn: i16 => "PRN",
///         pub azimuth: Option<f64> => "az",
///         pub used: bool => "used" = false,
///     }
/// }
/// ```
macro_rules! schema {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                pub $field:ident: $ty:ty => $wire:literal $(= $default:expr)?,
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            $(
                $(#[$field_meta])*
                pub $field: $ty,
            )*
        }

        impl $crate::protocol::schema::Schema for $name {
            const FIELDS: &'static [$crate::protocol::schema::FieldSpec] = &[
                $(
                    $crate::protocol::schema::FieldSpec {
                        name: stringify!($field),
                        wire: $wire,
                        kind: <$ty as $crate::protocol::schema::Field>::KIND,
                        presence: $crate::protocol::schema::presence!($ty $(, $default)?),
                    },
                )*
            ];

            fn decode_fields(
                record: &$crate::protocol::schema::Record,
            ) -> ::core::result::Result<Self, $crate::error::DecodeErrorKind> {
                ::core::result::Result::Ok($name {
                    $(
                        $field: $crate::protocol::schema::bind_field!(
                            record, $ty, $wire $(, $default)?
                        )?,
                    )*
                })
            }

            fn encode_fields(&self, record: &mut $crate::protocol::schema::Record) {
                $(
                    if let Some(value) = $crate::protocol::schema::Field::unbind(&self.$field) {
                        record.insert($wire.to_owned(), value);
                    }
                )*
            }
        }
    };
}
pub(crate) use schema;
