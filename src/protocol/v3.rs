//! GPSD JSON Protocol Version 3 report set
//!
//! This module implements the reports of version 3 of the GPSD JSON
//! protocol, the current stable protocol used by GPSD 3.x releases.
//!
//! # Protocol Overview
//!
//! - Reports are JSON objects, one per line
//! - The "class" field names the report type
//! - Fields a report does not carry are omitted by the daemon
//!
//! # References
//!
//! Based on the GPSD project protocol specification:
//! - [GPSD Protocol Documentation](https://gpsd.io/gpsd_json.html)
//! - [Protocol Version History](https://gitlab.com/gpsd/gpsd)

use std::sync::OnceLock;

use serde_json::Value;

use crate::{
    Result,
    error::DecodeError,
    protocol::{
        registry::{CLASS_KEY, Registry},
        schema::{Record, Report, Schema},
    },
};

/// Response message types and parsers
pub mod response;
/// Common data types used in protocol messages
pub mod types;

/// Protocol version 3 major version number
///
/// Reference: [release-3.25](https://gitlab.com/gpsd/gpsd/-/blob/release-3.25/SConscript?ref_type=tags#L226)
pub const API_VERSION_MAJOR: i32 = 3;

/// Protocol version 3 minor version number
///
/// This library supports protocol version 3.15 and later
pub const API_VERSION_MINOR: i32 = 15;

/// Declares the closed report set: the enum, its conversions and its registry
macro_rules! messages {
    ($( $(#[$meta:meta])* $variant:ident($ty:ty), )*) => {
        /// GPSD report types
        ///
        /// This enum represents every report the v3 registry decodes.
        /// Each variant corresponds to a specific "class" value on the wire.
        /// - [libgps_json_unpack](https://gitlab.com/gpsd/gpsd/-/blob/master/libgps/libgps_json.c#L792)
        #[derive(Debug, Clone, PartialEq)]
        pub enum Message {
            $( $(#[$meta])* $variant($ty), )*
        }

        $(
            impl From<$ty> for Message {
                fn from(report: $ty) -> Self {
                    Message::$variant(report)
                }
            }
        )*

        impl Message {
            /// Discriminator of this report
            pub fn class(&self) -> &'static str {
                match self {
                    $( Message::$variant(_) => <$ty as Report>::CLASS, )*
                }
            }

            fn encode_fields(&self, record: &mut Record) {
                match self {
                    $( Message::$variant(report) => report.encode_fields(record), )*
                }
            }
        }

        fn build_registry() -> Registry<Message> {
            Registry::new()
                $( .with::<$ty>() )*
        }
    };
}

messages! {
    /// Time-Position-Velocity report
    Tpv(response::Tpv),
    /// GPS pseudorange error statistics
    Gst(response::Gst),
    /// Satellite sky view report
    Sky(response::Sky),
    /// Attitude/orientation data
    Att(response::Attitude),
    /// List of available GPS devices
    Devices(response::DeviceList),
    /// Single GPS device information
    Device(types::Device),
    /// Current watch settings
    Watch(types::Watch),
    /// GPSD version information
    Version(response::Version),
    /// Error message from GPSD
    Error(response::Error),
    /// Time offset report
    Toff(response::TimeOffset),
    /// Pulse-per-second timing report
    Pps(response::Pps),
    /// Oscillator/clock discipline status
    Osc(response::Oscillator),
    /// Poll response with current fixes
    Poll(response::Poll),
    /// Raw receiver measurements
    Raw(response::Raw),
}

impl Message {
    /// Encodes back to a wire record, `class` included
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert(CLASS_KEY.to_owned(), Value::from(self.class()));
        self.encode_fields(&mut record);
        record
    }
}

impl serde::Serialize for Message {
    fn serialize<S>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serde::Serialize::serialize(&self.to_record(), serializer)
    }
}

/// Decodes through the process-wide [`registry`]; failures lose their
/// structure, use [`decode`] to keep it.
impl<'de> serde::Deserialize<'de> for Message {
    fn deserialize<D>(deserializer: D) -> core::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = <Value as serde::Deserialize>::deserialize(deserializer)?;
        registry().decode_value(value).map_err(serde::de::Error::custom)
    }
}

/// Process-wide registry of every v3 report class
///
/// Built on first use and never mutated afterwards.
pub fn registry() -> &'static Registry<Message> {
    static REGISTRY: OnceLock<Registry<Message>> = OnceLock::new();
    REGISTRY.get_or_init(build_registry)
}

/// Decodes one parsed JSON record into a v3 report
pub fn decode(value: Value) -> core::result::Result<Message, DecodeError> {
    registry().decode_value(value)
}

/// Parses and decodes one line of text into a v3 report
pub fn decode_str(line: &str) -> Result<Message> {
    registry().decode_str(line)
}
