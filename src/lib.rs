//! # gpsd-report
//!
//! A Rust library for decoding the reports of GPSD (GPS Service Daemon)
//! JSON protocol into strongly-typed values.
//!
//! ## Overview
//!
//! GPSD streams newline-delimited JSON objects to its clients. Each object
//! carries a "class" discriminator (`TPV`, `SKY`, ...) naming its report type,
//! and most of its fields are only present when the receiver has something to
//! say about them.
//!
//! This library turns one such object into exactly one typed report, or one
//! [`error::DecodeError`] that keeps the raw record. It never stops a stream on
//! a bad line, never invents a value for an absent field, and ignores wire
//! fields it does not know.
//!
//! The decoder performs no I/O: connecting to the daemon, issuing commands
//! and reconnecting are left to the caller.
//!
//! ## Example
//!
//! ```
//! use gpsd_report::protocol::v3::{self, Message};
//!
//! let line = r#"{"class":"TPV","mode":3,"lat":42.5,"lon":23.3,"alt":550.2}"#;
//! match v3::decode_str(line) {
//!     Ok(Message::Tpv(tpv)) => println!("fix at {:?}", tpv.position()),
//!     Ok(other) => println!("{} report", other.class()),
//!     Err(err) => eprintln!("skipping line: {err}"),
//! }
//! ```

use crate::error::GpsdJsonError;

/// Error types used throughout the library
pub mod error;

/// Protocol definitions and report decoding for GPSD JSON protocol
pub mod protocol;

/// Convenience type alias for Results with GpsdJsonError
pub type Result<T> = core::result::Result<T, GpsdJsonError>;
