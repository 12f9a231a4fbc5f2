use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use serde_repr::Deserialize_repr;

use crate::error::{DecodeErrorKind, ValueKind};
use crate::protocol::schema::{WireValue, required_field, schema, type_mismatch};

/// Implements [`WireValue`] for an integer-coded enum through its serde_repr table
///
/// Any value outside the table, including a value of the wrong JSON type,
/// is an invalid code.
macro_rules! wire_code {
    ($($ty:ty as $repr:ty),* $(,)?) => {$(
        impl WireValue for $ty {
            const KIND: ValueKind = ValueKind::Enum;

            fn from_wire(field: &'static str, value: &Value) -> Result<Self, DecodeErrorKind> {
                <$ty>::deserialize(value).map_err(|_| DecodeErrorKind::InvalidEnumValue {
                    field,
                    value: value.clone(),
                })
            }

            fn to_wire(&self) -> Value {
                Value::from(*self as $repr)
            }
        }
    )*};
}

/// NMEA fix mode
/// * [gps_fix_t.mode](https://gitlab.com/gpsd/gpsd/-/blob/release-3.25/include/gps.h?ref_type=tags#L181)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize_repr)]
#[repr(i32)]
pub enum FixMode {
    /// Mode update not seen yet
    NotSeen = 0,
    NoFix = 1,
    Fix2D = 2,
    Fix3D = 3,
}

impl FixMode {
    /// Whether latitude and longitude can be present
    pub fn has_fix(self) -> bool {
        matches!(self, FixMode::Fix2D | FixMode::Fix3D)
    }

    /// Whether altitude can be present
    pub fn has_altitude(self) -> bool {
        self == FixMode::Fix3D
    }
}

/// * [gps_fix_t.status](https://gitlab.com/gpsd/gpsd/-/blob/release-3.25/include/gps.h?ref_type=tags#L192)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize_repr)]
#[repr(i32)]
pub enum FixStatus {
    /// Unknown status
    Unknown = 0,
    Gps = 1,
    /// with DGPS
    DGps = 2,
    /// with RTK Fixed
    RTKFixed = 3,
    /// with RTK Float
    RTKFloat = 4,
    /// with dead reckoning
    DR = 5,
    /// with GNSS + dead reckoning
    GnssDR = 6,
    /// time only (surveyed in, manual)
    Time = 7,
    /// simulated
    Simulated = 8,
    /// Precise Positioning Service (PPS)
    PpsFix = 9,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize_repr)]
#[repr(i32)]
pub enum AntennaStatus {
    Unknown = 0,
    Ok = 1,
    Open = 2,
    Short = 3,
}

/// Known satellite health codes, used to interpret `health`
/// * [satellite.health](https://gitlab.com/gpsd/gpsd/-/blob/release-3.25/include/gps.h?ref_type=tags#L2504)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SatHealth {
    Unknown,
    Ok,
    Bad,
}

impl TryFrom<u8> for SatHealth {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(SatHealth::Unknown),
            1 => Ok(SatHealth::Ok),
            2 => Ok(SatHealth::Bad),
            other => Err(other),
        }
    }
}

wire_code!(FixMode as i32, FixStatus as i32, AntennaStatus as i32);

required_field!(FixMode);

/// u-blox constellation identifiers, used to interpret `gnssid`
/// * [satellite.gnssid](https://gitlab.com/gpsd/gpsd/-/blob/release-3.25/include/gps.h?ref_type=tags#L2449)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GnssId {
    Gps,
    Sbas,
    Gal,
    Bd,
    Imes,
    Qzss,
    Glo,
    Irnss,
}

impl TryFrom<u8> for GnssId {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(GnssId::Gps),
            1 => Ok(GnssId::Sbas),
            2 => Ok(GnssId::Gal),
            3 => Ok(GnssId::Bd),
            4 => Ok(GnssId::Imes),
            5 => Ok(GnssId::Qzss),
            6 => Ok(GnssId::Glo),
            7 => Ok(GnssId::Irnss),
            other => Err(other),
        }
    }
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PropertyFlags: u32 {
        /// GPS data has been seen on this device
        const SEEN_GPS = 0x01;
        /// RTCM2 data has been seen on this device
        const SEEN_RTCM2 = 0x02;
        /// RTCM3 data has been seen on this device
        const SEEN_RTCM3 = 0x04;
        /// AIS data has been seen on this device
        const SEEN_AIS = 0x08;
    }
}

/// Unknown bits are dropped rather than rejected.
impl WireValue for PropertyFlags {
    const KIND: ValueKind = ValueKind::Flags;

    fn from_wire(field: &'static str, value: &Value) -> Result<Self, DecodeErrorKind> {
        value
            .as_u64()
            .and_then(|bits| u32::try_from(bits).ok())
            .map(PropertyFlags::from_bits_truncate)
            .ok_or_else(|| type_mismatch(field, Self::KIND, value))
    }

    fn to_wire(&self) -> Value {
        Value::from(self.bits())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parity {
    No,
    Odd,
    Even,
}

impl WireValue for Parity {
    const KIND: ValueKind = ValueKind::Enum;

    fn from_wire(field: &'static str, value: &Value) -> Result<Self, DecodeErrorKind> {
        match value.as_str() {
            Some("N") => Ok(Parity::No),
            Some("O") => Ok(Parity::Odd),
            Some("E") => Ok(Parity::Even),
            _ => Err(DecodeErrorKind::InvalidEnumValue {
                field,
                value: value.clone(),
            }),
        }
    }

    fn to_wire(&self) -> Value {
        let code = match self {
            Parity::No => "N",
            Parity::Odd => "O",
            Parity::Even => "E",
        };
        Value::from(code)
    }
}

schema! {
    /// One row of a sky view
    ///
    /// PRN ranges: 1-63 GNSS, 64-96 GLONASS, 100-164 SBAS. The ranges are
    /// informative only and are not checked.
    /// - [json_attrs_satellites](https://gitlab.com/gpsd/gpsd/-/blob/master/libgps/libgps_json.c?ref_type=heads#L295)
    pub struct Satellite {
        /// PRN ID of the satellite
        pub prn: i16 => "PRN",
        /// Azimuth, degrees from true north
        pub azimuth: Option<f64> => "az",
        /// Elevation in degrees
        pub elevation: Option<f64> => "el",
        /// Signal strength in dB
        pub signal_strength: Option<f64> => "ss",
        /// Used in current solution
        pub used: bool => "used" = false,
        /// GNSS ID, as defined by u-blox, not NMEA
        pub gnss_id: Option<u8> => "gnssid",
        /// Satellite ID within its constellation, as defined by u-blox
        pub satellite_id: Option<u16> => "svid",
        pub signal_id: Option<u8> => "sigid",
        /// GLONASS frequency ID
        pub frequency_id: Option<i16> => "freqid",
        /// Health code: 0 unknown, 1 OK, 2 unhealthy
        pub health: u8 => "health" = 0,
        /// Pseudorange in meters
        pub pseudorange: Option<f64> => "pr",
        /// Pseudorange rate in meters/second
        pub pseudorange_rate: Option<f64> => "prRate",
        /// Pseudorange residual in meters
        pub pseudorange_residual: Option<f64> => "prRes",
    }
}

impl Satellite {
    /// Constellation of this satellite, when `gnssid` is reported and known
    pub fn constellation(&self) -> Option<GnssId> {
        self.gnss_id.and_then(|id| GnssId::try_from(id).ok())
    }

    /// Health of this satellite, when its code is a known one
    pub fn health_status(&self) -> Option<SatHealth> {
        SatHealth::try_from(self.health).ok()
    }
}

schema! {
    /// One raw measurement of a RAW report
    /// - [json_attrs_meas](https://gitlab.com/gpsd/gpsd/-/blob/master/libgps/libgps_json.c#L226)
    pub struct Measurement {
        /// GNSS ID, as defined by u-blox
        pub gnss_id: Option<u8> => "gnssid",
        pub satellite_id: Option<u16> => "svid",
        pub signal_id: Option<u8> => "sigid",
        /// Signal to noise ratio in dB-Hz
        pub snr: Option<u8> => "snr",
        pub frequency_id: Option<u8> => "freqid",
        /// RINEX observation code
        pub observation: Option<String> => "obs",
        /// Loss of lock indicator
        pub lli: Option<u8> => "lli",
        /// Lock time in milliseconds
        pub lock_time: Option<u32> => "locktime",
        pub carrier_phase: Option<f64> => "carrierphase",
        pub pseudorange: Option<f64> => "pseudorange",
        pub doppler: Option<f64> => "doppler",
        pub c2c: Option<f64> => "c2c",
        pub l2c: Option<f64> => "l2c",
    }
}

impl Measurement {
    /// Constellation of this measurement, when `gnssid` is reported and known
    pub fn constellation(&self) -> Option<GnssId> {
        self.gnss_id.and_then(|id| GnssId::try_from(id).ok())
    }
}

schema! {
    /// # Device Information
    /// - [json_device_read](https://gitlab.com/gpsd/gpsd/-/blob/master/libgps/shared_json.c#L28)
    pub struct Device {
        pub path: Option<String> => "path",
        pub activated: Option<DateTime<Utc>> => "activated",
        pub flags: Option<PropertyFlags> => "flags",
        pub driver: Option<String> => "driver",
        pub hexdata: Option<String> => "hexdata",
        pub sernum: Option<String> => "sernum",
        pub subtype: Option<String> => "subtype",
        pub subtype1: Option<String> => "subtype1",
        pub native: Option<i32> => "native",
        pub bps: Option<i32> => "bps",
        pub parity: Option<Parity> => "parity",
        pub stopbits: Option<u32> => "stopbits",
        pub cycle: Option<f64> => "cycle",
        pub mincycle: Option<f64> => "mincycle",
    }
}

schema! {
    /// # Watch Policy
    /// - [json_watch_read](https://gitlab.com/gpsd/gpsd/-/blob/master/libgps/shared_json.c#L95)
    pub struct Watch {
        pub device: Option<String> => "device",
        pub enable: Option<bool> => "enable",
        pub json: Option<bool> => "json",
        pub nmea: Option<bool> => "nmea",
        pub pps: Option<bool> => "pps",
        pub raw: Option<i32> => "raw",
        pub scaled: Option<bool> => "scaled",
        pub split24: Option<bool> => "split24",
        pub timing: Option<bool> => "timing",
        pub remote: Option<String> => "remote",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::schema::Schema;
    use serde_json::json;

    fn satellite(value: Value) -> Result<Satellite, DecodeErrorKind> {
        Satellite::decode_fields(value.as_object().unwrap())
    }

    #[test]
    fn test_proto_v3_types_flags() {
        let flags = PropertyFlags::SEEN_GPS | PropertyFlags::SEEN_AIS;
        assert_eq!(flags.to_wire(), json!(9));

        let decoded = PropertyFlags::from_wire("flags", &json!(9)).unwrap();
        assert_eq!(decoded, flags);

        let truncated = PropertyFlags::from_wire("flags", &json!(0x31)).unwrap();
        assert_eq!(truncated, PropertyFlags::SEEN_GPS);

        assert!(PropertyFlags::from_wire("flags", &json!("gps")).is_err());
    }

    #[test]
    fn test_fix_mode_codes() {
        assert_eq!(FixMode::from_wire("mode", &json!(3)).unwrap(), FixMode::Fix3D);
        assert!(FixMode::Fix2D.has_fix());
        assert!(!FixMode::Fix2D.has_altitude());
        assert!(!FixMode::NotSeen.has_fix());

        for bad in [json!(4), json!(-1), json!("3"), json!(2.5)] {
            assert_eq!(
                FixMode::from_wire("mode", &bad).unwrap_err(),
                DecodeErrorKind::InvalidEnumValue {
                    field: "mode",
                    value: bad.clone(),
                }
            );
        }
    }

    #[test]
    fn test_satellite_defaults() {
        let sat = satellite(json!({"PRN": 12})).unwrap();
        assert_eq!(sat.prn, 12);
        assert!(!sat.used);
        assert_eq!(sat.health, 0);
        assert_eq!(sat.health_status(), Some(SatHealth::Unknown));
        assert_eq!(sat.azimuth, None);
        assert_eq!(sat.constellation(), None);

        let sat = satellite(json!({
            "PRN": 70, "az": 0.0, "el": 0.0, "ss": 0.0, "used": true,
            "gnssid": 6, "svid": 6, "health": 1, "pr": 21234567.5, "prRes": -1.25
        }))
        .unwrap();
        assert_eq!(sat.azimuth, Some(0.0));
        assert_eq!(sat.signal_strength, Some(0.0));
        assert!(sat.used);
        assert_eq!(sat.constellation(), Some(GnssId::Glo));
        assert_eq!(sat.satellite_id, Some(6));
        assert_eq!(sat.health_status(), Some(SatHealth::Ok));
        assert_eq!(sat.pseudorange, Some(21234567.5));
        assert_eq!(sat.pseudorange_residual, Some(-1.25));
        assert_eq!(sat.pseudorange_rate, None);
    }

    #[test]
    fn test_satellite_unlisted_health_code() {
        let sat = satellite(json!({"PRN": 2, "health": 3})).unwrap();
        assert_eq!(sat.health, 3);
        assert_eq!(sat.health_status(), None);
        assert_eq!(sat.to_record().get("health"), Some(&json!(3)));
    }

    #[test]
    fn test_satellite_rejects_bad_values() {
        let err = satellite(json!({"PRN": 3, "health": "good"})).unwrap_err();
        assert!(matches!(
            err,
            DecodeErrorKind::FieldTypeMismatch { field: "health", expected: ValueKind::Integer, .. }
        ));

        let err = satellite(json!({"PRN": 3, "used": 1})).unwrap_err();
        assert!(matches!(
            err,
            DecodeErrorKind::FieldTypeMismatch { field: "used", expected: ValueKind::Boolean, .. }
        ));

        let err = satellite(json!({"az": 10.0})).unwrap_err();
        assert!(matches!(err, DecodeErrorKind::MalformedRecord { field: Some("PRN"), .. }));
    }

    #[test]
    fn test_device_parity() {
        let dev = Device::decode_fields(
            json!({"path": "/dev/ttyUSB0", "parity": "N", "bps": 9600, "flags": 1})
                .as_object()
                .unwrap(),
        )
        .unwrap();
        assert_eq!(dev.parity, Some(Parity::No));
        assert_eq!(dev.flags, Some(PropertyFlags::SEEN_GPS));
        assert_eq!(dev.to_record().get("parity"), Some(&json!("N")));

        let err = Device::decode_fields(json!({"parity": "X"}).as_object().unwrap()).unwrap_err();
        assert_eq!(err.field(), Some("parity"));
    }
}
