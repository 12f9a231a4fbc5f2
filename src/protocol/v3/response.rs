//! GPSD Protocol v3 report types
//!
//! This module defines the reports that GPSD streams to clients.
//! Each report type corresponds to one "class" discriminator on the wire
//! and carries it as [`Report::CLASS`].
//!
//! Common report types include:
//! - TPV (Time-Position-Velocity): Core GPS fix data
//! - SKY: Satellite visibility and signal strength
//! - GST: GPS pseudorange error statistics
//! - ATT: Attitude/orientation data
//! - RAW: Raw receiver measurements
//! - DEVICE/DEVICES: GPS receiver information
//! - VERSION: GPSD daemon version information
//!
//! Optional fields are `Option`s: a field the daemon did not report is
//! `None`, never a zero. All timestamps are UTC and represented as
//! `DateTime<Utc>`.

use chrono::{DateTime, Utc};

use super::types::*;
use crate::{
    Result,
    error::GpsdJsonError,
    protocol::schema::{Report, schema},
};

schema! {
    /// Time-Position-Velocity (TPV) report
    ///
    /// The TPV message is the core GPS fix report. `mode` is always present;
    /// the other fields depend on fix quality:
    /// - latitude/longitude need a 2D or 3D fix
    /// - altitude needs a 3D fix
    /// - an error estimate is only reported alongside its quantity
    ///
    /// Reference: [json_tpv_read](https://gitlab.com/gpsd/gpsd/-/blob/master/libgps/libgps_json.c?ref_type=heads#L34)
    pub struct Tpv {
        /// Device path that provided this data
        pub device: Option<String> => "device",
        /// GPS fix mode (NoFix, 2D, 3D)
        pub mode: FixMode => "mode",
        /// GPS fix status (standard, DGPS, RTK, etc.)
        pub status: Option<FixStatus> => "status",
        /// GPS time of fix, up to millisecond precision
        pub time: Option<DateTime<Utc>> => "time",
        /// Current leap seconds (GPS-UTC offset)
        pub leap_seconds: Option<i32> => "leapseconds",
        /// Estimated time error in seconds, 95% confidence
        pub time_error: Option<f64> => "ept",
        /// Latitude in degrees (positive = North)
        pub latitude: Option<f64> => "lat",
        /// Longitude in degrees (positive = East)
        pub longitude: Option<f64> => "lon",
        /// Altitude, height above ellipsoid, in meters
        pub altitude_hae: Option<f64> => "altHAE",
        /// Altitude, MSL (mean sea level) in meters
        pub altitude_msl: Option<f64> => "altMSL",
        /// Altitude in meters (deprecated, use altMSL or altHAE)
        pub altitude: Option<f64> => "alt",
        /// Longitude error estimate in meters
        pub longitude_error: Option<f64> => "epx",
        /// Latitude error estimate in meters
        pub latitude_error: Option<f64> => "epy",
        /// Estimated vertical error in meters
        pub altitude_error: Option<f64> => "epv",
        /// Course over ground, degrees from true north
        pub course: Option<f64> => "track",
        /// Course over ground, degrees magnetic
        pub magnetic_course: Option<f64> => "magtrack",
        /// Magnetic variation in degrees, positive is West
        pub magnetic_variation: Option<f64> => "magvar",
        /// Speed over ground in meters/second
        pub speed: Option<f64> => "speed",
        /// Climb (positive) or sink (negative) rate in meters/second
        pub climb_rate: Option<f64> => "climb",
        /// Estimated track error in degrees
        pub course_error: Option<f64> => "epd",
        /// Estimated speed error in meters/second
        pub speed_error: Option<f64> => "eps",
        /// Estimated climb error in meters/second
        pub climb_rate_error: Option<f64> => "epc",
        pub ecef_x: Option<f64> => "ecefx",
        pub ecef_y: Option<f64> => "ecefy",
        pub ecef_z: Option<f64> => "ecefz",
        pub ecef_velocity_x: Option<f64> => "ecefvx",
        pub ecef_velocity_y: Option<f64> => "ecefvy",
        pub ecef_velocity_z: Option<f64> => "ecefvz",
        /// ECEF position error in meters
        pub ecef_position_error: Option<f64> => "ecefpAcc",
        /// ECEF velocity error in meters/second
        pub ecef_velocity_error: Option<f64> => "ecefvAcc",
        /// Geoid separation (height of geoid above WGS84 ellipsoid) in meters
        pub geoid_separation: Option<f64> => "geoidSep",
        /// Estimated horizontal position error in meters
        pub horizontal_position_error: Option<f64> => "eph",
        /// Spherical error probability in meters
        pub spherical_position_error: Option<f64> => "sep",
        /// Geodetic datum (usually WGS84)
        pub datum: Option<String> => "datum",
        /// Age of DGPS corrections in seconds
        pub dgps_age: Option<f64> => "dgpsAge",
        /// DGPS station ID
        pub dgps_station: Option<i32> => "dgpsSta",
        pub velocity_north: Option<f64> => "velN",
        pub velocity_east: Option<f64> => "velE",
        pub velocity_down: Option<f64> => "velD",
        /// Antenna status (OK, OPEN, SHORT)
        pub antenna: Option<AntennaStatus> => "ant",
        /// Jamming indicator
        pub jamming: Option<i32> => "jam",
        /// Receiver temperature in degrees Celsius
        pub temperature: Option<f64> => "temp",
        /// Water depth in meters
        pub depth: Option<f64> => "depth",
        /// RTK baseline status
        pub base_status: Option<FixStatus> => "baseS",
        /// RTK baseline east component in meters
        pub base_east: Option<f64> => "baseE",
        /// RTK baseline north component in meters
        pub base_north: Option<f64> => "baseN",
        /// RTK baseline up component in meters
        pub base_up: Option<f64> => "baseU",
        /// RTK baseline length in meters
        pub base_length: Option<f64> => "baseL",
        /// RTK baseline course in degrees
        pub base_course: Option<f64> => "baseC",
        /// RTK AR ratio
        pub dgps_ratio: Option<f64> => "dgpsRatio",
        /// Relative position north in meters, NED frame
        pub relative_north: Option<f64> => "relN",
        pub relative_east: Option<f64> => "relE",
        pub relative_down: Option<f64> => "relD",
        pub relative_heading: Option<f64> => "relH",
        pub relative_length: Option<f64> => "relL",
        /// Wind angle, magnetic, in degrees
        pub wind_angle_magnetic: Option<f64> => "wanglem",
        /// Wind angle, relative, in degrees
        pub wind_angle_relative: Option<f64> => "wangler",
        /// Wind angle, true, in degrees
        pub wind_angle_true: Option<f64> => "wanglet",
        /// Wind speed, relative, in meters/second
        pub wind_speed_relative: Option<f64> => "wspeedr",
        /// Wind speed, true, in meters/second
        pub wind_speed_true: Option<f64> => "wspeedt",
        /// Water temperature in degrees Celsius
        pub water_temperature: Option<f64> => "wtemp",
        /// Characters received for this cycle
        pub chars: Option<u32> => "chars",
        /// Number of satellites used in solution
        pub sats: Option<i32> => "sats",
        /// GPS week number
        pub week: Option<u16> => "week",
        /// GPS time of week in seconds
        pub tow: Option<f64> => "tow",
        /// GPS week rollover count
        pub rollovers: Option<i32> => "rollovers",
    }
}

impl Report for Tpv {
    const CLASS: &'static str = "TPV";
}

impl Tpv {
    /// Latitude and longitude, when both are reported
    pub fn position(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

schema! {
    /// Satellite Sky View (SKY) report
    ///
    /// The SKY message reports the satellites visible to the GPS receiver,
    /// including signal strength, elevation, azimuth, and usage status.
    pub struct Sky {
        /// Device path that provided this data
        pub device: Option<String> => "device",
        /// GPS time of this sky view
        pub time: Option<DateTime<Utc>> => "time",
        pub x_dop: Option<f64> => "xdop",
        pub y_dop: Option<f64> => "ydop",
        pub v_dop: Option<f64> => "vdop",
        pub t_dop: Option<f64> => "tdop",
        pub h_dop: Option<f64> => "hdop",
        pub g_dop: Option<f64> => "gdop",
        pub p_dop: Option<f64> => "pdop",
        /// Number of satellites visible
        pub n_sat: Option<i32> => "nSat",
        /// Number of satellites used in navigation solution
        pub u_sat: Option<i32> => "uSat",
        /// Visible satellites, in daemon order
        pub satellites: Option<Vec<Satellite>> => "satellites",
    }
}

impl Report for Sky {
    const CLASS: &'static str = "SKY";
}

impl Sky {
    /// Satellites flagged as used in the current solution
    pub fn used_satellites(&self) -> impl Iterator<Item = &Satellite> {
        self.satellites.iter().flatten().filter(|sat| sat.used)
    }
}

schema! {
    /// GPS Pseudorange Error Statistics (GST)
    ///
    /// Reference: [json_noise_read](https://gitlab.com/gpsd/gpsd/-/blob/master/libgps/libgps_json.c?ref_type=heads#L175)
    pub struct Gst {
        /// Device path that provided this data
        pub device: Option<String> => "device",
        /// GPS time of these statistics
        pub time: Option<DateTime<Utc>> => "time",
        /// RMS value of standard deviation ranges
        pub rms: Option<f64> => "rms",
        /// Semi-major axis of error ellipse in meters
        pub major: Option<f64> => "major",
        /// Semi-minor axis of error ellipse in meters
        pub minor: Option<f64> => "minor",
        /// Orientation of error ellipse in degrees from true north
        pub orient: Option<f64> => "orient",
        /// Latitude error in meters (1-sigma)
        pub latitude_error: Option<f64> => "lat",
        /// Longitude error in meters (1-sigma)
        pub longitude_error: Option<f64> => "lon",
        /// Altitude error in meters (1-sigma)
        pub altitude_error: Option<f64> => "alt",
        /// East velocity error in meters/second (1-sigma)
        pub velocity_east_error: Option<f64> => "ve",
        /// North velocity error in meters/second (1-sigma)
        pub velocity_north_error: Option<f64> => "vn",
        /// Up velocity error in meters/second (1-sigma)
        pub velocity_up_error: Option<f64> => "vu",
    }
}

impl Report for Gst {
    const CLASS: &'static str = "GST";
}

schema! {
    /// Attitude/orientation data (ATT)
    ///
    /// Angles are in degrees.
    pub struct Attitude {
        pub device: Option<String> => "device",
        pub time: Option<DateTime<Utc>> => "time",
        /// Heading, degrees from true north
        pub heading: Option<f64> => "heading",
        /// Heading, degrees magnetic
        pub magnetic_heading: Option<f64> => "mheading",
        pub pitch: Option<f64> => "pitch",
        pub roll: Option<f64> => "roll",
        pub yaw: Option<f64> => "yaw",
        /// Magnetic dip
        pub dip: Option<f64> => "dip",
        pub temperature: Option<f64> => "temp",
    }
}

impl Report for Attitude {
    const CLASS: &'static str = "ATT";
}

schema! {
    /// Time Offset report (TOFF)
    ///
    /// Reports the offset between system clock and GPS time, as split
    /// seconds/nanoseconds pairs.
    ///
    /// Reference: [json_toff_read](https://gitlab.com/gpsd/gpsd/-/blob/master/libgps/libgps_json.c?ref_type=heads#L667)
    pub struct TimeOffset {
        pub device: Option<String> => "device",
        pub real_sec: Option<i64> => "real_sec",
        pub real_nsec: Option<i64> => "real_nsec",
        pub clock_sec: Option<i64> => "clock_sec",
        pub clock_nsec: Option<i64> => "clock_nsec",
        pub precision: Option<i32> => "precision",
    }
}

impl Report for TimeOffset {
    const CLASS: &'static str = "TOFF";
}

impl TimeOffset {
    /// GPS time
    pub fn real(&self) -> Option<DateTime<Utc>> {
        to_datetime(self.real_sec, self.real_nsec)
    }

    /// System clock time
    pub fn clock(&self) -> Option<DateTime<Utc>> {
        to_datetime(self.clock_sec, self.clock_nsec)
    }
}

schema! {
    /// Pulse-Per-Second (PPS) timing report
    pub struct Pps {
        pub device: Option<String> => "device",
        pub real_sec: Option<i64> => "real_sec",
        pub real_nsec: Option<i64> => "real_nsec",
        pub clock_sec: Option<i64> => "clock_sec",
        pub clock_nsec: Option<i64> => "clock_nsec",
        /// Clock precision, as a power of two in seconds
        pub precision: Option<i32> => "precision",
        /// Quantization error of PPS signal in picoseconds
        pub quantization_error: Option<i32> => "qErr",
    }
}

impl Report for Pps {
    const CLASS: &'static str = "PPS";
}

impl Pps {
    /// GPS time of PPS edge
    pub fn real(&self) -> Option<DateTime<Utc>> {
        to_datetime(self.real_sec, self.real_nsec)
    }

    /// System clock time of PPS edge
    pub fn clock(&self) -> Option<DateTime<Utc>> {
        to_datetime(self.clock_sec, self.clock_nsec)
    }
}

schema! {
    /// Oscillator/clock discipline status (OSC)
    pub struct Oscillator {
        /// Device path of the oscillator
        pub device: String => "device",
        /// Whether the oscillator is running
        pub running: bool => "running",
        /// Whether this is the reference clock
        pub reference: bool => "reference",
        /// Whether the clock is disciplined (synchronized)
        pub disciplined: bool => "disciplined",
        /// Time offset in nanoseconds
        pub delta: Option<i64> => "delta",
    }
}

impl Report for Oscillator {
    const CLASS: &'static str = "OSC";
}

schema! {
    /// GPSD daemon version information
    pub struct Version {
        /// GPSD release version string
        pub release: String => "release",
        /// Git revision hash
        pub rev: String => "rev",
        pub proto_major: i32 => "proto_major",
        pub proto_minor: i32 => "proto_minor",
        /// Remote server URL (if applicable)
        pub remote: Option<String> => "remote",
    }
}

impl Report for Version {
    const CLASS: &'static str = "VERSION";
}

impl Version {
    /// Checks the daemon speaks a protocol this crate decodes
    ///
    /// The major version must match exactly; any minor version from
    /// [`super::API_VERSION_MINOR`] on is accepted.
    pub fn ensure_supported(&self) -> Result<()> {
        if self.proto_major != super::API_VERSION_MAJOR
            || self.proto_minor < super::API_VERSION_MINOR
        {
            return Err(GpsdJsonError::UnsupportedProtocolVersion((
                self.proto_major,
                self.proto_minor,
            )));
        }
        Ok(())
    }
}

schema! {
    /// List of GPS devices known to GPSD
    pub struct DeviceList {
        pub devices: Vec<Device> => "devices",
        pub remote: Option<String> => "remote",
    }
}

impl Report for DeviceList {
    const CLASS: &'static str = "DEVICES";
}

impl Report for Device {
    const CLASS: &'static str = "DEVICE";
}

impl Report for Watch {
    const CLASS: &'static str = "WATCH";
}

schema! {
    /// Poll response with current GPS state
    ///
    /// Carries a snapshot of the latest reports from all active devices.
    pub struct Poll {
        /// Timestamp of this poll
        pub time: Option<DateTime<Utc>> => "time",
        /// Number of active devices
        pub active: Option<i32> => "active",
        pub tpv: Vec<Tpv> => "tpv",
        pub gst: Vec<Gst> => "gst",
        pub sky: Vec<Sky> => "sky",
    }
}

impl Report for Poll {
    const CLASS: &'static str = "POLL";
}

schema! {
    /// Error notification from GPSD
    pub struct Error {
        /// Error message text
        pub message: String => "message",
    }
}

impl Report for Error {
    const CLASS: &'static str = "ERROR";
}

schema! {
    /// Raw receiver measurements (RAW)
    ///
    /// Reference: [json_raw_read](https://gitlab.com/gpsd/gpsd/-/blob/master/libgps/libgps_json.c#L219)
    pub struct Raw {
        pub device: Option<String> => "device",
        /// Whole seconds of the measurement epoch
        pub time_sec: Option<i64> => "time",
        /// Nanoseconds past [`Raw::time_sec`]
        pub time_nsec: Option<i64> => "nsec",
        /// One entry per tracked signal
        pub rawdata: Vec<Measurement> => "rawdata",
    }
}

impl Report for Raw {
    const CLASS: &'static str = "RAW";
}

impl Raw {
    /// Measurement epoch; a missing `nsec` counts as zero
    pub fn time(&self) -> Option<DateTime<Utc>> {
        to_datetime(self.time_sec, Some(self.time_nsec.unwrap_or(0)))
    }
}

/// Combines Unix timestamp seconds and nanoseconds into a DateTime<Utc>
fn to_datetime(sec: Option<i64>, nsec: Option<i64>) -> Option<DateTime<Utc>> {
    let nsec = u32::try_from(nsec?).ok()?;
    DateTime::<Utc>::from_timestamp(sec?, nsec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeErrorKind;
    use crate::protocol::schema::{Presence, Schema};
    use serde_json::{Value, json};

    fn decode<S: Schema>(value: Value) -> core::result::Result<S, DecodeErrorKind> {
        S::decode_fields(value.as_object().unwrap())
    }

    #[test]
    fn test_tpv_rename_table() {
        let spec = Tpv::field("time_error").unwrap();
        assert_eq!(spec.wire, "ept");
        assert_eq!(Tpv::field("mode").unwrap().presence, Presence::Required);
        assert_eq!(Tpv::field("ecef_z").unwrap().wire, "ecefz");

        let mut wires: Vec<_> = Tpv::FIELDS.iter().map(|f| f.wire).collect();
        let count = wires.len();
        wires.sort_unstable();
        wires.dedup();
        assert_eq!(wires.len(), count, "wire keys must be unique");
    }

    #[test]
    fn test_tpv_full_fix() {
        let tpv: Tpv = decode(json!({
            "class": "TPV", "device": "/dev/ttyACM0", "mode": 3, "status": 2,
            "time": "2024-01-01T10:00:00.000Z", "leapseconds": 18, "ept": 0.005,
            "lat": 42.5, "lon": 23.3, "altHAE": 585.1, "altMSL": 550.2,
            "epx": 2.1, "epy": 2.4, "epv": 4.8, "track": 0.0, "speed": 0.0,
            "ecefx": 4234567.1, "ecefvAcc": 0.3, "ant": 1
        }))
        .unwrap();

        assert_eq!(tpv.mode, FixMode::Fix3D);
        assert_eq!(tpv.status, Some(FixStatus::DGps));
        assert_eq!(tpv.position(), Some((42.5, 23.3)));
        assert_eq!(tpv.leap_seconds, Some(18));
        assert_eq!(tpv.time_error, Some(0.005));
        assert_eq!(tpv.altitude_msl, Some(550.2));
        assert_eq!(tpv.altitude, None);
        assert_eq!(tpv.course, Some(0.0));
        assert_eq!(tpv.speed, Some(0.0));
        assert_eq!(tpv.ecef_x, Some(4234567.1));
        assert_eq!(tpv.ecef_velocity_error, Some(0.3));
        assert_eq!(tpv.antenna, Some(AntennaStatus::Ok));
        assert_eq!(tpv.climb_rate, None);
    }

    #[test]
    fn test_tpv_requires_mode() {
        let err = decode::<Tpv>(json!({"lat": 1.0})).unwrap_err();
        assert!(matches!(
            err,
            DecodeErrorKind::MalformedRecord { field: Some("mode"), .. }
        ));
    }

    #[test]
    fn test_sky_satellite_order_and_usage() {
        let sky: Sky = decode(json!({
            "hdop": 0.9, "nSat": 3, "uSat": 2,
            "satellites": [
                {"PRN": 5, "el": 45.0, "az": 120.0, "ss": 40.0, "used": true},
                {"PRN": 66, "el": 10.0, "az": 300.0, "ss": 18.0, "used": false},
                {"PRN": 131, "used": true, "health": 2}
            ]
        }))
        .unwrap();

        let prns: Vec<_> = sky.satellites.iter().flatten().map(|s| s.prn).collect();
        assert_eq!(prns, [5, 66, 131]);
        let used: Vec<_> = sky.used_satellites().map(|s| s.prn).collect();
        assert_eq!(used, [5, 131]);
        assert_eq!(sky.h_dop, Some(0.9));
        assert_eq!(sky.p_dop, None);
    }

    #[test]
    fn test_sky_without_satellites() {
        let sky: Sky = decode(json!({"gdop": 1.2})).unwrap();
        assert_eq!(sky.satellites, None);
        assert_eq!(sky.used_satellites().count(), 0);

        let sky: Sky = decode(json!({"satellites": []})).unwrap();
        assert_eq!(sky.satellites, Some(Vec::new()));
    }

    #[test]
    fn test_tpv_rtk_and_marine_fields() {
        let tpv: Tpv = decode(json!({
            "mode": 3, "baseS": 3, "baseE": 1.5, "baseN": -2.0, "baseL": 2.5,
            "dgpsRatio": 9.9, "relN": 0.5, "relD": -0.1, "depth": 12.0,
            "wanglet": 45.0, "wtemp": 14.5, "week": 2295, "tow": 36000.5,
            "rollovers": 2, "sats": 11
        }))
        .unwrap();

        assert_eq!(tpv.base_status, Some(FixStatus::RTKFixed));
        assert_eq!(tpv.base_east, Some(1.5));
        assert_eq!(tpv.base_north, Some(-2.0));
        assert_eq!(tpv.base_up, None);
        assert_eq!(tpv.relative_north, Some(0.5));
        assert_eq!(tpv.relative_down, Some(-0.1));
        assert_eq!(tpv.depth, Some(12.0));
        assert_eq!(tpv.wind_angle_true, Some(45.0));
        assert_eq!(tpv.water_temperature, Some(14.5));
        assert_eq!(tpv.week, Some(2295));
        assert_eq!(tpv.tow, Some(36000.5));
        assert_eq!(tpv.sats, Some(11));

        let err = decode::<Tpv>(json!({"mode": 3, "baseS": 12})).unwrap_err();
        assert!(matches!(err, DecodeErrorKind::InvalidEnumValue { field: "baseS", .. }));
    }

    #[test]
    fn test_raw_measurements() {
        let raw: Raw = decode(json!({
            "device": "/dev/ttyACM0", "time": 1704103200, "nsec": 250000000,
            "rawdata": [
                {"gnssid": 0, "svid": 7, "snr": 42, "obs": "C1C", "lli": 0,
                 "locktime": 64500, "carrierphase": 120345678.25,
                 "pseudorange": 22901234.5, "doppler": -1234.5},
                {"gnssid": 2, "svid": 11, "obs": "C1C"}
            ]
        }))
        .unwrap();

        let time = raw.time().unwrap();
        assert_eq!(time.timestamp(), 1_704_103_200);
        assert_eq!(time.timestamp_subsec_millis(), 250);
        assert_eq!(raw.rawdata.len(), 2);
        assert_eq!(raw.rawdata[0].snr, Some(42));
        assert_eq!(raw.rawdata[0].constellation(), Some(GnssId::Gps));
        assert_eq!(raw.rawdata[1].constellation(), Some(GnssId::Gal));
        assert_eq!(raw.rawdata[1].pseudorange, None);

        let no_nsec: Raw = decode(json!({"time": 1704103200, "rawdata": []})).unwrap();
        assert_eq!(no_nsec.time().unwrap().timestamp_subsec_nanos(), 0);

        let err = decode::<Raw>(json!({"time": 1704103200})).unwrap_err();
        assert!(matches!(
            err,
            DecodeErrorKind::MalformedRecord { field: Some("rawdata"), .. }
        ));
    }

    #[test]
    fn test_time_offset_split_time() {
        let toff: TimeOffset = decode(json!({
            "device": "/dev/ttyAMA0",
            "real_sec": 1704103200, "real_nsec": 500000000,
            "clock_sec": 1704103200, "clock_nsec": 500123000
        }))
        .unwrap();
        let real = toff.real().unwrap();
        assert_eq!(real.timestamp(), 1_704_103_200);
        assert_eq!(real.timestamp_subsec_millis(), 500);
        assert!(toff.clock().unwrap() > real);

        let pps: Pps = decode(json!({"real_sec": 1704103200, "qErr": -12})).unwrap();
        assert_eq!(pps.real(), None);
        assert_eq!(pps.quantization_error, Some(-12));
    }

    #[test]
    fn test_version_support() {
        let version: Version = decode(json!({
            "release": "3.25", "rev": "3.25", "proto_major": 3, "proto_minor": 15
        }))
        .unwrap();
        assert!(version.ensure_supported().is_ok());

        let old = Version {
            proto_minor: 11,
            ..version.clone()
        };
        assert!(matches!(
            old.ensure_supported(),
            Err(GpsdJsonError::UnsupportedProtocolVersion((3, 11)))
        ));

        let err = decode::<Version>(json!({"release": "3.25", "proto_major": 3})).unwrap_err();
        assert_eq!(err.field(), Some("rev"));
    }

    #[test]
    fn test_poll_nested_reports() {
        let poll: Poll = decode(json!({
            "time": "2024-01-01T10:00:01.000Z", "active": 1,
            "tpv": [{"class": "TPV", "mode": 2, "lat": 1.0, "lon": 2.0}],
            "gst": [],
            "sky": [{"class": "SKY", "satellites": [{"PRN": 1}]}]
        }))
        .unwrap();
        assert_eq!(poll.tpv.len(), 1);
        assert_eq!(poll.tpv[0].mode, FixMode::Fix2D);
        assert!(poll.gst.is_empty());
        assert_eq!(poll.sky[0].satellites.as_ref().map(Vec::len), Some(1));

        let err = decode::<Poll>(json!({
            "tpv": [{"mode": 3}, {"mode": "3"}], "gst": [], "sky": []
        }))
        .unwrap_err();
        let DecodeErrorKind::InvalidElement { field, index, .. } = &err else {
            panic!("expected nested failure");
        };
        assert_eq!((*field, *index), ("tpv", 1));
        assert_eq!(err.root().field(), Some("mode"));
    }

    #[test]
    fn test_oscillator_required_flags() {
        let osc: Oscillator = decode(json!({
            "device": "/dev/osc0", "running": true, "reference": false, "disciplined": true
        }))
        .unwrap();
        assert!(osc.running && osc.disciplined && !osc.reference);
        assert_eq!(osc.delta, None);

        let err = decode::<Oscillator>(json!({"device": "/dev/osc0", "running": true}))
            .unwrap_err();
        assert_eq!(err.field(), Some("reference"));
    }
}
