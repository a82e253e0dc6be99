use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::deviation::Severity;
use crate::types::PositionFix;

/// GNSS fix younger than this is "good"
pub const GNSS_GOOD_AGE_SECS: f64 = 2.0;
/// GNSS fix younger than this still counts as a usable GPS solution
pub const GNSS_OK_AGE_SECS: f64 = 10.0;
/// IMU considered alive while the last frame is younger than this
pub const IMU_FRESH_AGE_SECS: f64 = 5.0;
/// How long the "new target" popup stays up after SET
pub const TARGET_POPUP_SECS: f64 = 3.0;

// WGS84
const WGS84_A: f64 = 6_378_137.0;
const WGS84_F: f64 = 1.0 / 298.257_223_563;
const UTM_K0: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hemisphere {
    North,
    South,
}

/// Universal Transverse Mercator grid position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UtmCoordinate {
    pub easting: f64,
    pub northing: f64,
    pub zone: u8,
    pub band: char,
    pub hemisphere: Hemisphere,
}

impl UtmCoordinate {
    /// Project WGS84 lat/lon (degrees) onto UTM.
    ///
    /// Snyder's series for the transverse Mercator, with the Norway (32V)
    /// and Svalbard zone exceptions. Returns `None` outside the UTM
    /// latitude band range [-80, 84] or for non-finite input.
    pub fn from_latlon(lat: f64, lon: f64) -> Option<Self> {
        if !lat.is_finite() || !lon.is_finite() || !(-80.0..=84.0).contains(&lat) {
            return None;
        }

        // Wrap lon to [-180, 180)
        let lon = ((lon + 180.0) % 360.0 + 360.0) % 360.0 - 180.0;
        let zone = utm_zone(lat, lon);
        let lon0 = (zone as f64 - 1.0) * 6.0 - 180.0 + 3.0;

        let e2 = WGS84_F * (2.0 - WGS84_F);
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        let ep2 = e2 / (1.0 - e2);

        let phi = lat.to_radians();
        let (sin_phi, cos_phi) = phi.sin_cos();
        let tan_phi = phi.tan();

        let n = WGS84_A / (1.0 - e2 * sin_phi * sin_phi).sqrt();
        let t = tan_phi * tan_phi;
        let c = ep2 * cos_phi * cos_phi;
        let a = cos_phi * (lon - lon0).to_radians();

        // Meridional arc
        let m = WGS84_A
            * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
                - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
                + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
                - (35.0 * e6 / 3072.0) * (6.0 * phi).sin());

        let a2 = a * a;
        let a3 = a2 * a;
        let a4 = a3 * a;
        let a5 = a4 * a;
        let a6 = a5 * a;

        let easting = UTM_K0
            * n
            * (a + (1.0 - t + c) * a3 / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a5 / 120.0)
            + FALSE_EASTING;

        let mut northing = UTM_K0
            * (m + n
                * tan_phi
                * (a2 / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a6 / 720.0));

        let hemisphere = if lat < 0.0 {
            northing += FALSE_NORTHING_SOUTH;
            Hemisphere::South
        } else {
            Hemisphere::North
        };

        Some(UtmCoordinate {
            easting,
            northing,
            zone,
            band: latitude_band(lat),
            hemisphere,
        })
    }
}

fn utm_zone(lat: f64, lon: f64) -> u8 {
    let mut zone = ((lon + 180.0) / 6.0).floor() as i32 + 1;

    // Norway
    if (56.0..64.0).contains(&lat) && (3.0..12.0).contains(&lon) {
        zone = 32;
    }

    // Svalbard
    if (72.0..=84.0).contains(&lat) {
        zone = if (0.0..9.0).contains(&lon) {
            31
        } else if (9.0..21.0).contains(&lon) {
            33
        } else if (21.0..33.0).contains(&lon) {
            35
        } else if (33.0..42.0).contains(&lon) {
            37
        } else {
            zone
        };
    }

    zone.clamp(1, 60) as u8
}

fn latitude_band(lat: f64) -> char {
    const BANDS: &[u8] = b"CDEFGHJKLMNPQRSTUVWX";
    let idx = (((lat + 80.0) / 8.0).floor() as i64).clamp(0, BANDS.len() as i64 - 1);
    BANDS[idx as usize] as char
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FixType {
    #[serde(rename = "INS+GPS")]
    InsGps,
    #[serde(rename = "INS")]
    Ins,
    #[serde(rename = "GPS")]
    Gps,
    #[serde(rename = "NONE")]
    None,
}

/// Inputs for the Present Position screen, all read from the monitor
#[derive(Debug, Clone, Copy)]
pub struct PositionInputs {
    pub fix: PositionFix,
    pub last_gnss_at: Option<DateTime<Local>>,
    pub last_imu_at: Option<DateTime<Local>>,
    pub target_set_at: Option<DateTime<Local>>,
}

/// Fused present-position readout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentPosition {
    pub utm: Option<UtmCoordinate>,
    pub height: Option<f64>,
    pub fix_type: FixType,
    pub gps_ok: bool,
    pub quality: Severity,
    pub last_update: Option<String>,
    pub degraded: bool,
    pub new_target: bool,
}

impl PresentPosition {
    pub fn evaluate(inputs: &PositionInputs, now: DateTime<Local>) -> Self {
        let gnss_age = age_secs(inputs.last_gnss_at, now);
        let imu_age = age_secs(inputs.last_imu_at, now);

        let quality = match gnss_age {
            Some(age) if age < GNSS_GOOD_AGE_SECS => Severity::Good,
            Some(age) if age < GNSS_OK_AGE_SECS => Severity::Warning,
            _ => Severity::Bad,
        };
        let gps_ok = matches!(gnss_age, Some(age) if age < GNSS_OK_AGE_SECS);
        let imu_fresh = matches!(imu_age, Some(age) if age < IMU_FRESH_AGE_SECS);

        let fix_type = match (imu_fresh, gps_ok) {
            (true, true) => FixType::InsGps,
            (true, false) => FixType::Ins,
            (false, true) => FixType::Gps,
            (false, false) => FixType::None,
        };

        let utm = match (inputs.fix.latitude, inputs.fix.longitude) {
            (Some(lat), Some(lon)) => UtmCoordinate::from_latlon(lat, lon),
            _ => None,
        };

        PresentPosition {
            utm,
            height: inputs.fix.altitude,
            fix_type,
            gps_ok,
            quality,
            last_update: inputs
                .last_gnss_at
                .map(|t| t.format("%H:%M:%S").to_string()),
            degraded: imu_fresh && !gps_ok,
            new_target: matches!(age_secs(inputs.target_set_at, now), Some(age) if age < TARGET_POPUP_SECS),
        }
    }
}

fn age_secs(at: Option<DateTime<Local>>, now: DateTime<Local>) -> Option<f64> {
    at.map(|t| (now.signed_duration_since(t).num_milliseconds() as f64 / 1000.0).max(0.0))
}
