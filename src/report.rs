use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::MResult;
use crate::types::{format_optional, AttitudeSample, PositionFix, Target};

pub const REPORT_HEADER: &str = "==== Artillery Pointing Log ====";
const REPORT_FOOTER: &str = "-----------------------------------------";

/// A rendered report ready to hand to the operator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedReport {
    pub filename: String,
    pub body: String,
}

impl ExportedReport {
    /// Render from a state snapshot. Reads only; nothing is mutated.
    pub fn build(
        attitude: &AttitudeSample,
        position: &PositionFix,
        target: &Target,
        now: DateTime<Local>,
    ) -> Self {
        let timestamp = now.format("%Y-%m-%d %H:%M:%S").to_string();
        ExportedReport {
            filename: report_filename(now.timestamp_millis()),
            body: render_report(attitude, position, target, &timestamp),
        }
    }

    /// Write into `dir`, creating it if needed
    pub fn save(&self, dir: &Path) -> MResult<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(&self.filename);
        fs::write(&path, &self.body)?;
        Ok(path)
    }
}

/// `PostureData_<unix-ms>.txt`
pub fn report_filename(unix_ms: i64) -> String {
    format!("PostureData_{}.txt", unix_ms)
}

pub fn render_report(
    attitude: &AttitudeSample,
    position: &PositionFix,
    target: &Target,
    timestamp: &str,
) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = writeln!(out, "{}", REPORT_HEADER);
    let _ = writeln!(out, "Timestamp : {}", timestamp);
    let _ = writeln!(out);
    let _ = writeln!(out, "IMU Data:");
    let _ = writeln!(out, "  Pitch (Y): {:.2}°", attitude.pitch);
    let _ = writeln!(out, "  Roll  (X): {:.2}°", attitude.roll);
    let _ = writeln!(out, "  Yaw   (Z): {:.2}°", attitude.yaw);
    let _ = writeln!(out);
    let _ = writeln!(out, "GNSS Data:");
    let _ = writeln!(out, "  Latitude : {}", format_optional(position.latitude, 6));
    let _ = writeln!(out, "  Longitude: {}", format_optional(position.longitude, 6));
    let _ = writeln!(out, "  Altitude : {} m", format_optional(position.altitude, 2));
    let _ = writeln!(out);
    let _ = writeln!(out, "Target Reference:");
    let _ = writeln!(out, "  Pitch Target: {:.2}°", target.pitch);
    let _ = writeln!(out, "  Roll Target : {:.2}°", target.roll);
    let _ = writeln!(out, "{}", REPORT_FOOTER);
    out
}
