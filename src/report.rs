use std::fs;
use std::path::PathBuf;
use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use glob::glob;
use log::{info, warn};
use serde::Serialize;
use crate::errors::ReportError;

const STAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Saves a report as pretty printed json.
/// The file is named after the given time and kind, e.g. 20250529120000_compare.json
///
/// # Arguments
///
/// * 'report_dir' - the directory to save the file to, ending with a slash
/// * 'date_time' - the time the report is created
/// * 'kind' - kind of report
/// * 'report' - the report to save
pub fn save_report<T: Serialize>(report_dir: &str, date_time: DateTime<Utc>, kind: &str, report: &T) -> Result<PathBuf, ReportError> {
    fs::create_dir_all(report_dir)?;
    let file_path = PathBuf::from(format!("{}{}_{}.json", report_dir, date_time.format(STAMP_FORMAT), kind));

    let json = serde_json::to_string_pretty(report)?;
    fs::write(&file_path, json)?;
    info!("report saved to {}", file_path.display());

    Ok(file_path)
}

/// Removes report files older than the given number of hours
///
/// # Arguments
///
/// * 'report_dir' - the directory holding reports, ending with a slash
/// * 'now' - current time
/// * 'keep_hours' - max age of a report
pub fn prune_reports(report_dir: &str, now: DateTime<Utc>, keep_hours: i64) -> Result<usize, ReportError> {
    let Some(window) = TimeDelta::try_hours(keep_hours) else {
        warn!("keep_hours {} out of range, keeping all reports", keep_hours);
        return Ok(0);
    };
    let pattern = format!("{}*_*.json", report_dir);
    let mut removed = 0;

    for entry in glob(&pattern)? {
        if let Ok(path) = entry {
            if let Some(filename) = path.file_name().and_then(|f| f.to_str()) {
                let Some(stamp) = filename.get(0..14) else { continue };
                let Ok(created) = NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT) else { continue };
                if now.signed_duration_since(created.and_utc()) > window {
                    fs::remove_file(&path)?;
                    removed += 1;
                }
            }
        }
    }

    if removed > 0 {
        info!("pruned {} old reports", removed);
    }

    Ok(removed)
}
