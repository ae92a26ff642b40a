use std::collections::HashSet;
use std::fs;
use chrono::{NaiveDate, NaiveTime, Timelike};
use log::LevelFilter;
use serde::Deserialize;
use crate::errors::ConfigError;
use crate::models::forecast::LeadTime;
use crate::region::{NamedPoint, Region};
use crate::sampling::fetch_key;

/// Forecast runs issued per day, in hours UTC
const RUN_HOURS: [u32; 4] = [0, 6, 12, 18];

#[derive(Deserialize)]
pub struct General {
    pub log_path: String,
    pub log_level: LevelFilter,
    pub log_to_stdout: bool,
}

#[derive(Deserialize)]
pub struct Archive {
    pub base_url: String,
    pub dataset: String,
    pub band: String,
    pub scale: f64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_workers() -> usize {
    4
}

#[derive(Deserialize)]
pub struct Comparison {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub run_time: NaiveTime,
    pub lead_times: Vec<LeadTime>,
    pub minuend: String,
    pub subtrahend: String,
}

#[derive(Deserialize)]
pub struct BuiltUp {
    pub dataset_prefix: String,
    pub band: String,
    pub lon: f64,
    pub lat: f64,
    pub size_km: f64,
    pub scale: f64,
    pub from_epoch: u32,
    pub to_epoch: u32,
}

/// Point values and region statistics reported for a single forecast run
#[derive(Deserialize)]
pub struct RunDetail {
    #[serde(default = "default_detail_scale")]
    pub point_scale: f64,
    #[serde(default = "default_detail_scale")]
    pub stats_scale: f64,
    #[serde(default)]
    pub points: Vec<NamedPoint>,
}

fn default_detail_scale() -> f64 {
    10000.0
}

impl Default for RunDetail {
    fn default() -> Self {
        RunDetail { point_scale: default_detail_scale(), stats_scale: default_detail_scale(), points: Vec::new() }
    }
}

#[derive(Deserialize)]
pub struct Files {
    pub report_dir: String,
    pub keep_hours: i64,
}

#[derive(Deserialize)]
pub struct Config {
    pub general: General,
    pub archive: Archive,
    pub region: Region,
    pub comparison: Comparison,
    pub built_up: Option<BuiltUp>,
    #[serde(default)]
    pub run_detail: RunDetail,
    pub files: Files,
}

/// Loads the configuration file and returns a struct with all configuration items
///
/// # Arguments
///
/// * 'config_path' - path to the configuration file
pub fn load_config(config_path: &str) -> Result<Config, ConfigError> {
    let toml = fs::read_to_string(config_path)
        .map_err(|e| ConfigError(format!("{}: {}", config_path, e)))?;

    parse_config(&toml)
}

/// Parses and validates a configuration document
///
/// # Arguments
///
/// * 'toml' - the configuration as a toml string
pub fn parse_config(toml: &str) -> Result<Config, ConfigError> {
    let mut config: Config = toml::from_str(toml)?;

    if !config.files.report_dir.ends_with('/') {
        config.files.report_dir.push('/');
    }

    validate_archive(&config.archive)?;
    validate_comparison(&config.comparison)?;
    validate_run_detail(&config.run_detail)?;

    Ok(config)
}

fn validate_archive(archive: &Archive) -> Result<(), ConfigError> {
    if archive.base_url.is_empty() {
        return Err(ConfigError::from("archive.base_url is empty"));
    }
    if archive.scale <= 0.0 {
        return Err(ConfigError::from("archive.scale must be positive"));
    }
    if archive.max_workers == 0 {
        return Err(ConfigError::from("archive.max_workers must be at least 1"));
    }

    Ok(())
}

fn validate_run_detail(run_detail: &RunDetail) -> Result<(), ConfigError> {
    if run_detail.point_scale <= 0.0 || run_detail.stats_scale <= 0.0 {
        return Err(ConfigError::from("run_detail scales must be positive"));
    }
    for point in &run_detail.points {
        point.validate()?;
    }

    Ok(())
}

/// Checks that lead times are unique and that the difference pair refers to known lead times.
/// Also checks that every lead time gives a representable creation time and that the
/// run time is one of the four daily forecast runs.
///
/// # Arguments
///
/// * 'comparison' - the comparison section to validate
fn validate_comparison(comparison: &Comparison) -> Result<(), ConfigError> {
    if comparison.lead_times.is_empty() {
        return Err(ConfigError::from("comparison.lead_times is empty"));
    }

    let mut names = HashSet::new();
    for lead in &comparison.lead_times {
        if !names.insert(lead.name.as_str()) {
            return Err(ConfigError(format!("duplicate lead time name: {}", lead.name)));
        }
    }

    for name in [&comparison.minuend, &comparison.subtrahend] {
        if !names.contains(name.as_str()) {
            return Err(ConfigError(format!("unknown lead time in difference pair: {}", name)));
        }
    }

    for lead in &comparison.lead_times {
        if fetch_key(comparison.start_date, comparison.run_time, lead).is_none() {
            return Err(ConfigError(format!("lead time {} puts the creation time out of range", lead.name)));
        }
    }

    let run = comparison.run_time;
    if !RUN_HOURS.contains(&run.hour()) || run.minute() != 0 || run.second() != 0 {
        return Err(ConfigError(format!("run_time {} is not one of 00, 06, 12 or 18 UTC", run)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CONFIG: &str = r#"
[general]
log_path = "/tmp/leadcmp/"
log_level = "info"
log_to_stdout = true

[archive]
base_url = "http://localhost:8080/api"
dataset = "ECMWF/NRT_FORECAST/IFS/OPER"
band = "temperature_2m_sfc"
scale = 25000.0

[region]
vertices = [[5.87, 47.27], [15.04, 47.27], [15.04, 55.06], [5.87, 55.06]]

[comparison]
start_date = "2025-01-01"
end_date = "2025-01-03"
run_time = "12:00:00"
lead_times = [{ name = "24h", hours = 24 }, { name = "48h", hours = 48 }]
minuend = "24h"
subtrahend = "48h"

[files]
report_dir = "/tmp/leadcmp/reports"
keep_hours = 48
"#;

    #[test]
    fn parses_valid_config() {
        let config = parse_config(CONFIG).unwrap();

        assert_eq!(config.general.log_level, LevelFilter::Info);
        assert_eq!(config.archive.max_workers, 4);
        assert_eq!(config.archive.timeout_secs, 30);
        assert_eq!(config.comparison.start_date, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(config.comparison.run_time, NaiveTime::from_hms_opt(12, 0, 0).unwrap());
        assert_eq!(config.comparison.lead_times.len(), 2);
        assert_eq!(config.region.vertices().len(), 5);
        assert_eq!(config.files.report_dir, "/tmp/leadcmp/reports/");
        assert!(config.built_up.is_none());
        assert_eq!(config.run_detail.point_scale, 10000.0);
        assert!(config.run_detail.points.is_empty());
    }

    #[test]
    fn parses_run_detail_points() {
        let toml = format!("{}\n{}", CONFIG, r#"
[run_detail]
stats_scale = 5000.0
points = [{ name = "Berlin", lon = 13.405, lat = 52.52 }, { name = "Munich", lon = 11.582, lat = 48.1351 }]
"#);
        let config = parse_config(&toml).unwrap();

        assert_eq!(config.run_detail.point_scale, 10000.0);
        assert_eq!(config.run_detail.stats_scale, 5000.0);
        assert_eq!(config.run_detail.points[1].name, "Munich");

        let bad = toml.replace("lat = 52.52", "lat = 152.52");
        assert!(parse_config(&bad).is_err());
    }

    #[test]
    fn rejects_unknown_lead_in_pair() {
        let toml = CONFIG.replace("subtrahend = \"48h\"", "subtrahend = \"72h\"");
        let err = parse_config(&toml).err().unwrap();
        assert!(err.to_string().contains("72h"));
    }

    #[test]
    fn rejects_duplicate_lead_names() {
        let toml = CONFIG.replace("{ name = \"48h\", hours = 48 }", "{ name = \"24h\", hours = 48 }");
        assert!(parse_config(&toml).is_err());
    }

    #[test]
    fn rejects_off_cycle_run_time() {
        let toml = CONFIG.replace("run_time = \"12:00:00\"", "run_time = \"09:00:00\"");
        assert!(parse_config(&toml).is_err());
    }

    #[test]
    fn rejects_lead_before_calendar_start() {
        let toml = CONFIG
            .replace("start_date = \"2025-01-01\"", "start_date = \"0001-01-01\"")
            .replace("hours = 48 }", "hours = 4294967295 }");
        let err = parse_config(&toml).err().unwrap();
        assert!(err.to_string().contains("48h"));
    }

    #[test]
    fn rejects_missing_section() {
        let toml = CONFIG.replace("[files]", "[other]");
        let err = parse_config(&toml).err().unwrap();
        assert!(err.to_string().starts_with("MissingConfigError"));
    }

    #[test]
    fn loads_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CONFIG.as_bytes()).unwrap();

        let config = load_config(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.comparison.minuend, "24h");

        assert!(load_config("/nonexistent/leadcmp.toml").is_err());
    }
}
