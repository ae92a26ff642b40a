use std::fmt;
use std::fmt::Formatter;
use chrono::NaiveDate;
use thiserror::Error;
use crate::manager_archive::errors::FetchError;

/// Error depicting a validity date range where the end precedes the start
#[derive(Error, Debug, PartialEq, Eq)]
#[error("InvalidRangeError: end date {end} precedes start date {start}")]
pub struct InvalidRangeError {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Error depicting a missing or malformed configuration value
#[derive(Error, Debug)]
#[error("MissingConfigError: {0}")]
pub struct ConfigError(pub String);
impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self { ConfigError(e.to_string()) }
}
impl From<&str> for ConfigError {
    fn from(e: &str) -> Self { ConfigError(e.to_string()) }
}

/// Error depicting errors that occur while writing or pruning reports
#[derive(Error, Debug)]
#[error("ReportError: {0}")]
pub struct ReportError(pub String);
impl From<std::io::Error> for ReportError {
    fn from(e: std::io::Error) -> Self { ReportError(e.to_string()) }
}
impl From<serde_json::Error> for ReportError {
    fn from(e: serde_json::Error) -> Self { ReportError(e.to_string()) }
}
impl From<glob::PatternError> for ReportError {
    fn from(e: glob::PatternError) -> Self { ReportError(e.to_string()) }
}

/// Error depicting failures while setting up logging
#[derive(Error, Debug)]
#[error("LoggingError: {0}")]
pub struct LoggingError(pub String);
impl From<std::io::Error> for LoggingError {
    fn from(e: std::io::Error) -> Self { LoggingError(e.to_string()) }
}
impl From<log4rs::config::runtime::ConfigErrors> for LoggingError {
    fn from(e: log4rs::config::runtime::ConfigErrors) -> Self { LoggingError(e.to_string()) }
}
impl From<log::SetLoggerError> for LoggingError {
    fn from(e: log::SetLoggerError) -> Self { LoggingError(e.to_string()) }
}

/// Fatal errors that abort a pipeline run before or while it executes
pub enum RunError {
    Range(InvalidRangeError),
    Config(ConfigError),
    Fetch(FetchError),
    WorkerPool(String),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Range(e) => write!(f, "RunError::Range: {}", e),
            RunError::Config(e) => write!(f, "RunError::Config: {}", e),
            RunError::Fetch(e) => write!(f, "RunError::Fetch: {}", e),
            RunError::WorkerPool(e) => write!(f, "RunError::WorkerPool: {}", e),
        }
    }
}
impl fmt::Debug for RunError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
impl std::error::Error for RunError {}

impl From<InvalidRangeError> for RunError {
    fn from(e: InvalidRangeError) -> Self { RunError::Range(e) }
}
impl From<ConfigError> for RunError {
    fn from(e: ConfigError) -> Self { RunError::Config(e) }
}
impl From<FetchError> for RunError {
    fn from(e: FetchError) -> Self { RunError::Fetch(e) }
}
impl From<rayon::ThreadPoolBuildError> for RunError {
    fn from(e: rayon::ThreadPoolBuildError) -> Self { RunError::WorkerPool(e.to_string()) }
}
