use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Formatter;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Format of creation time strings as expected by the forecast archive
pub const CREATION_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// A named forecast lead time, i.e. the hours between a forecast's creation
/// and the validity time it predicts
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct LeadTime {
    pub name: String,
    pub hours: u32,
}

/// Key identifying one value in the forecast archive.
/// Used both for requesting values and for joining concurrently fetched results.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FetchKey {
    pub creation_time: DateTime<Utc>,
    pub forecast_hours: u32,
}

impl FetchKey {
    /// Returns the creation time formatted the way the archive expects it
    pub fn creation_string(&self) -> String {
        self.creation_time.format(CREATION_TIME_FORMAT).to_string()
    }
}

impl fmt::Display for FetchKey {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{} +{:>3}h", self.creation_string(), self.forecast_hours)
    }
}

/// One record per validity date holding the value fetched for each lead time.
/// A value is None when the archive had no matching forecast or the fetch failed.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ForecastSample {
    pub validity_time: DateTime<Utc>,
    pub values: BTreeMap<String, Option<f64>>,
}

impl ForecastSample {
    /// Returns the value recorded for the given lead time name, if any
    ///
    /// # Arguments
    ///
    /// * 'lead' - name of the lead time
    pub fn value(&self, lead: &str) -> Option<f64> {
        self.values.get(lead).copied().flatten()
    }
}

/// Difference between two lead time values of the same validity time
#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
pub struct DifferenceRecord {
    pub validity_time: DateTime<Utc>,
    pub difference: f64,
}

/// Aggregate statistics over a set of differences.
/// Mean and standard deviation are None when there is nothing to aggregate.
#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
pub struct StatsSummary {
    pub count: usize,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
}

impl fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match (self.mean, self.std_dev) {
            (Some(mean), Some(std_dev)) =>
                write!(f, "n = {}, mean = {:.3}, std dev = {:.3}", self.count, mean, std_dev),
            _ => write!(f, "n = {}, mean = n/a, std dev = n/a", self.count),
        }
    }
}

/// Outcome counts for all fetches of a run
#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FetchCounts {
    pub fetched: usize,
    pub absent: usize,
    pub failed: usize,
}

/// Min, max, mean and pixel count of one image over the region
#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
pub struct RegionStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub count: u64,
}

impl fmt::Display for RegionStats {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "min = {:.3}, max = {:.3}, mean = {:.3}, pixels = {}", self.min, self.max, self.mean, self.count)
    }
}

/// Value of one image at a named point, None when the point has no data
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct PointValue {
    pub name: String,
    pub value: Option<f64>,
}

impl fmt::Display for PointValue {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self.value {
            Some(v) => write!(f, "{}: {:.0}°", self.name, v),
            None => write!(f, "{}: N/A", self.name),
        }
    }
}
