pub mod errors;

use std::time::Duration;
use chrono::{DateTime, Utc};
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use ureq::Agent;
use crate::config;
use crate::manager_archive::errors::FetchError;
use crate::models::archive::{Filter, HoursRequest, HoursResponse, PointsRequest, PointsResponse, ReduceRequest, ReduceResponse, StatsResponse};
use crate::models::forecast::{FetchKey, RegionStats, CREATION_TIME_FORMAT};
use crate::region::{NamedPoint, Region};

/// Source of area mean forecast values.
///
/// Implementations must match creation time and forecast hours exactly, an archive
/// without a record for the key returns Ok(None) rather than a nearby run.
pub trait ValueSource: Sync {
    fn fetch(&self, key: &FetchKey) -> Result<Option<f64>, FetchError>;
}

/// Lists the forecast hours published for a forecast run
pub trait RunCatalog {
    fn forecast_hours(&self, creation_time: DateTime<Utc>) -> Result<Vec<u32>, FetchError>;
}

/// Values of one forecast image at named points, one per point in the given order
pub trait PointSource {
    fn point_values(&self, key: &FetchKey, points: &[NamedPoint], scale: f64) -> Result<Vec<Option<f64>>, FetchError>;
}

/// Min/max/mean/count of one forecast image over the region, None when no pixel has data
pub trait StatsSource {
    fn region_stats(&self, key: &FetchKey, scale: f64) -> Result<Option<RegionStats>, FetchError>;
}

/// Source of area mean built-up surface (m² per pixel) for a given epoch
pub trait SurfaceSource {
    fn mean_surface(&self, epoch: u32, region: &Region) -> Result<Option<f64>, FetchError>;
}

/// Thin blocking client for the geospatial platform gateway
#[derive(Clone)]
pub struct Gateway {
    agent: Agent,
    base_url: String,
}

impl Gateway {
    /// Returns a gateway client
    ///
    /// # Arguments
    ///
    /// * 'base_url' - base url of the platform gateway api
    /// * 'timeout_secs' - global timeout for each request
    pub fn new(base_url: &str, timeout_secs: u64) -> Gateway {
        let config = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(timeout_secs)))
            .build();

        let agent = config.into();

        Gateway { agent, base_url: base_url.trim_end_matches('/').to_string() }
    }

    /// Runs an area reduction on the platform and returns the reduced value, if any
    ///
    /// # Arguments
    ///
    /// * 'req' - the reduction request
    pub fn reduce(&self, req: &ReduceRequest) -> Result<Option<f64>, FetchError> {
        let res: ReduceResponse = self.post("reduce", req)?;
        Ok(res.value.filter(|v| v.is_finite()))
    }

    /// Runs a min/max/mean/count reduction and returns the statistics, if any pixel had data
    ///
    /// # Arguments
    ///
    /// * 'req' - the reduction request
    pub fn reduce_stats(&self, req: &ReduceRequest) -> Result<Option<RegionStats>, FetchError> {
        let res: StatsResponse = self.post("reduce_stats", req)?;
        if res.count == 0 {
            return Ok(None);
        }

        match (res.min, res.max, res.mean) {
            (Some(min), Some(max), Some(mean)) => Ok(Some(RegionStats { min, max, mean, count: res.count })),
            _ => Ok(None),
        }
    }

    /// Reduces an image at each requested point, answers must come in request order
    ///
    /// # Arguments
    ///
    /// * 'req' - the points request
    pub fn reduce_points(&self, req: &PointsRequest) -> Result<Vec<Option<f64>>, FetchError> {
        let res: PointsResponse = self.post("reduce_points", req)?;
        if res.values.len() != req.points.len() {
            return Err(FetchError::Document(format!("expected {} point values, got {}", req.points.len(), res.values.len())));
        }

        Ok(res.values.into_iter().map(|v| v.filter(|v| v.is_finite())).collect())
    }

    /// Returns forecast hours available for a run, sorted ascending
    ///
    /// # Arguments
    ///
    /// * 'req' - the hours request
    pub fn hours(&self, req: &HoursRequest) -> Result<Vec<u32>, FetchError> {
        let mut res: HoursResponse = self.post("hours", req)?;
        res.hours.sort();
        res.hours.dedup();
        Ok(res.hours)
    }

    fn post<T: Serialize, R: DeserializeOwned>(&self, endpoint: &str, req: &T) -> Result<R, FetchError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let body = serde_json::to_string(req)?;

        let json = self.agent
            .post(url)
            .content_type("application/json")
            .send(body)?
            .body_mut()
            .read_to_string()?;

        Ok(serde_json::from_str(&json)?)
    }
}

/// Forecast archive of one dataset band, reduced over a fixed region at a fixed scale
pub struct ForecastArchive {
    gateway: Gateway,
    dataset: String,
    band: String,
    region: Region,
    scale: f64,
}

impl ForecastArchive {
    /// Returns a ForecastArchive configured from the archive and region sections
    ///
    /// # Arguments
    ///
    /// * 'archive' - archive configuration
    /// * 'region' - region to reduce over
    pub fn new(archive: &config::Archive, region: &Region) -> ForecastArchive {
        ForecastArchive {
            gateway: Gateway::new(&archive.base_url, archive.timeout_secs),
            dataset: archive.dataset.clone(),
            band: archive.band.clone(),
            region: region.clone(),
            scale: archive.scale,
        }
    }

    /// Returns the band name values are reduced from
    pub fn band(&self) -> &str {
        &self.band
    }

    /// Exact match filters for a key, the archive stores creation time as epoch milliseconds
    fn key_filters(key: &FetchKey) -> Vec<Filter> {
        vec![
            Filter { property: "creation_time".to_string(), value: key.creation_time.timestamp_millis().into() },
            Filter { property: "forecast_hours".to_string(), value: key.forecast_hours.into() },
        ]
    }

    /// Returns the area mean request for the image matching the key
    ///
    /// # Arguments
    ///
    /// * 'key' - creation time and forecast hours of the image
    pub fn reduce_request(&self, key: &FetchKey) -> ReduceRequest {
        ReduceRequest {
            dataset: self.dataset.clone(),
            band: self.band.clone(),
            filters: ForecastArchive::key_filters(key),
            region: self.region.vertices().to_vec(),
            scale: self.scale,
            reducers: vec!["mean".to_string()],
        }
    }

    /// Returns the region statistics request for the image matching the key
    ///
    /// # Arguments
    ///
    /// * 'key' - creation time and forecast hours of the image
    /// * 'scale' - resolution in metres to reduce at
    pub fn stats_request(&self, key: &FetchKey, scale: f64) -> ReduceRequest {
        ReduceRequest {
            scale,
            reducers: ["min", "max", "mean", "count"].iter().map(|r| r.to_string()).collect(),
            ..self.reduce_request(key)
        }
    }

    /// Returns the point values request for the image matching the key
    ///
    /// # Arguments
    ///
    /// * 'key' - creation time and forecast hours of the image
    /// * 'points' - points to take values at
    /// * 'scale' - resolution in metres to reduce at
    pub fn points_request(&self, key: &FetchKey, points: &[NamedPoint], scale: f64) -> PointsRequest {
        PointsRequest {
            dataset: self.dataset.clone(),
            band: self.band.clone(),
            filters: ForecastArchive::key_filters(key),
            points: points.to_vec(),
            scale,
            reducers: vec!["first".to_string()],
        }
    }
}

impl ValueSource for ForecastArchive {
    fn fetch(&self, key: &FetchKey) -> Result<Option<f64>, FetchError> {
        debug!("fetching {}", key);
        self.gateway.reduce(&self.reduce_request(key))
    }
}

impl PointSource for ForecastArchive {
    fn point_values(&self, key: &FetchKey, points: &[NamedPoint], scale: f64) -> Result<Vec<Option<f64>>, FetchError> {
        if points.is_empty() {
            return Ok(Vec::new());
        }
        self.gateway.reduce_points(&self.points_request(key, points, scale))
    }
}

impl StatsSource for ForecastArchive {
    fn region_stats(&self, key: &FetchKey, scale: f64) -> Result<Option<RegionStats>, FetchError> {
        self.gateway.reduce_stats(&self.stats_request(key, scale))
    }
}

impl RunCatalog for ForecastArchive {
    fn forecast_hours(&self, creation_time: DateTime<Utc>) -> Result<Vec<u32>, FetchError> {
        let req = HoursRequest {
            dataset: self.dataset.clone(),
            creation_time: creation_time.format(CREATION_TIME_FORMAT).to_string(),
        };

        self.gateway.hours(&req)
    }
}

/// Archive of built-up surface images, one image per epoch
pub struct SurfaceArchive {
    gateway: Gateway,
    dataset_prefix: String,
    band: String,
    scale: f64,
}

impl SurfaceArchive {
    /// Returns a SurfaceArchive
    ///
    /// # Arguments
    ///
    /// * 'gateway' - gateway client to use
    /// * 'built_up' - built-up configuration
    pub fn new(gateway: Gateway, built_up: &config::BuiltUp) -> SurfaceArchive {
        SurfaceArchive {
            gateway,
            dataset_prefix: built_up.dataset_prefix.trim_end_matches('/').to_string(),
            band: built_up.band.clone(),
            scale: built_up.scale,
        }
    }
}

impl SurfaceSource for SurfaceArchive {
    fn mean_surface(&self, epoch: u32, region: &Region) -> Result<Option<f64>, FetchError> {
        let req = ReduceRequest {
            dataset: format!("{}/{}", self.dataset_prefix, epoch),
            band: self.band.clone(),
            filters: Vec::new(),
            region: region.vertices().to_vec(),
            scale: self.scale,
            reducers: vec!["mean".to_string()],
        };

        self.gateway.reduce(&req)
    }
}
