use serde::{Deserialize, Serialize};
use crate::region::NamedPoint;

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Filter {
    pub property: String,
    pub value: serde_json::Value,
}

/// Area reduction request as understood by the platform gateway
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ReduceRequest {
    pub dataset: String,
    pub band: String,
    pub filters: Vec<Filter>,
    pub region: Vec<[f64; 2]>,
    pub scale: f64,
    pub reducers: Vec<String>,
}

#[derive(Deserialize)]
pub struct ReduceResponse {
    pub value: Option<f64>,
}

/// Answer to a min/max/mean/count reduction
#[derive(Deserialize)]
pub struct StatsResponse {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    #[serde(default)]
    pub count: u64,
}

/// Reduction of one image at a list of points, one value per point
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct PointsRequest {
    pub dataset: String,
    pub band: String,
    pub filters: Vec<Filter>,
    pub points: Vec<NamedPoint>,
    pub scale: f64,
    pub reducers: Vec<String>,
}

#[derive(Deserialize)]
pub struct PointsResponse {
    pub values: Vec<Option<f64>>,
}

/// Request for the forecast hours available for one creation time
#[derive(Serialize)]
pub struct HoursRequest {
    pub dataset: String,
    pub creation_time: String,
}

#[derive(Deserialize)]
pub struct HoursResponse {
    #[serde(default)]
    pub hours: Vec<u32>,
}
