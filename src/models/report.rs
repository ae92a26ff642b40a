use chrono::{DateTime, Utc};
use serde::Serialize;
use crate::built_up::BuiltUpComparison;
use crate::models::forecast::{FetchCounts, PointValue, RegionStats, StatsSummary};
use crate::series::Series;

#[derive(Serialize)]
pub struct ComparisonReport<'a> {
    pub created: DateTime<Utc>,
    pub minuend: &'a str,
    pub subtrahend: &'a str,
    pub stats: StatsSummary,
    pub counts: FetchCounts,
    pub samples: &'a Series,
    pub differences: &'a Series,
}

#[derive(Serialize)]
pub struct RunReport<'a> {
    pub created: DateTime<Utc>,
    pub creation_time: DateTime<Utc>,
    pub min_hour: Option<u32>,
    pub max_hour: Option<u32>,
    pub step: Option<u32>,
    pub hour: Option<u32>,
    pub value: Option<f64>,
    pub points: &'a [PointValue],
    pub diagnostic: Option<RegionStats>,
    pub series: &'a Series,
}

#[derive(Serialize)]
pub struct BuiltUpReport<'a> {
    pub created: DateTime<Utc>,
    pub lon: f64,
    pub lat: f64,
    pub size_km: f64,
    pub comparison: &'a BuiltUpComparison,
}
