use chrono::{DateTime, TimeDelta, Utc};
use log::{info, warn};
use crate::manager_archive::{PointSource, RunCatalog, StatsSource, ValueSource};
use crate::manager_archive::errors::FetchError;
use crate::models::forecast::{FetchKey, PointValue, RegionStats};
use crate::region::NamedPoint;
use crate::series::{Series, SeriesRow};

/// Range of forecast hours published for one forecast run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunOverview {
    pub min: u32,
    pub max: u32,
    pub step: u32,
}

impl RunOverview {
    /// Returns the hour range for the given forecast hours, or None if there are none.
    /// The step is the distance between the two first hours, or 1 if there is only one.
    ///
    /// # Arguments
    ///
    /// * 'hours' - forecast hours in any order
    pub fn from_hours(hours: &[u32]) -> Option<RunOverview> {
        let mut hours = hours.to_vec();
        hours.sort();
        hours.dedup();

        let min = *hours.first()?;
        let max = *hours.last()?;
        let step = match hours.get(1) {
            Some(second) if second - min > 0 => second - min,
            _ => 1,
        };

        Some(RunOverview { min, max, step })
    }

    /// Rounds a (chart) position to the nearest hour and clamps it into the range
    ///
    /// # Arguments
    ///
    /// * 'x' - requested hour
    pub fn clamp(&self, x: f64) -> u32 {
        if x.is_nan() {
            return self.min;
        }
        x.round().clamp(self.min as f64, self.max as f64) as u32
    }
}

/// Published hours of one run and the region mean per hour.
/// Rows of the series line up with the hours.
pub struct RunSeries {
    pub overview: Option<RunOverview>,
    pub hours: Vec<u32>,
    pub series: Series,
}

impl RunSeries {
    /// Returns the value at a published forecast hour, None if the hour is not published or has no data
    ///
    /// # Arguments
    ///
    /// * 'hour' - forecast hour
    pub fn value_at(&self, hour: u32) -> Option<f64> {
        let idx = self.hours.iter().position(|&h| h == hour)?;
        self.series.rows.get(idx)?.values.first().copied().flatten()
    }
}

/// Returns the region mean value per forecast hour of one run as a single column series.
/// Timestamps are the validity times, i.e. creation time plus forecast hours.
///
/// Hours whose validity time can't be represented are logged and left out.
///
/// # Arguments
///
/// * 'source' - archive to list hours from and fetch values from
/// * 'creation_time' - creation time of the forecast run
/// * 'column' - name of the value column
pub fn run_series<S: RunCatalog + ValueSource>(source: &S, creation_time: DateTime<Utc>, column: &str)
    -> Result<RunSeries, FetchError> {

    let mut published = source.forecast_hours(creation_time)?;
    published.sort();
    published.dedup();

    let mut hours = Vec::with_capacity(published.len());
    let mut rows = Vec::with_capacity(published.len());
    for h in published {
        let Some(timestamp) = TimeDelta::try_hours(h as i64)
            .and_then(|d| creation_time.checked_add_signed(d)) else {
            warn!("skipping forecast hour {} of run {}: validity time out of range", h, creation_time);
            continue;
        };

        let key = FetchKey { creation_time, forecast_hours: h };
        let value = source.fetch(&key).unwrap_or_else(|e| {
            warn!("treating {} as absent: {}", key, e);
            None
        });
        hours.push(h);
        rows.push(SeriesRow { timestamp, values: vec![value] });
    }

    info!("found {} forecast hours for run {}", hours.len(), creation_time);

    Ok(RunSeries {
        overview: RunOverview::from_hours(&hours),
        hours,
        series: Series::new(vec![column.to_string()], rows),
    })
}

/// Returns the published hour closest to a requested (chart) position.
/// The position is rounded and clamped into the run's range first, ties go to the earlier hour.
///
/// # Arguments
///
/// * 'hours' - published forecast hours
/// * 'x' - requested hour
pub fn snap_hour(hours: &[u32], x: f64) -> Option<u32> {
    let target = RunOverview::from_hours(hours)?.clamp(x);

    hours.iter()
        .copied()
        .min_by_key(|&h| (h.abs_diff(target), h))
}

/// Returns the value at each named point for one forecast image.
/// A failed request gives N/A for every point.
///
/// # Arguments
///
/// * 'source' - archive to take point values from
/// * 'key' - creation time and forecast hours of the image
/// * 'points' - the named points
/// * 'scale' - resolution in metres to reduce at
pub fn point_values<S: PointSource>(source: &S, key: &FetchKey, points: &[NamedPoint], scale: f64) -> Vec<PointValue> {
    let values = source.point_values(key, points, scale).unwrap_or_else(|e| {
        warn!("no point values for {}: {}", key, e);
        vec![None; points.len()]
    });

    points.iter()
        .zip(values.into_iter().chain(std::iter::repeat(None)))
        .map(|(p, value)| PointValue { name: p.name.clone(), value })
        .collect()
}

/// Returns min, max, mean and pixel count over the region for one forecast image
///
/// # Arguments
///
/// * 'source' - archive to reduce in
/// * 'key' - creation time and forecast hours of the image
/// * 'scale' - resolution in metres to reduce at
pub fn run_diagnostic<S: StatsSource>(source: &S, key: &FetchKey, scale: f64) -> Option<RegionStats> {
    match source.region_stats(key, scale) {
        Ok(stats) => {
            match &stats {
                Some(s) => info!("diagnostic for {}: {}", key, s),
                None => info!("diagnostic for {}: no data", key),
            }
            stats
        },
        Err(e) => {
            warn!("no diagnostic for {}: {}", key, e);
            None
        },
    }
}
