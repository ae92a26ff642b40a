use std::collections::{BTreeMap, BTreeSet};
use chrono::{NaiveDate, NaiveTime, TimeDelta};
use log::{info, warn};
use rayon::prelude::*;
use crate::dates::validity_time;
use crate::errors::{ConfigError, RunError};
use crate::manager_archive::ValueSource;
use crate::manager_archive::errors::FetchError;
use crate::models::forecast::{FetchCounts, FetchKey, ForecastSample, LeadTime};

/// Samples of a run together with fetch outcome counts
pub struct SampleSet {
    pub samples: Vec<ForecastSample>,
    pub counts: FetchCounts,
}

/// Returns the archive key for a validity date and lead time, or None if the
/// creation time (validity time minus the lead hours) is out of range.
///
/// # Arguments
///
/// * 'date' - the validity date
/// * 'run_time' - time of day of the forecast run
/// * 'lead' - the lead time
pub fn fetch_key(date: NaiveDate, run_time: NaiveTime, lead: &LeadTime) -> Option<FetchKey> {
    let validity = validity_time(date, run_time);
    let lead_time = TimeDelta::try_hours(lead.hours as i64)?;

    Some(FetchKey {
        creation_time: validity.checked_sub_signed(lead_time)?,
        forecast_hours: lead.hours,
    })
}

/// Builds one ForecastSample per validity date with one value per lead time.
///
/// All keys are collected up front and fetched on a bounded worker pool. Results are
/// joined back by key, so the order in which fetches complete does not matter.
/// A failed fetch is logged and recorded as absent, it never aborts the run.
///
/// # Arguments
///
/// * 'source' - the value source to fetch from
/// * 'dates' - validity dates in ascending order
/// * 'run_time' - time of day of the forecast run
/// * 'leads' - lead times to fetch for every date
/// * 'max_workers' - max number of concurrent fetches
pub fn build_samples<S: ValueSource>(
    source: &S,
    dates: &[NaiveDate],
    run_time: NaiveTime,
    leads: &[LeadTime],
    max_workers: usize) -> Result<SampleSet, RunError> {

    let mut grid: Vec<Vec<FetchKey>> = Vec::with_capacity(dates.len());
    for &d in dates {
        let row = leads.iter()
            .map(|l| fetch_key(d, run_time, l).ok_or_else(|| {
                ConfigError(format!("lead time {} puts the creation time for {} out of range", l.name, d))
            }))
            .collect::<Result<Vec<FetchKey>, ConfigError>>()?;
        grid.push(row);
    }

    let keys = grid.iter()
        .flatten()
        .copied()
        .collect::<BTreeSet<FetchKey>>()
        .into_iter()
        .collect::<Vec<FetchKey>>();

    info!("fetching {} values using {} workers", keys.len(), max_workers);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(max_workers.max(1))
        .build()?;

    let results: Vec<(FetchKey, Result<Option<f64>, FetchError>)> = pool.install(|| {
        keys.par_iter()
            .map(|k| (*k, source.fetch(k)))
            .collect()
    });

    let (values, counts) = join_results(results);

    let samples = dates.iter()
        .zip(&grid)
        .map(|(&d, row)| ForecastSample {
            validity_time: validity_time(d, run_time),
            values: leads.iter()
                .zip(row)
                .map(|(l, k)| (l.name.clone(), values.get(k).copied().flatten()))
                .collect(),
        })
        .collect();

    Ok(SampleSet { samples, counts })
}

/// Joins fetch results by key, degrading transient errors to absent values
///
/// # Arguments
///
/// * 'results' - fetch results in any order
fn join_results(results: Vec<(FetchKey, Result<Option<f64>, FetchError>)>) -> (BTreeMap<FetchKey, Option<f64>>, FetchCounts) {
    let mut counts = FetchCounts::default();
    let mut values = BTreeMap::new();

    for (key, result) in results {
        let value = match result {
            Ok(Some(v)) => { counts.fetched += 1; Some(v) },
            Ok(None) => { counts.absent += 1; None },
            Err(e) => {
                warn!("treating {} as absent: {}", key, e);
                counts.failed += 1;
                None
            },
        };
        values.insert(key, value);
    }

    (values, counts)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use chrono::{DateTime, TimeZone, Utc};

    /// In-memory value source keyed by creation time and forecast hours.
    /// Keys listed in 'failing' return a transient error.
    pub struct MemorySource {
        pub values: HashMap<FetchKey, f64>,
        pub failing: Vec<FetchKey>,
    }

    impl MemorySource {
        pub fn new() -> MemorySource {
            MemorySource { values: HashMap::new(), failing: Vec::new() }
        }

        pub fn insert(&mut self, creation_time: DateTime<Utc>, forecast_hours: u32, value: f64) {
            self.values.insert(FetchKey { creation_time, forecast_hours }, value);
        }
    }

    impl ValueSource for MemorySource {
        fn fetch(&self, key: &FetchKey) -> Result<Option<f64>, FetchError> {
            if self.failing.contains(key) {
                return Err(FetchError::Transport("connection reset".to_string()));
            }
            Ok(self.values.get(key).copied())
        }
    }

    pub fn leads() -> Vec<LeadTime> {
        vec![
            LeadTime { name: "24h".to_string(), hours: 24 },
            LeadTime { name: "48h".to_string(), hours: 48 },
        ]
    }

    pub fn noon() -> NaiveTime {
        NaiveTime::from_hms_opt(12, 0, 0).unwrap()
    }

    pub fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    /// Source for three days where day two has no 24h forecast
    pub fn scenario_source() -> MemorySource {
        let mut source = MemorySource::new();
        let lead = leads();
        for (d, v24, v48) in [(1, Some(10.0), 8.0), (2, None, 9.0), (3, Some(12.0), 11.0)] {
            if let Some(v) = v24 {
                let k = fetch_key(day(d), noon(), &lead[0]).unwrap();
                source.insert(k.creation_time, 24, v);
            }
            let k = fetch_key(day(d), noon(), &lead[1]).unwrap();
            source.insert(k.creation_time, 48, v48);
        }
        source
    }

    #[test]
    fn creation_time_is_validity_minus_lead() {
        let key = fetch_key(day(3), noon(), &leads()[1]).unwrap();
        assert_eq!(key.creation_time, Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap());
        assert_eq!(key.forecast_hours, 48);
        assert_eq!(key.creation_string(), "2025-01-01T12:00:00Z");
    }

    #[test]
    fn long_lead_crosses_month() {
        let lead = LeadTime { name: "312h".to_string(), hours: 312 };
        let key = fetch_key(day(3), noon(), &lead).unwrap();
        assert_eq!(key.creation_string(), "2024-12-21T12:00:00Z");
    }

    #[test]
    fn builds_one_sample_per_date_with_gaps() {
        let source = scenario_source();
        let dates = vec![day(1), day(2), day(3)];

        let set = build_samples(&source, &dates, noon(), &leads(), 2).unwrap();

        assert_eq!(set.samples.len(), 3);
        assert_eq!(set.samples[0].value("24h"), Some(10.0));
        assert_eq!(set.samples[0].value("48h"), Some(8.0));
        assert_eq!(set.samples[1].value("24h"), None);
        assert_eq!(set.samples[1].value("48h"), Some(9.0));
        assert!(set.samples[1].values.contains_key("24h"));
        assert_eq!(set.counts, FetchCounts { fetched: 5, absent: 1, failed: 0 });
        assert!(set.samples.windows(2).all(|w| w[0].validity_time < w[1].validity_time));
    }

    #[test]
    fn failed_fetch_is_absent_and_counted() {
        let mut source = scenario_source();
        source.failing.push(fetch_key(day(3), noon(), &leads()[0]).unwrap());

        let set = build_samples(&source, &[day(1), day(2), day(3)], noon(), &leads(), 4).unwrap();

        assert_eq!(set.samples[2].value("24h"), None);
        assert_eq!(set.samples[2].value("48h"), Some(11.0));
        assert_eq!(set.counts, FetchCounts { fetched: 4, absent: 1, failed: 1 });
    }

    #[test]
    fn single_worker_gives_same_result() {
        let source = scenario_source();
        let dates = vec![day(1), day(2), day(3)];

        let a = build_samples(&source, &dates, noon(), &leads(), 1).unwrap();
        let b = build_samples(&source, &dates, noon(), &leads(), 8).unwrap();
        assert_eq!(a.samples, b.samples);
    }

    #[test]
    fn lead_before_calendar_start_has_no_key() {
        let first = NaiveDate::from_ymd_opt(1, 1, 1).unwrap();
        let lead = LeadTime { name: "max".to_string(), hours: u32::MAX };

        assert!(fetch_key(first, noon(), &lead).is_none());
        assert!(fetch_key(NaiveDate::MIN, noon(), &leads()[0]).is_none());
    }

    #[test]
    fn out_of_range_lead_is_config_error() {
        let lead = vec![LeadTime { name: "max".to_string(), hours: u32::MAX }];
        let first = NaiveDate::from_ymd_opt(1, 1, 1).unwrap();

        let res = build_samples(&MemorySource::new(), &[first], noon(), &lead, 1);
        assert!(matches!(res, Err(RunError::Config(_))));
    }
}
