use crate::models::forecast::{DifferenceRecord, ForecastSample, StatsSummary};

/// Returns one DifferenceRecord per sample where both lead values are present.
/// Samples missing either value are left out, never zero filled.
///
/// # Arguments
///
/// * 'samples' - samples ordered by validity time
/// * 'minuend' - name of the lead time to subtract from
/// * 'subtrahend' - name of the lead time to subtract
pub fn differences(samples: &[ForecastSample], minuend: &str, subtrahend: &str) -> Vec<DifferenceRecord> {
    samples.iter()
        .filter_map(|s| match (s.value(minuend), s.value(subtrahend)) {
            (Some(a), Some(b)) => Some(DifferenceRecord { validity_time: s.validity_time, difference: a - b }),
            _ => None,
        })
        .collect()
}

/// Returns mean and population standard deviation (divided by N) over the differences
///
/// # Arguments
///
/// * 'records' - the difference records to summarize
pub fn summarize(records: &[DifferenceRecord]) -> StatsSummary {
    let count = records.len();
    if count == 0 {
        return StatsSummary { count, mean: None, std_dev: None };
    }

    let n = count as f64;
    let mean = records.iter().map(|r| r.difference).sum::<f64>() / n;
    let variance = records.iter()
        .map(|r| (r.difference - mean).powi(2))
        .sum::<f64>() / n;

    StatsSummary { count, mean: Some(mean), std_dev: Some(variance.sqrt()) }
}
