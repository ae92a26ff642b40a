use std::fmt;
use std::fmt::Formatter;
use chrono::{DateTime, Utc};
use serde::Serialize;
use crate::models::forecast::{DifferenceRecord, ForecastSample, LeadTime};

/// One chart row, a timestamp followed by one value per column.
/// Absent values are gaps and must not be drawn through.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct SeriesRow {
    pub timestamp: DateTime<Utc>,
    pub values: Vec<Option<f64>>,
}

/// Chart ready time series ordered by timestamp
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Series {
    pub columns: Vec<String>,
    pub rows: Vec<SeriesRow>,
}

impl Series {
    /// Returns a series from rows in any order, sorting them by timestamp
    ///
    /// # Arguments
    ///
    /// * 'columns' - column names
    /// * 'rows' - the rows, each holding one value per column
    pub fn new(columns: Vec<String>, mut rows: Vec<SeriesRow>) -> Series {
        rows.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Series { columns, rows }
    }

    /// Number of gaps in the given column
    pub fn gaps(&self, column: usize) -> usize {
        self.rows.iter().filter(|r| r.values.get(column).is_none_or(|v| v.is_none())).count()
    }
}

/// Implementation of the Display Trait for pretty print
impl fmt::Display for Series {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{:<20}", "time")?;
        for c in &self.columns {
            write!(f, " {:>10}", c)?;
        }
        writeln!(f)?;

        for row in &self.rows {
            write!(f, "{:<20}", row.timestamp.format("%Y-%m-%d %H:%M"))?;
            for v in &row.values {
                match v {
                    Some(v) => write!(f, " {:>10.3}", v)?,
                    None => write!(f, " {:>10}", "-")?,
                }
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

/// Returns a series with one column per lead time, in the given lead order
///
/// # Arguments
///
/// * 'samples' - the forecast samples
/// * 'leads' - lead times to include as columns
pub fn sample_series(samples: &[ForecastSample], leads: &[LeadTime]) -> Series {
    let rows = samples.iter()
        .map(|s| SeriesRow {
            timestamp: s.validity_time,
            values: leads.iter().map(|l| s.value(&l.name)).collect(),
        })
        .collect();

    Series::new(leads.iter().map(|l| l.name.clone()).collect(), rows)
}

/// Returns a single column series of differences
///
/// # Arguments
///
/// * 'records' - the difference records
/// * 'column' - name of the column
pub fn difference_series(records: &[DifferenceRecord], column: &str) -> Series {
    let rows = records.iter()
        .map(|r| SeriesRow { timestamp: r.validity_time, values: vec![Some(r.difference)] })
        .collect();

    Series::new(vec![column.to_string()], rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use chrono::TimeZone;

    fn sample(d: u32, v24: Option<f64>) -> ForecastSample {
        let mut values = BTreeMap::new();
        values.insert("24h".to_string(), v24);
        ForecastSample { validity_time: Utc.with_ymd_and_hms(2025, 1, d, 12, 0, 0).unwrap(), values }
    }

    fn lead24() -> Vec<LeadTime> {
        vec![LeadTime { name: "24h".to_string(), hours: 24 }]
    }

    #[test]
    fn middle_gap_is_kept() {
        let series = sample_series(&[sample(1, Some(3.0)), sample(2, None), sample(3, Some(4.0))], &lead24());

        assert_eq!(series.rows.len(), 3);
        assert_eq!(series.rows[1].values, vec![None]);
        assert_eq!(series.gaps(0), 1);
    }

    #[test]
    fn rows_are_sorted_by_timestamp() {
        let series = sample_series(&[sample(3, Some(1.0)), sample(1, Some(2.0)), sample(2, Some(3.0))], &lead24());
        assert!(series.rows.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert_eq!(series.rows[0].values, vec![Some(2.0)]);
    }

    #[test]
    fn column_per_lead_in_order() {
        let mut s = sample(1, Some(1.0));
        s.values.insert("48h".to_string(), Some(2.0));
        let leads = vec![
            LeadTime { name: "48h".to_string(), hours: 48 },
            LeadTime { name: "24h".to_string(), hours: 24 },
        ];

        let series = sample_series(&[s], &leads);
        assert_eq!(series.columns, vec!["48h", "24h"]);
        assert_eq!(series.rows[0].values, vec![Some(2.0), Some(1.0)]);
    }

    #[test]
    fn gaps_serialize_as_null() {
        let series = sample_series(&[sample(1, None)], &lead24());
        let json = serde_json::to_value(&series).unwrap();
        assert!(json["rows"][0]["values"][0].is_null());
    }

    #[test]
    fn display_marks_gaps() {
        let series = sample_series(&[sample(1, Some(1.25)), sample(2, None)], &lead24());
        let text = series.to_string();
        assert!(text.contains("2025-01-01 12:00"));
        assert!(text.contains("1.250"));
        assert!(text.lines().nth(2).unwrap().trim_end().ends_with('-'));
    }

    #[test]
    fn difference_series_has_one_column() {
        let records = vec![DifferenceRecord {
            validity_time: Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap(),
            difference: 2.0,
        }];
        let series = difference_series(&records, "24h - 48h");
        assert_eq!(series.columns, vec!["24h - 48h"]);
        assert_eq!(series.rows[0].values, vec![Some(2.0)]);
    }
}
