use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use crate::errors::InvalidRangeError;

/// Returns every calendar date from start to end, both inclusive, in ascending order
///
/// # Arguments
///
/// * 'start' - first validity date
/// * 'end' - last validity date, must not precede start
pub fn validity_dates(start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>, InvalidRangeError> {
    if end < start {
        return Err(InvalidRangeError { start, end });
    }

    Ok(start.iter_days().take_while(|d| *d <= end).collect())
}

/// Returns the validity timestamp for a date at the given run time of day (UTC)
///
/// # Arguments
///
/// * 'date' - the validity date
/// * 'run_time' - time of day of the forecast run
pub fn validity_time(date: NaiveDate, run_time: NaiveTime) -> DateTime<Utc> {
    date.and_time(run_time).and_utc()
}
