use log::info;
use crate::config::Comparison;
use crate::dates::validity_dates;
use crate::errors::{ConfigError, RunError};
use crate::manager_archive::ValueSource;
use crate::models::forecast::{DifferenceRecord, FetchCounts, ForecastSample, StatsSummary};
use crate::sampling::build_samples;
use crate::series::{difference_series, sample_series, Series};
use crate::statistics::{differences, summarize};

/// Everything a comparison run needs, passed explicitly instead of kept in globals
pub struct RunContext<'a, S: ValueSource> {
    pub source: &'a S,
    pub comparison: &'a Comparison,
    pub max_workers: usize,
}

/// Immutable result of one comparison run, handed to reporting
pub struct ComparisonRun {
    pub samples: Vec<ForecastSample>,
    pub differences: Vec<DifferenceRecord>,
    pub stats: StatsSummary,
    pub counts: FetchCounts,
    pub sample_series: Series,
    pub difference_series: Series,
}

impl<'a, S: ValueSource> RunContext<'a, S> {
    /// Runs the comparison: enumerate dates, fetch samples, compute differences and
    /// statistics and build chart series.
    ///
    /// Range and configuration errors abort before anything is fetched.
    pub fn run(&self) -> Result<ComparisonRun, RunError> {
        let c = self.comparison;

        let dates = validity_dates(c.start_date, c.end_date)?;
        for name in [&c.minuend, &c.subtrahend] {
            if !c.lead_times.iter().any(|l| &l.name == name) {
                return Err(ConfigError(format!("unknown lead time in difference pair: {}", name)).into());
            }
        }

        info!("comparing {} - {} for {} validity dates from {} to {}",
              c.minuend, c.subtrahend, dates.len(), c.start_date, c.end_date);

        let set = build_samples(self.source, &dates, c.run_time, &c.lead_times, self.max_workers)?;
        let records = differences(&set.samples, &c.minuend, &c.subtrahend);
        let stats = summarize(&records);

        info!("fetched {}, absent {}, failed {}; {}",
              set.counts.fetched, set.counts.absent, set.counts.failed, stats);

        let sample_series = sample_series(&set.samples, &c.lead_times);
        let difference_series = difference_series(&records, &format!("{} - {}", c.minuend, c.subtrahend));

        Ok(ComparisonRun {
            samples: set.samples,
            differences: records,
            stats,
            counts: set.counts,
            sample_series,
            difference_series,
        })
    }
}
