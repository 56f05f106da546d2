use std::{
    num::NonZeroUsize,
    time::{Duration, Instant},
};

use indicatif::HumanCount;
use log::{debug, error, info};
use rand::Rng;

use crate::{
    common::{percent, LoadError},
    store::UserStore,
    synth::UserSynthesizer,
};

pub const DEFAULT_PROGRESS_EVERY: NonZeroUsize = match NonZeroUsize::new(100) {
    Some(n) => n,
    None => unreachable!(),
};

/// Splits `total` records into consecutive batches of `batch_size`, the last
/// one clamped so the total is never overshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPlan {
    total: usize,
    batch_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch {
    pub index: usize,
    pub size: usize,
    /// Records done once this batch is inserted.
    pub processed: usize,
}

impl BatchPlan {
    #[must_use]
    pub const fn new(total: NonZeroUsize, batch_size: NonZeroUsize) -> Self {
        Self {
            total: total.get(),
            batch_size: batch_size.get(),
        }
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.total
    }

    #[must_use]
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    #[must_use]
    pub const fn total_batches(&self) -> usize {
        self.total.div_ceil(self.batch_size)
    }

    /// Size of batch `index`, zero past the end.
    #[must_use]
    pub fn batch_size_at(&self, index: usize) -> usize {
        let start = index.saturating_mul(self.batch_size).min(self.total);
        self.batch_size.min(self.total - start)
    }

    #[must_use]
    pub const fn is_last(&self, index: usize) -> bool {
        index + 1 == self.total_batches()
    }

    /// Progress goes out on every `every`th batch and on the final one.
    #[must_use]
    pub const fn is_progress_batch(&self, index: usize, every: NonZeroUsize) -> bool {
        index % every.get() == 0 || self.is_last(index)
    }

    #[must_use]
    pub const fn iter(&self) -> BatchIter {
        BatchIter {
            plan: *self,
            index: 0,
            processed: 0,
        }
    }
}

impl IntoIterator for BatchPlan {
    type Item = Batch;
    type IntoIter = BatchIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct BatchIter {
    plan: BatchPlan,
    index: usize,
    processed: usize,
}

impl Iterator for BatchIter {
    type Item = Batch;

    fn next(&mut self) -> Option<Self::Item> {
        if self.processed >= self.plan.total {
            return None;
        }

        let size = self.plan.batch_size.min(self.plan.total - self.processed);
        self.processed += size;
        let batch = Batch {
            index: self.index,
            size,
            processed: self.processed,
        };
        self.index += 1;

        Some(batch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.plan.total_batches() - self.index;
        (left, Some(left))
    }
}

impl ExactSizeIterator for BatchIter {}

/// One progress line, emitted after batch `batch` brought the total to `records`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub batch: usize,
    pub records: usize,
}

impl Progress {
    /// `Progress: 12.34% (1,234,000 records)`
    #[must_use]
    pub fn message(&self, total: usize) -> String {
        format!(
            "Progress: {}% ({} records)",
            percent(self.records, total),
            HumanCount(self.records as u64)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    pub records: usize,
    pub batches: usize,
    pub elapsed: Duration,
    /// Progress lines in the order they were logged.
    pub progress: Vec<Progress>,
}

impl LoadSummary {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn rows_per_sec(&self) -> f64 {
        if self.elapsed.is_zero() {
            return 0.0;
        }
        self.records as f64 / self.elapsed.as_secs_f64()
    }

    /// `Data Generation: 1.50s (6666.7 rows/sec)`
    #[must_use]
    pub fn timing_message(&self) -> String {
        format!(
            "Data Generation: {:.2?} ({:.1} rows/sec)",
            self.elapsed,
            self.rows_per_sec()
        )
    }
}

/// Drives one load: schema, then every batch of the plan in order.
pub struct BatchLoader<'a, S, R> {
    store: &'a mut S,
    synthesizer: UserSynthesizer<R>,
    plan: BatchPlan,
    progress_every: NonZeroUsize,
}

impl<'a, S: UserStore, R: Rng> BatchLoader<'a, S, R> {
    #[must_use]
    pub fn new(store: &'a mut S, synthesizer: UserSynthesizer<R>, plan: BatchPlan) -> Self {
        Self {
            store,
            synthesizer,
            plan,
            progress_every: DEFAULT_PROGRESS_EVERY,
        }
    }

    #[must_use]
    pub fn with_progress_every(mut self, every: NonZeroUsize) -> Self {
        self.progress_every = every;
        self
    }

    /// # Errors
    ///
    /// Stops at the first failing statement. Batches before it stay inserted.
    pub async fn call(mut self) -> Result<LoadSummary, LoadError> {
        self.store.create_users_table().await.map_err(|err| {
            error!("Error creating table: {}", err);
            LoadError::CreateTable(err)
        })?;

        info!(
            "Starting to generate {} records in batches of {}",
            self.plan.total(),
            self.plan.batch_size()
        );
        let start = Instant::now();

        let mut processed = 0usize;
        let mut progress = vec![];
        for batch in self.plan {
            let users = self.synthesizer.batch(batch.size);

            let inserted = self.store.insert_users(&users).await.map_err(|err| {
                error!("Error inserting batch #{}: {}", batch.index, err);
                LoadError::InsertBatch {
                    batch: batch.index,
                    source: err,
                }
            })?;
            debug!("Batch #{} inserted {} rows", batch.index, inserted);

            processed = batch.processed;

            if self.plan.is_progress_batch(batch.index, self.progress_every) {
                let report = Progress {
                    batch: batch.index,
                    records: processed,
                };
                info!("{}", report.message(self.plan.total()));
                progress.push(report);
            }
        }

        let summary = LoadSummary {
            records: processed,
            batches: self.plan.total_batches(),
            elapsed: start.elapsed(),
            progress,
        };

        info!("{}", summary.timing_message());
        info!(
            "Successfully generated {} records",
            HumanCount(summary.records as u64)
        );

        Ok(summary)
    }
}
