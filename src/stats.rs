//! Run-wide statistics.
//!
//! [`CompressionStats`] is the only state shared by the workers of a compress
//! run. It is mutated exclusively through [`CompressionStats::record`] and read
//! through an immutable [`StatsReport`] once the run is drained.

use crate::processing::TransformResult;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

/// Count of images per exact `WxH` bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionHistogram {
    buckets: HashMap<String, usize>,
}

impl ResolutionHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, width: u32, height: u32) {
        *self.buckets.entry(format!("{}x{}", width, height)).or_insert(0) += 1;
    }

    pub fn get(&self, key: &str) -> usize {
        self.buckets.get(key).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.buckets.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Buckets by descending count; equal counts ordered by key.
    pub fn sorted(&self) -> Vec<(&str, usize)> {
        let mut entries: Vec<(&str, usize)> = self
            .buckets
            .iter()
            .map(|(key, count)| (key.as_str(), *count))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }

    /// `"WxH: count (pct%)"` lines in [`sorted`](Self::sorted) order.
    pub fn report_lines(&self) -> Vec<String> {
        let total = self.total();
        self.sorted()
            .into_iter()
            .map(|(key, count)| {
                let pct = count as f64 / total as f64 * 100.0;
                format!("{}: {} ({:.2}%)", key, count, pct)
            })
            .collect()
    }
}

#[derive(Debug, Default)]
struct Counters {
    processed_count: usize,
    skipped_count: usize,
    failed_count: usize,
    total_original_size: u64,
    total_compressed_size: u64,
    resolutions: ResolutionHistogram,
}

/// Thread-safe accumulator for one compress run.
#[derive(Debug, Default)]
pub struct CompressionStats {
    inner: Mutex<Counters>,
}

impl CompressionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, result: &TransformResult) {
        let mut counters = self.lock();
        match result {
            TransformResult::Success {
                original_size,
                compressed_size,
                resolution,
            } => {
                counters.processed_count += 1;
                counters.total_original_size += original_size;
                counters.total_compressed_size += compressed_size;
                if let Some((width, height)) = resolution {
                    counters.resolutions.add(*width, *height);
                }
            }
            TransformResult::Skipped => counters.skipped_count += 1,
            TransformResult::Failed { .. } => {
                counters.skipped_count += 1;
                counters.failed_count += 1;
            }
        }
    }

    pub fn snapshot(&self) -> StatsReport {
        let counters = self.lock();
        StatsReport {
            processed_count: counters.processed_count,
            skipped_count: counters.skipped_count,
            failed_count: counters.failed_count,
            total_original_size: counters.total_original_size,
            total_compressed_size: counters.total_compressed_size,
            resolutions: counters.resolutions.clone(),
        }
    }

    // Poisoned counters are still readable.
    fn lock(&self) -> MutexGuard<'_, Counters> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Immutable view of [`CompressionStats`].
#[derive(Debug, Clone, PartialEq)]
pub struct StatsReport {
    pub processed_count: usize,
    /// Skipped plus failed items.
    pub skipped_count: usize,
    /// Failed items only; always `<= skipped_count`.
    pub failed_count: usize,
    pub total_original_size: u64,
    pub total_compressed_size: u64,
    pub resolutions: ResolutionHistogram,
}

impl StatsReport {
    /// `1 - compressed / original`, or `None` when nothing was processed.
    pub fn average_ratio(&self) -> Option<f64> {
        if self.processed_count == 0 || self.total_original_size == 0 {
            return None;
        }
        Some(1.0 - self.total_compressed_size as f64 / self.total_original_size as f64)
    }
}

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.average_ratio() {
            None => write!(f, "no files processed (skipped: {})", self.skipped_count),
            Some(ratio) => write!(
                f,
                "processed: {}, skipped: {}, average compression: {:.2}%",
                self.processed_count,
                self.skipped_count,
                ratio * 100.0
            ),
        }
    }
}
