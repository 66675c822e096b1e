use crate::constants::{
    COMPRESSED_SIZE_PREFIX, COMPRESSION_RATIO_PREFIX, ERROR_PREFIX, INFO_PREFIX,
    ORIGINAL_SIZE_PREFIX, SKIP_PREFIX, SUCCESS_PREFIX, WARNING_PREFIX,
};
use crate::discovery::{FileEnumerator, WorkItem};
use crate::error::{CompressionError, Result};
use crate::naming::compressed_sibling;
use crate::processing::{transform, Codec, TransformParams, TransformResult};
use crate::stats::{CompressionStats, StatsReport};
use crate::utils::{calculate_compression_ratio, create_progress_bar, format_file_size};
use std::path::Path;
use std::sync::mpsc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Worker count for this host: all logical CPUs but one, and at least one.
pub fn default_worker_count() -> usize {
    num_cpus::get().saturating_sub(1).max(1)
}

/// Fans a work list out over a bounded rayon pool and hands every result back
/// to the calling thread in completion order.
///
/// A scheduler is single-use; [`Scheduler::run`] consumes it.
#[derive(Debug)]
pub struct Scheduler {
    workers: usize,
}

impl Scheduler {
    pub fn for_host() -> Self {
        Self::with_workers(default_worker_count())
    }

    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs `job` once per item and calls `on_complete` on the calling thread
    /// as each job finishes. Blocks until every item has completed and
    /// returns the number of completed items. Failed jobs are not retried.
    pub fn run<T, J, C>(self, items: Vec<WorkItem>, job: J, mut on_complete: C) -> Result<usize>
    where
        T: Send,
        J: Fn(&WorkItem) -> T + Sync,
        C: FnMut(WorkItem, T),
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("img-batch-worker-{}", i))
            .build()
            .map_err(|e| CompressionError::ThreadPool(e.to_string()))?;

        let job = &job;
        let (tx, rx) = mpsc::channel::<(WorkItem, T)>();
        let mut completed = 0;

        pool.in_place_scope(|scope| {
            for item in items {
                let tx = tx.clone();
                scope.spawn(move |_| {
                    let output = job(&item);
                    // The receiver outlives every sender inside this scope.
                    let _ = tx.send((item, output));
                });
            }
            drop(tx);

            for (item, output) in rx {
                completed += 1;
                on_complete(item, output);
            }
        });

        Ok(completed)
    }
}

/// Compresses every candidate image below `root` into its `_min` sibling
/// using a pool sized for this host.
pub fn compress_directory<C: Codec + ?Sized>(
    root: &Path,
    params: &TransformParams,
    codec: &C,
) -> Result<StatsReport> {
    compress_directory_with(root, params, codec, Scheduler::for_host())
}

pub fn compress_directory_with<C: Codec + ?Sized>(
    root: &Path,
    params: &TransformParams,
    codec: &C,
    scheduler: Scheduler,
) -> Result<StatsReport> {
    let items = FileEnumerator::for_compress().enumerate(root)?;
    let total_files = items.len();
    let start_time = Instant::now();
    let stats = CompressionStats::new();

    info!("🚀 Starting batch compression in {:?}", root);
    info!(
        "{} quality: {}, target: {}x{}, scale ratio: {}",
        INFO_PREFIX,
        params.quality,
        params
            .target_width
            .map_or_else(|| "-".to_string(), |w| w.to_string()),
        params
            .target_height
            .map_or_else(|| "-".to_string(), |h| h.to_string()),
        params.scale_ratio
    );

    if total_files == 0 {
        warn!("{}  No image files found in the input directory", WARNING_PREFIX);
    } else {
        info!("📊 Found {} image files to process", total_files);
        info!("⚙️  Using {} worker threads", scheduler.workers());

        let progress = create_progress_bar(total_files as u64, "compressing");
        scheduler.run(
            items,
            |item| transform(&item.source_path, params, codec),
            |item, result| {
                progress.suspend(|| log_result(&item.source_path, &result));
                stats.record(&result);
                progress.inc(1);
            },
        )?;
        progress.finish_and_clear();
    }

    let report = stats.snapshot();
    log_summary(&report, start_time.elapsed());
    Ok(report)
}

fn log_result(source: &Path, result: &TransformResult) {
    match result {
        TransformResult::Success {
            original_size,
            compressed_size,
            ..
        } => {
            let sibling = compressed_sibling(source);
            info!(
                "{} {:?} -> {:?} | {} {} | {} {} | {} {:.2}%",
                SUCCESS_PREFIX,
                source,
                sibling.file_name().unwrap_or_default(),
                ORIGINAL_SIZE_PREFIX,
                format_file_size(*original_size),
                COMPRESSED_SIZE_PREFIX,
                format_file_size(*compressed_size),
                COMPRESSION_RATIO_PREFIX,
                calculate_compression_ratio(*original_size, *compressed_size)
            );
        }
        TransformResult::Skipped => {
            info!(
                "{}  Skipped {:?}: compressed output was not smaller",
                SKIP_PREFIX, source
            );
        }
        TransformResult::Failed { reason } => {
            warn!("{} Failed to process {:?}: {}", ERROR_PREFIX, source, reason);
        }
    }
}

fn log_summary(report: &StatsReport, elapsed: Duration) {
    info!("📊 Batch Compression Summary:");
    match report.average_ratio() {
        None => {
            info!("  no files processed");
            if report.skipped_count > 0 {
                info!("  {}  Skipped files: {}", SKIP_PREFIX, report.skipped_count);
            }
        }
        Some(ratio) => {
            info!("  📁 Files processed: {}", report.processed_count);
            info!(
                "  {}  Files skipped (no gain or failed): {}",
                SKIP_PREFIX, report.skipped_count
            );
            info!(
                "  📊 Total original size: {}",
                format_file_size(report.total_original_size)
            );
            info!(
                "  📈 Total compressed size: {}",
                format_file_size(report.total_compressed_size)
            );
            info!("  🎯 Average compression: {:.2}%", ratio * 100.0);
            if !report.resolutions.is_empty() {
                info!("  📏 Output resolutions:");
                for line in report.resolutions.report_lines() {
                    info!("    {}", line);
                }
            }
        }
    }
    if report.failed_count > 0 {
        warn!("  {} Failed files: {}", ERROR_PREFIX, report.failed_count);
    }
    info!("  ⏱️  Total time: {:?}", elapsed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::ImageCodec;
    use std::collections::HashSet;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use tempfile::TempDir;

    #[test]
    fn test_default_worker_count_leaves_one_cpu() {
        let workers = default_worker_count();
        assert!(workers >= 1);
        if num_cpus::get() > 1 {
            assert_eq!(workers, num_cpus::get() - 1);
        }
    }

    #[test]
    fn test_scheduler_never_zero_workers() {
        assert_eq!(Scheduler::with_workers(0).workers(), 1);
    }

    #[test]
    fn test_scheduler_runs_every_item_once() {
        let items: Vec<WorkItem> = (0..50)
            .map(|i| WorkItem::new(format!("img_{}.jpg", i)))
            .collect();
        let calls = AtomicUsize::new(0);
        let mut seen = HashSet::new();

        let completed = Scheduler::with_workers(4)
            .run(
                items.clone(),
                |item| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    item.source_path.to_string_lossy().len()
                },
                |item, len| {
                    assert_eq!(item.source_path.to_string_lossy().len(), len);
                    assert!(seen.insert(item));
                },
            )
            .unwrap();

        assert_eq!(completed, 50);
        assert_eq!(calls.load(Ordering::SeqCst), 50);
        assert_eq!(seen, items.into_iter().collect());
    }

    #[test]
    fn test_scheduler_delivers_in_completion_order() {
        let items = vec![WorkItem::new("slow.jpg"), WorkItem::new("fast.jpg")];
        let mut order = Vec::new();

        Scheduler::with_workers(2)
            .run(
                items,
                |item| {
                    if item.source_path.ends_with("slow.jpg") {
                        thread::sleep(Duration::from_millis(300));
                    }
                },
                |item, ()| order.push(item.source_path),
            )
            .unwrap();

        assert_eq!(
            order,
            vec![
                std::path::PathBuf::from("fast.jpg"),
                std::path::PathBuf::from("slow.jpg")
            ]
        );
    }

    #[test]
    fn test_scheduler_empty_work_list() {
        let completed = Scheduler::with_workers(2)
            .run(Vec::new(), |_| (), |_, ()| panic!("no items"))
            .unwrap();
        assert_eq!(completed, 0);
    }

    #[test]
    fn test_compress_directory_empty() {
        let temp_dir = TempDir::new().unwrap();
        let report = compress_directory_with(
            temp_dir.path(),
            &TransformParams::default(),
            &ImageCodec::default(),
            Scheduler::with_workers(2),
        )
        .unwrap();

        assert_eq!(report.processed_count, 0);
        assert_eq!(report.skipped_count, 0);
        assert_eq!(report.average_ratio(), None);
    }

    #[test]
    fn test_compress_directory_rejects_file_root() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("photo.jpg");
        fs::write(&file, b"x").unwrap();

        let result = compress_directory(&file, &TransformParams::default(), &ImageCodec::default());
        assert!(matches!(result, Err(CompressionError::NotADirectory(_))));
    }

    #[test]
    fn test_compress_directory_counts_failures_as_skipped() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.jpg"), b"fake jpg data").unwrap();
        fs::write(temp_dir.path().join("b.png"), b"fake png data").unwrap();

        let report = compress_directory_with(
            temp_dir.path(),
            &TransformParams::default(),
            &ImageCodec::default(),
            Scheduler::with_workers(2),
        )
        .unwrap();

        assert_eq!(report.processed_count, 0);
        assert_eq!(report.skipped_count, 2);
        assert_eq!(report.failed_count, 2);
        assert!(!temp_dir.path().join("a_min.jpg").exists());
        assert!(!temp_dir.path().join("b_min.png").exists());
    }
}
