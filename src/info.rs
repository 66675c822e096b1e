use crate::batch::Scheduler;
use crate::constants::{INFO_PREFIX, WARNING_PREFIX};
use crate::discovery::{FileEnumerator, WorkItem};
use crate::error::Result;
use crate::stats::ResolutionHistogram;
use crate::utils::create_progress_bar;
use std::path::Path;
use tracing::{debug, info, warn};

/// Resolution census of a directory tree.
#[derive(Debug, Default)]
pub struct AnalysisReport {
    pub resolutions: ResolutionHistogram,
    /// Files whose header could not be read.
    pub unreadable: usize,
}

impl AnalysisReport {
    pub fn probed(&self) -> usize {
        self.resolutions.total()
    }
}

/// Reads only the image header to get its dimensions.
pub fn probe_dimensions(path: &Path) -> Result<(u32, u32)> {
    Ok(image::image_dimensions(path)?)
}

pub fn analyze_directory(root: &Path) -> Result<AnalysisReport> {
    analyze_directory_with(root, Scheduler::for_host())
}

/// Probes every image below `root` and logs the resolution distribution,
/// most common first.
pub fn analyze_directory_with(root: &Path, scheduler: Scheduler) -> Result<AnalysisReport> {
    let items = FileEnumerator::for_analyze().enumerate(root)?;
    let mut report = AnalysisReport::default();

    info!("🔍 Analyzing image resolutions in {:?}", root);

    if !items.is_empty() {
        let progress = create_progress_bar(items.len() as u64, "analyzing");
        scheduler.run(
            items,
            |item: &WorkItem| probe_dimensions(&item.source_path),
            |item, probe| {
                match probe {
                    Ok((width, height)) => report.resolutions.add(width, height),
                    Err(e) => {
                        progress.suspend(|| {
                            debug!("Could not read {:?}: {}", item.source_path, e)
                        });
                        report.unreadable += 1;
                    }
                }
                progress.inc(1);
            },
        )?;
        progress.finish_and_clear();
    }

    log_report(&report);
    Ok(report)
}

fn log_report(report: &AnalysisReport) {
    if report.resolutions.is_empty() {
        info!("{} no images found", INFO_PREFIX);
    } else {
        info!(
            "📏 Resolution distribution ({} images):",
            report.probed()
        );
        for line in report.resolutions.report_lines() {
            info!("  {}", line);
        }
    }
    if report.unreadable > 0 {
        warn!(
            "{}  {} files could not be read",
            WARNING_PREFIX, report.unreadable
        );
    }
}
