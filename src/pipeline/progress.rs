// file: src/pipeline/progress.rs
// description: progress tracking and statistics reporting for cache prefetching
// reference: uses indicatif for progress bars and tracks fetch metrics

use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

#[derive(Debug, Clone, Default)]
pub struct PrefetchStats {
    pub documents_fetched: usize,
    pub documents_failed: usize,
    pub total_bytes_fetched: u64,
    pub duration_secs: u64,
}

impl PrefetchStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn documents_per_second(&self) -> f64 {
        if self.duration_secs == 0 {
            return 0.0;
        }
        self.documents_fetched as f64 / self.duration_secs as f64
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.documents_fetched + self.documents_failed;
        if total == 0 {
            return 0.0;
        }
        (self.documents_fetched as f64 / total as f64) * 100.0
    }

    pub fn summary(&self) -> String {
        format!(
            "{} fetched, {} failed, {} bytes in {}s ({:.1}% success)",
            self.documents_fetched.to_string().green(),
            self.documents_failed.to_string().red(),
            self.total_bytes_fetched,
            self.duration_secs,
            self.success_rate()
        )
    }
}

pub struct ProgressTracker {
    main_bar: ProgressBar,
    detail_bar: ProgressBar,
    documents_fetched: Arc<AtomicUsize>,
    documents_failed: Arc<AtomicUsize>,
    bytes_fetched: Arc<AtomicU64>,
    start_time: Instant,
}

impl ProgressTracker {
    pub fn new(total_documents: usize) -> Self {
        Self::with_color(total_documents, true)
    }

    pub fn with_color(total_documents: usize, colored: bool) -> Self {
        let multi_progress = MultiProgress::new();

        let main_bar = create_progress_bar(&multi_progress, total_documents as u64, colored);
        let detail_bar = create_detail_bar(&multi_progress);

        Self {
            main_bar,
            detail_bar,
            documents_fetched: Arc::new(AtomicUsize::new(0)),
            documents_failed: Arc::new(AtomicUsize::new(0)),
            bytes_fetched: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    /// Counts without drawing anything.
    pub fn hidden(total_documents: usize) -> Self {
        Self {
            main_bar: ProgressBar::hidden(),
            detail_bar: ProgressBar::hidden(),
            documents_fetched: Arc::new(AtomicUsize::new(0)),
            documents_failed: Arc::new(AtomicUsize::new(0)),
            bytes_fetched: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
        .with_length(total_documents)
    }

    fn with_length(self, total_documents: usize) -> Self {
        self.main_bar.set_length(total_documents as u64);
        self
    }

    pub fn inc_fetched(&self, bytes: u64) {
        self.documents_fetched.fetch_add(1, Ordering::SeqCst);
        self.bytes_fetched.fetch_add(bytes, Ordering::SeqCst);
        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    pub fn inc_failed(&self) {
        self.documents_failed.fetch_add(1, Ordering::SeqCst);
        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    pub fn set_message(&self, message: String) {
        self.main_bar.set_message(message);
    }

    pub fn finish(&self) {
        self.main_bar.finish_with_message("Prefetch complete");
        self.detail_bar.finish_and_clear();
    }

    pub fn get_stats(&self) -> PrefetchStats {
        PrefetchStats {
            documents_fetched: self.documents_fetched.load(Ordering::SeqCst),
            documents_failed: self.documents_failed.load(Ordering::SeqCst),
            total_bytes_fetched: self.bytes_fetched.load(Ordering::SeqCst),
            duration_secs: self.start_time.elapsed().as_secs(),
        }
    }

    fn update_detail_bar(&self) {
        let fetched = self.documents_fetched.load(Ordering::SeqCst);
        let failed = self.documents_failed.load(Ordering::SeqCst);

        self.detail_bar
            .set_message(format!("Cached: {} | Failed: {}", fetched, failed));
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.finish();
    }
}

fn create_progress_bar(multi_progress: &MultiProgress, total: u64, colored: bool) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(total));
    let (template, chars) = if colored {
        (
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
            "█▓▒░",
        )
    } else {
        (
            "{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({eta}) {msg}",
            "=>-",
        )
    };

    if let Ok(style) = ProgressStyle::default_bar().template(template) {
        bar.set_style(style.progress_chars(chars));
    }
    bar
}

fn create_detail_bar(multi_progress: &MultiProgress) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(0));
    if let Ok(style) = ProgressStyle::default_bar().template("{msg}") {
        bar.set_style(style);
    }
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefetch_stats_calculations() {
        let stats = PrefetchStats {
            documents_fetched: 90,
            documents_failed: 10,
            total_bytes_fetched: 4096,
            duration_secs: 10,
        };

        assert_eq!(stats.documents_per_second(), 9.0);
        assert!((stats.success_rate() - 90.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_prefetch_stats_zero_duration() {
        let stats = PrefetchStats::new();
        assert_eq!(stats.documents_per_second(), 0.0);
        assert_eq!(stats.success_rate(), 0.0);
    }

    #[test]
    fn test_progress_tracker_counts() {
        let tracker = ProgressTracker::hidden(10);

        tracker.inc_fetched(1024);
        tracker.inc_fetched(512);
        tracker.inc_failed();

        let stats = tracker.get_stats();
        assert_eq!(stats.documents_fetched, 2);
        assert_eq!(stats.documents_failed, 1);
        assert_eq!(stats.total_bytes_fetched, 1536);
    }
}
