//! Progress tracking for migration operations.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

/// Callback type for progress updates.
pub type ProgressCallback = Box<dyn Fn(ProgressUpdate) + Send + Sync>;

/// Progress update information.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    /// Current phase of migration.
    pub phase: MigrationPhase,

    /// Current item being processed.
    pub current_item: Option<String>,

    /// Items completed in current phase.
    pub completed: u64,

    /// Total items in current phase.
    pub total: u64,

    /// Optional message.
    pub message: Option<String>,
}

/// Phases of a migration or import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationPhase {
    LoadingDirectory,
    SyncingLabels,
    TranslatingMilestones,
    ReplicatingIssues,
    CreatingRepository,
    Importing,
    RemovingRepository,
    /// Several repositories in flight; one step per finished repository.
    RunningBatch,
    Complete,
}

impl MigrationPhase {
    const ALL: [MigrationPhase; 9] = [
        Self::LoadingDirectory,
        Self::SyncingLabels,
        Self::TranslatingMilestones,
        Self::ReplicatingIssues,
        Self::CreatingRepository,
        Self::Importing,
        Self::RemovingRepository,
        Self::RunningBatch,
        Self::Complete,
    ];
}

impl std::fmt::Display for MigrationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LoadingDirectory => write!(f, "Loading repositories"),
            Self::SyncingLabels => write!(f, "Syncing labels"),
            Self::TranslatingMilestones => write!(f, "Translating milestones"),
            Self::ReplicatingIssues => write!(f, "Replicating issues"),
            Self::CreatingRepository => write!(f, "Creating repository"),
            Self::Importing => write!(f, "Importing git history"),
            Self::RemovingRepository => write!(f, "Removing repository"),
            Self::RunningBatch => write!(f, "Processing repositories"),
            Self::Complete => write!(f, "Complete"),
        }
    }
}

/// Progress tracker for migration operations.
pub struct MigrationProgress {
    phase: AtomicU8,
    completed: AtomicU64,
    total: AtomicU64,
    batch: AtomicBool,
    callback: Option<Arc<ProgressCallback>>,
}

impl MigrationProgress {
    /// Create a new progress tracker.
    pub fn new() -> Self {
        Self {
            phase: AtomicU8::new(0),
            completed: AtomicU64::new(0),
            total: AtomicU64::new(0),
            batch: AtomicBool::new(false),
            callback: None,
        }
    }

    /// Create a progress tracker with a callback.
    pub fn with_callback(callback: ProgressCallback) -> Self {
        Self {
            callback: Some(Arc::new(callback)),
            ..Self::new()
        }
    }

    /// Set the current phase. Ignored while a batch is tracked.
    pub fn set_phase(&self, phase: MigrationPhase, total: u64) {
        if self.in_batch() {
            return;
        }
        self.phase.store(phase as u8, Ordering::SeqCst);
        self.completed.store(0, Ordering::SeqCst);
        self.total.store(total, Ordering::SeqCst);
        self.notify(None, None);
    }

    /// Increment progress. Ignored while a batch is tracked.
    pub fn increment(&self, item: Option<&str>) {
        if self.in_batch() {
            return;
        }
        self.completed.fetch_add(1, Ordering::SeqCst);
        self.notify(item.map(|s| s.to_string()), None);
    }

    /// Set a message. Ignored while a batch is tracked.
    pub fn message(&self, msg: &str) {
        if self.in_batch() {
            return;
        }
        self.notify(None, Some(msg.to_string()));
    }

    /// Track concurrent repositories as one bar of `total` steps.
    ///
    /// Per-repository phase, item and message updates are dropped until
    /// [`end_batch`](Self::end_batch).
    pub fn begin_batch(&self, total: u64) {
        self.phase
            .store(MigrationPhase::RunningBatch as u8, Ordering::SeqCst);
        self.completed.store(0, Ordering::SeqCst);
        self.total.store(total, Ordering::SeqCst);
        self.batch.store(true, Ordering::SeqCst);
        self.notify(None, None);
    }

    /// One repository of the tracked batch finished.
    pub fn batch_item_done(&self, repository: &str) {
        self.completed.fetch_add(1, Ordering::SeqCst);
        self.notify(Some(repository.to_string()), None);
    }

    pub fn end_batch(&self) {
        self.batch.store(false, Ordering::SeqCst);
    }

    fn in_batch(&self) -> bool {
        self.batch.load(Ordering::SeqCst)
    }

    /// Get current progress percentage.
    pub fn percentage(&self) -> f64 {
        let total = self.total.load(Ordering::SeqCst);
        if total == 0 {
            return 0.0;
        }
        let completed = self.completed.load(Ordering::SeqCst);
        (completed as f64 / total as f64) * 100.0
    }

    /// Get current phase.
    pub fn current_phase(&self) -> MigrationPhase {
        let index = self.phase.load(Ordering::SeqCst) as usize;
        MigrationPhase::ALL
            .get(index)
            .copied()
            .unwrap_or(MigrationPhase::Complete)
    }

    fn notify(&self, current_item: Option<String>, message: Option<String>) {
        if let Some(callback) = &self.callback {
            let update = ProgressUpdate {
                phase: self.current_phase(),
                current_item,
                completed: self.completed.load(Ordering::SeqCst),
                total: self.total.load(Ordering::SeqCst),
                message,
            };
            callback(update);
        }
    }
}

impl Default for MigrationProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Console progress reporter using indicatif.
pub struct ConsoleProgressReporter {
    progress_bar: indicatif::ProgressBar,
}

impl ConsoleProgressReporter {
    /// Create a new console progress reporter.
    pub fn new() -> Self {
        let progress_bar = indicatif::ProgressBar::new(0);

        if let Ok(style) = indicatif::ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            progress_bar.set_style(style.progress_chars("#>-"));
        }

        Self { progress_bar }
    }

    /// Create a progress callback for use with migration.
    pub fn callback(&self) -> ProgressCallback {
        let pb = self.progress_bar.clone();
        Box::new(move |update: ProgressUpdate| {
            pb.set_length(update.total);
            pb.set_position(update.completed);

            let mut msg = update.phase.to_string();
            if let Some(item) = &update.current_item {
                msg = format!("{msg}: {item}");
            }
            if let Some(message) = &update.message {
                msg = format!("{msg} - {message}");
            }
            pb.set_message(msg);
        })
    }

    /// Finish the progress bar.
    pub fn finish(&self, message: &str) {
        self.progress_bar.finish_with_message(message.to_string());
    }
}

impl Default for ConsoleProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_tracker() {
        let progress = MigrationProgress::new();

        progress.set_phase(MigrationPhase::ReplicatingIssues, 10);
        assert_eq!(progress.current_phase(), MigrationPhase::ReplicatingIssues);
        assert_eq!(progress.percentage(), 0.0);

        progress.increment(Some("Issue #1"));
        assert!((progress.percentage() - 10.0).abs() < 0.01);

        for _ in 0..9 {
            progress.increment(None);
        }
        assert!((progress.percentage() - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_phase_round_trips_through_index() {
        let progress = MigrationProgress::new();
        for phase in MigrationPhase::ALL {
            progress.set_phase(phase, 1);
            assert_eq!(progress.current_phase(), phase);
        }
    }

    #[test]
    fn test_batch_ignores_per_repository_updates() {
        let progress = MigrationProgress::new();

        progress.begin_batch(4);
        progress.set_phase(MigrationPhase::SyncingLabels, 7);
        progress.increment(Some("bug"));
        assert_eq!(progress.current_phase(), MigrationPhase::RunningBatch);
        assert_eq!(progress.percentage(), 0.0);

        progress.batch_item_done("alpha");
        assert!((progress.percentage() - 25.0).abs() < 0.01);

        progress.end_batch();
        progress.set_phase(MigrationPhase::Complete, 1);
        assert_eq!(progress.current_phase(), MigrationPhase::Complete);
    }

    #[test]
    fn test_progress_with_callback() {
        use std::sync::atomic::AtomicUsize;
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let progress = MigrationProgress::with_callback(Box::new(move |_| {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        }));

        progress.set_phase(MigrationPhase::SyncingLabels, 5);
        progress.increment(None);
        progress.increment(None);

        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }
}
