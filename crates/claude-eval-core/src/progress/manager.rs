//! Terminal coordination across concurrently-running tasks

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;

use super::format;
use super::{BufferedSink, ProgressLevel};

/// Serializes access to the one physical terminal while a batch runs.
///
/// Tasks report into their own [`BufferedSink`]; this manager owns the live
/// spinner and is the only component that writes to stdout while more than
/// one task is active. On each completion the finished task's buffer is
/// flushed as a single block, so blocks from different tasks never
/// interleave.
pub struct TerminalProgressManager {
    level: ProgressLevel,
    spinner: Mutex<Option<ProgressBar>>,
    state: Mutex<BatchState>,
}

#[derive(Default)]
struct BatchState {
    total: usize,
    concurrency: usize,
    completed: usize,
    started_at: Option<Instant>,
    /// Keyed by 0-based dispatch index
    entries: HashMap<usize, TaskEntry>,
    /// Dispatch indexes in the order tasks finished
    completion_order: Vec<usize>,
}

struct TaskEntry {
    sink: Arc<BufferedSink>,
    success: Option<bool>,
}

impl TerminalProgressManager {
    pub fn new(level: ProgressLevel) -> Self {
        Self {
            level,
            spinner: Mutex::new(None),
            state: Mutex::new(BatchState::default()),
        }
    }

    pub fn level(&self) -> ProgressLevel {
        self.level
    }

    /// Begin a batch: reset counters and show the live indicator.
    pub fn start_batch(&self, total: usize, concurrency: usize) {
        *self.state.lock() = BatchState {
            total,
            concurrency,
            completed: 0,
            started_at: Some(Instant::now()),
            entries: HashMap::new(),
            completion_order: Vec::new(),
        };

        if self.level == ProgressLevel::Quiet {
            return;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.blue} {msg}")
                .expect("Invalid progress template"),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(running_message(concurrency, total));
        *self.spinner.lock() = Some(pb);
    }

    /// Construct the dedicated sink for one task. `index` is the 0-based
    /// dispatch index; progress text shows the 1-based position.
    pub fn create_buffered_sink(&self, index: usize) -> Arc<BufferedSink> {
        let mut state = self.state.lock();
        let sink = Arc::new(BufferedSink::new(self.level, index + 1, state.total));
        state.entries.insert(
            index,
            TaskEntry {
                sink: Arc::clone(&sink),
                success: None,
            },
        );
        sink
    }

    /// Record a task completion: flush its buffered output as one atomic
    /// block, refresh the indicator from completion-derived state, and end
    /// the batch after the last completion.
    pub fn mark_completed(&self, index: usize, success: bool) {
        let mut state = self.state.lock();
        {
            let Some(entry) = state.entries.get_mut(&index) else {
                return;
            };
            if entry.success.is_some() {
                // A buffer is flushed at most once.
                return;
            }
            entry.success = Some(success);
        }
        state.completed += 1;
        state.completion_order.push(index);

        let remaining = state.total - state.completed;
        let block = state.entries.get(&index).and_then(|e| e.sink.render());

        if self.level != ProgressLevel::Quiet {
            let spinner = self.spinner.lock();
            match spinner.as_ref() {
                Some(pb) => {
                    pb.set_message(running_message(state.concurrency, remaining));
                    if let Some(block) = &block {
                        pb.suspend(|| println!("{block}"));
                    }
                }
                None => {
                    if let Some(block) = &block {
                        println!("{block}");
                    }
                }
            }
        }

        if remaining == 0 {
            self.complete_batch(&state);
        }
    }

    fn complete_batch(&self, state: &BatchState) {
        if self.level == ProgressLevel::Quiet {
            return;
        }

        if let Some(pb) = self.spinner.lock().take() {
            pb.finish_and_clear();
        }

        let duration = state
            .started_at
            .map(|s| s.elapsed())
            .unwrap_or_default();
        let passed = state
            .entries
            .values()
            .filter(|e| e.success == Some(true))
            .count();
        println!(
            "{}",
            format::format_batch_summary(passed, state.total, duration)
        );

        if state.total > 1 {
            println!("\n📊 Results summary:");
            for index in &state.completion_order {
                if let Some(entry) = state.entries.get(index) {
                    let filename = entry.sink.filename();
                    if entry.success == Some(true) {
                        println!("{}", format::format_success(&filename));
                    } else {
                        println!("{}", format::format_error(&filename));
                    }
                }
            }
            println!();
        }
    }

    /// Out-of-band error narration; suspends the spinner around the write.
    pub fn error(&self, message: &str) {
        if self.level == ProgressLevel::Quiet {
            return;
        }
        let line = format::format_error(message);
        match self.spinner.lock().as_ref() {
            Some(pb) => pb.suspend(|| eprintln!("{line}")),
            None => eprintln!("{line}"),
        }
    }

    /// Out-of-band informational narration.
    pub fn info(&self, message: &str) {
        if self.level == ProgressLevel::Quiet {
            return;
        }
        let line = format!("ℹ️  {message}");
        match self.spinner.lock().as_ref() {
            Some(pb) => pb.suspend(|| println!("{line}")),
            None => println!("{line}"),
        }
    }

    /// Verbose-only diagnostics.
    pub fn debug(&self, message: &str) {
        if self.level != ProgressLevel::Verbose {
            return;
        }
        let line = format::format_debug(message);
        match self.spinner.lock().as_ref() {
            Some(pb) => pb.suspend(|| println!("{line}")),
            None => println!("{line}"),
        }
    }

    /// Number of tasks that have settled so far
    pub fn completed_count(&self) -> usize {
        self.state.lock().completed
    }

    /// Number of settled tasks whose result passed
    pub fn passed_count(&self) -> usize {
        self.state
            .lock()
            .entries
            .values()
            .filter(|e| e.success == Some(true))
            .count()
    }

    /// Dispatch indexes in the order tasks finished
    pub fn completion_order(&self) -> Vec<usize> {
        self.state.lock().completion_order.clone()
    }
}

/// Indicator text derived from completions only: the number of tasks that
/// can actually be running right now.
fn running_message(concurrency: usize, remaining: usize) -> String {
    let running = concurrency.min(remaining);
    format!(
        "Running {running} evaluation{}",
        if running == 1 { "" } else { "s" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ProgressSink;

    #[test]
    fn test_running_message_pluralization() {
        assert_eq!(running_message(5, 10), "Running 5 evaluations");
        assert_eq!(running_message(5, 1), "Running 1 evaluation");
        assert_eq!(running_message(2, 0), "Running 0 evaluations");
    }

    #[test]
    fn test_completion_bookkeeping() {
        let manager = TerminalProgressManager::new(ProgressLevel::Quiet);
        manager.start_batch(3, 2);

        let s0 = manager.create_buffered_sink(0);
        let s1 = manager.create_buffered_sink(1);
        let s2 = manager.create_buffered_sink(2);
        s0.start_evaluation("a.yaml");
        s1.start_evaluation("b.yaml");
        s2.start_evaluation("c.yaml");

        // Completion order differs from dispatch order.
        manager.mark_completed(2, true);
        manager.mark_completed(0, false);
        manager.mark_completed(1, true);

        assert_eq!(manager.completed_count(), 3);
        assert_eq!(manager.passed_count(), 2);
        assert_eq!(manager.completion_order(), vec![2, 0, 1]);
    }

    #[test]
    fn test_double_completion_is_ignored() {
        let manager = TerminalProgressManager::new(ProgressLevel::Quiet);
        manager.start_batch(2, 2);
        manager.create_buffered_sink(0);
        manager.create_buffered_sink(1);

        manager.mark_completed(0, true);
        manager.mark_completed(0, false);
        assert_eq!(manager.completed_count(), 1);
        assert_eq!(manager.passed_count(), 1);
    }

    #[test]
    fn test_unknown_index_is_ignored() {
        let manager = TerminalProgressManager::new(ProgressLevel::Quiet);
        manager.start_batch(1, 1);
        manager.mark_completed(7, true);
        assert_eq!(manager.completed_count(), 0);
    }

    #[test]
    fn test_quiet_batch_never_creates_a_spinner() {
        let manager = TerminalProgressManager::new(ProgressLevel::Quiet);
        manager.start_batch(2, 2);
        assert!(manager.spinner.lock().is_none());
    }
}
