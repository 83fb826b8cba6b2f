//! Buffered sink for concurrent batch runs

use colored::Colorize;
use parking_lot::Mutex;
use std::time::{Duration, Instant};

use super::format::{self, StepStatus};
use super::{OutputBuffer, ProgressLevel, ProgressSink};
use crate::result::EvaluationResult;

/// Appends formatted progress lines to a private [`OutputBuffer`] and never
/// touches the terminal itself.
///
/// One instance is owned by exactly one task; the coordinator flushes the
/// buffer atomically once the task settles.
pub struct BufferedSink {
    level: ProgressLevel,
    /// 1-based position for "running evaluation i of N" headers
    index: usize,
    total: usize,
    buffer: Mutex<OutputBuffer>,
    filename: Mutex<String>,
    started_at: Mutex<Option<Instant>>,
}

impl BufferedSink {
    pub fn new(level: ProgressLevel, index: usize, total: usize) -> Self {
        Self {
            level,
            index,
            total,
            buffer: Mutex::new(OutputBuffer::new()),
            filename: Mutex::new(String::new()),
            started_at: Mutex::new(None),
        }
    }

    fn emit(&self, line: String) {
        self.buffer.lock().push(line);
    }

    fn quiet(&self) -> bool {
        self.level == ProgressLevel::Quiet
    }

    fn verbose(&self) -> bool {
        self.level == ProgressLevel::Verbose
    }

    /// Filename recorded by `start_evaluation`, for the end-of-batch summary
    pub fn filename(&self) -> String {
        self.filename.lock().clone()
    }

    /// Render the buffered block, or `None` when nothing was recorded
    pub fn render(&self) -> Option<String> {
        let buffer = self.buffer.lock();
        if buffer.is_empty() {
            None
        } else {
            Some(buffer.to_string())
        }
    }

    #[cfg(test)]
    pub(crate) fn line_count(&self) -> usize {
        self.buffer.lock().len()
    }
}

impl ProgressSink for BufferedSink {
    fn start_evaluation(&self, filename: &str) {
        if self.quiet() {
            return;
        }
        *self.filename.lock() = filename.to_string();
        *self.started_at.lock() = Some(Instant::now());

        let header = if self.total > 1 {
            format!(
                "Running evaluation {} of {}: {filename}",
                self.index, self.total
            )
        } else {
            format!("Evaluating: {filename}")
        };
        self.emit(format::format_section_header(&header));
    }

    fn step_started(&self, step: &str) {
        if self.quiet() {
            return;
        }
        self.emit(format::format_step(step, StepStatus::Progress, None));
    }

    fn step_completed(&self, step: &str, duration: Option<Duration>) {
        if self.quiet() {
            return;
        }
        self.emit(format::format_step(step, StepStatus::Success, duration));
    }

    fn evaluation_step_completed(
        &self,
        step: &str,
        result: &EvaluationResult,
        duration: Option<Duration>,
    ) {
        if self.quiet() {
            return;
        }
        self.emit(format::format_step(step, StepStatus::Success, duration));
        for criterion in &result.criteria {
            let icon = if criterion.passed {
                "✓".green()
            } else {
                "✗".red()
            };
            let reason = if criterion.reason.is_empty() {
                String::new()
            } else {
                format!(": {}", criterion.reason)
            };
            self.emit(format!("    {icon} {}{reason}", criterion.criterion));
        }
    }

    fn step_failed(&self, step: &str, error: Option<&str>) {
        if self.quiet() {
            return;
        }
        let text = match error {
            Some(error) => format!("{step} failed: {error}"),
            None => format!("{step} failed"),
        };
        self.emit(format::format_step(&text, StepStatus::Error, None));
    }

    fn partial_response(&self, response: &str, max_len: usize) {
        if !self.verbose() {
            return;
        }
        self.emit(format::format_partial(response, max_len));
    }

    fn evaluation_completed(
        &self,
        _filename: &str,
        result: &EvaluationResult,
        total_duration: Option<Duration>,
    ) {
        if self.quiet() {
            return;
        }
        let duration = total_duration.or_else(|| (*self.started_at.lock()).map(|s| s.elapsed()));
        let status = if result.overall { "PASSED" } else { "FAILED" };
        let step_status = if result.overall {
            StepStatus::Success
        } else {
            StepStatus::Error
        };
        self.emit(format::format_step(status, step_status, duration));
        self.buffer.lock().push_empty();
    }

    fn error(&self, message: &str) {
        if self.quiet() {
            return;
        }
        let mut lines = message.lines();
        if let Some(first) = lines.next() {
            self.emit(format!("{}", format!("❌ Error: {first}").red()));
            for line in lines.filter(|l| !l.trim().is_empty()) {
                self.emit(format!("{}", format!("   {line}").red()));
            }
        }
    }

    fn info(&self, message: &str) {
        if self.quiet() {
            return;
        }
        self.emit(format!("{}", format!("ℹ️  {message}").blue()));
    }

    fn debug(&self, message: &str) {
        if !self.verbose() {
            return;
        }
        self.emit(format::format_debug(message));
    }

    fn log_prompt(&self, prompt: &str) {
        if !self.verbose() {
            return;
        }
        let header = format!("{}", "📝 Prompt sent to Claude:".blue());
        for line in format::format_content_log(header, prompt) {
            self.emit(line);
        }
    }

    fn log_response(&self, response: &str) {
        if !self.verbose() {
            return;
        }
        let header = format!("{}", "📄 Response received:".green());
        for line in format::format_content_log(header, response) {
            self.emit(line);
        }
    }

    fn log_judge_prompt(&self, prompt: &str) {
        if !self.verbose() {
            return;
        }
        let header = format!("{}", "⚖️  Judge evaluation prompt:".yellow());
        for line in format::format_content_log(header, prompt) {
            self.emit(line);
        }
    }

    fn log_judge_response(&self, response: &str) {
        if !self.verbose() {
            return;
        }
        let header = format!("{}", "🔍 Judge response:".cyan());
        for line in format::format_content_log(header, response) {
            self.emit(line);
        }
    }
}
