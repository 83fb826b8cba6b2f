//! Direct-to-terminal sink for single-task runs

use colored::Colorize;
use parking_lot::Mutex;
use std::time::{Duration, Instant};

use super::format::{self, StepStatus};
use super::{ProgressLevel, ProgressSink};
use crate::result::EvaluationResult;

/// Writes progress lines straight to stdout.
///
/// Only used when exactly one task runs, so nothing else can interleave
/// with its output.
pub struct DirectSink {
    level: ProgressLevel,
    started_at: Mutex<Option<Instant>>,
}

impl DirectSink {
    pub fn new(level: ProgressLevel) -> Self {
        Self {
            level,
            started_at: Mutex::new(None),
        }
    }

    fn emit(&self, line: String) {
        println!("{line}");
    }

    fn quiet(&self) -> bool {
        self.level == ProgressLevel::Quiet
    }

    fn verbose(&self) -> bool {
        self.level == ProgressLevel::Verbose
    }
}

impl ProgressSink for DirectSink {
    fn start_evaluation(&self, filename: &str) {
        if self.quiet() {
            return;
        }
        *self.started_at.lock() = Some(Instant::now());
        self.emit(format!("{} {}", "📋 Evaluating:".yellow(), filename.cyan()));
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
            let label = if criterion.reason.is_empty() {
                &criterion.criterion
            } else {
                &criterion.reason
            };
            self.emit(format!("    {icon} {label}"));
        }
    }

    fn step_failed(&self, step: &str, error: Option<&str>) {
        if self.quiet() {
            return;
        }
        match error {
            Some(error) if error.contains('\n') => {
                self.emit(format!("  {} {step} failed:", "❌".red()));
                for line in error.lines().filter(|l| !l.trim().is_empty()) {
                    self.emit(format!("     {}", line.red()));
                }
            }
            Some(error) => self.emit(format!("  {} {step} failed: {}", "❌".red(), error.red())),
            None => self.emit(format!("  {} {step} failed", "❌".red())),
        }
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
        let icon = if result.overall {
            "✅".green()
        } else {
            "❌".red()
        };
        let status = if result.overall { "PASSED" } else { "FAILED" };
        self.emit(format!(
            "  {icon} {status}{}\n",
            format::format_duration_suffix(duration)
        ));
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
