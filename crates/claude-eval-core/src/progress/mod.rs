//! Progress reporting: levels, the sink contract, and its implementations
//!
//! A task never writes to the terminal directly. It reports through a
//! [`ProgressSink`]: direct (straight to stdout, single-task runs) or
//! buffered (private [`OutputBuffer`], flushed atomically by the
//! [`TerminalProgressManager`] when the task finishes).

mod buffer;
mod buffered;
mod direct;
pub(crate) mod format;
mod manager;

pub use buffer::OutputBuffer;
pub use buffered::BufferedSink;
pub use direct::DirectSink;
pub use format::truncate_content;
pub use manager::TerminalProgressManager;

use std::time::Duration;

use crate::result::EvaluationResult;

/// How much progress narration a run emits.
///
/// Set once at process start and read by every sink; silence never affects
/// the results returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressLevel {
    /// No narration at all
    Quiet,
    /// Lifecycle events only
    #[default]
    Normal,
    /// Everything, including partial responses and prompt/response logs
    Verbose,
}

/// Capability set a task uses to report its own lifecycle.
///
/// Implementations gate themselves on the configured [`ProgressLevel`] and
/// must be shareable across await points, so every method takes `&self`.
pub trait ProgressSink: Send + Sync {
    /// Announce that an evaluation is starting for `filename`
    fn start_evaluation(&self, filename: &str);

    /// A step began
    fn step_started(&self, step: &str);

    /// A step finished successfully
    fn step_completed(&self, step: &str, duration: Option<Duration>);

    /// A step finished and produced per-criterion verdicts worth showing
    fn evaluation_step_completed(
        &self,
        step: &str,
        result: &EvaluationResult,
        duration: Option<Duration>,
    );

    /// A step failed
    fn step_failed(&self, step: &str, error: Option<&str>);

    /// Streamed response so far; `response` is the full accumulated text,
    /// re-truncated and re-displayed from scratch on every call
    fn partial_response(&self, response: &str, max_len: usize);

    /// The whole evaluation settled
    fn evaluation_completed(
        &self,
        filename: &str,
        result: &EvaluationResult,
        total_duration: Option<Duration>,
    );

    /// Free-form error narration
    fn error(&self, message: &str);

    /// Free-form informational narration
    fn info(&self, message: &str);

    /// Verbose-only diagnostics
    fn debug(&self, message: &str);

    /// Verbose-only dump of the prompt sent to the model
    fn log_prompt(&self, prompt: &str);

    /// Verbose-only dump of the model response
    fn log_response(&self, response: &str);

    /// Verbose-only dump of the judge prompt
    fn log_judge_prompt(&self, prompt: &str);

    /// Verbose-only dump of the judge response
    fn log_judge_response(&self, response: &str);
}

/// Sink that drops every event; used in tests and silent embeddings
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn start_evaluation(&self, _filename: &str) {}
    fn step_started(&self, _step: &str) {}
    fn step_completed(&self, _step: &str, _duration: Option<Duration>) {}
    fn evaluation_step_completed(
        &self,
        _step: &str,
        _result: &EvaluationResult,
        _duration: Option<Duration>,
    ) {
    }
    fn step_failed(&self, _step: &str, _error: Option<&str>) {}
    fn partial_response(&self, _response: &str, _max_len: usize) {}
    fn evaluation_completed(
        &self,
        _filename: &str,
        _result: &EvaluationResult,
        _total_duration: Option<Duration>,
    ) {
    }
    fn error(&self, _message: &str) {}
    fn info(&self, _message: &str) {}
    fn debug(&self, _message: &str) {}
    fn log_prompt(&self, _prompt: &str) {}
    fn log_response(&self, _response: &str) {}
    fn log_judge_prompt(&self, _prompt: &str) {}
    fn log_judge_response(&self, _response: &str) {}
}
