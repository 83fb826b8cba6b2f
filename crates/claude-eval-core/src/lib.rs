//! Concurrent evaluation runner with LLM-as-a-judge scoring
//!
//! Evaluates YAML-defined prompts against a language model and judges each
//! response against its expected-behavior criteria, either serially or as a
//! bounded concurrent batch with coordinated terminal output.
//!
//! # Features
//!
//! - **Bounded scheduler**: semaphore-capped batch execution with per-task
//!   failure isolation and dispatch-ordered results
//! - **Buffered progress**: each concurrent task narrates into its own
//!   buffer, flushed atomically while a live spinner tracks the batch
//! - **LLM-as-a-judge**: a second model call scores responses against the
//!   spec's criteria
//! - **Replaceable transport**: the model call is a trait seam; the default
//!   implementation drives the Claude Code CLI
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use claude_eval_core::{BatchOptions, EvalRunner, ProgressLevel, TerminalProgressManager};
//!
//! let runner = EvalRunner::new();
//! let manager = Arc::new(TerminalProgressManager::new(ProgressLevel::Normal));
//! let results = runner.run_batch(files, BatchOptions::new(5, manager)).await?;
//! ```

pub mod client;
pub mod error;
pub mod judge;
pub mod model;
pub mod progress;
pub mod result;
pub mod runner;
pub mod spec;

// Re-exports for convenience
pub use client::{DEFAULT_TIMEOUT, ModelClient};
pub use error::{EvalError, EvalResult};
pub use judge::JudgeEvaluator;
pub use model::{
    ClaudeCodeService, JUDGE_MODEL, ModelEvent, ModelEventReceiver, ModelService, PRIMARY_MODEL,
    QueryOptions,
};
pub use progress::{
    BufferedSink, DirectSink, NoopSink, OutputBuffer, ProgressLevel, ProgressSink,
    TerminalProgressManager, truncate_content,
};
pub use result::{BatchResult, CriterionResult, EvaluationResult};
pub use runner::{BatchOptions, DEFAULT_CONCURRENCY, EvalRunner};
pub use spec::{EvalSpec, parse_eval_spec};
