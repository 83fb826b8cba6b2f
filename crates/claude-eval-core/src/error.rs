//! Error types for the evaluation engine

use thiserror::Error;

/// Result type alias for evaluation operations
pub type EvalResult<T> = Result<T, EvalError>;

/// Error taxonomy for evaluation runs.
///
/// Every task-level kind is caught at the task boundary and folded into a
/// failing [`EvaluationResult`](crate::result::EvaluationResult); only
/// [`EvalError::InvalidInput`] may escape a batch run.
#[derive(Error, Debug, Clone)]
pub enum EvalError {
    /// Malformed or missing eval spec fields, raised before any model call
    #[error("{0}")]
    Spec(String),

    /// The model binary could not be found or launched
    #[error("{0}")]
    Transport(String),

    /// The model process ran but exited non-zero or reported an error result
    #[error("{message}")]
    Process {
        message: String,
        exit_code: Option<i32>,
        stderr: Option<String>,
        stdout: Option<String>,
    },

    /// The model call exceeded its deadline
    #[error("Timeout after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// The judging call itself failed, independent of the primary call
    #[error("Judge evaluation failed: {0}")]
    Judge(String),

    /// Invalid caller input, e.g. an empty batch
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO errors outside spec loading
    #[error("IO error: {0}")]
    Io(String),
}

impl EvalError {
    /// Create a new spec error
    pub fn spec(message: impl Into<String>) -> Self {
        Self::Spec(message.into())
    }

    /// Create a new transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Create a new process error with no captured output
    pub fn process(message: impl Into<String>) -> Self {
        Self::Process {
            message: message.into(),
            exit_code: None,
            stderr: None,
            stdout: None,
        }
    }

    /// Process error for a non-zero exit, keeping the captured stderr
    pub fn process_exit(exit_code: Option<i32>, stderr: String) -> Self {
        let message = match exit_code {
            Some(code) => format!("model process exited with code {code}"),
            None => "model process was terminated by a signal".to_string(),
        };
        let stderr = stderr.trim().to_string();
        Self::Process {
            message,
            exit_code,
            stderr: (!stderr.is_empty()).then_some(stderr),
            stdout: None,
        }
    }

    /// Create a new timeout error
    pub const fn timeout(seconds: u64) -> Self {
        Self::Timeout { seconds }
    }

    /// Create a new judge error
    pub fn judge(message: impl Into<String>) -> Self {
        Self::Judge(message.into())
    }

    /// Create a new invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Full diagnostic rendering, adding exit code and captured output where
    /// available. Used for verbose narration; `Display` stays terse.
    pub fn details(&self) -> String {
        match self {
            Self::Process {
                message,
                exit_code,
                stderr,
                stdout,
            } => {
                let mut out = message.clone();
                if let Some(code) = exit_code {
                    out.push_str(&format!("\nexit code: {code}"));
                }
                if let Some(stderr) = stderr {
                    out.push_str(&format!("\nstderr: {}", excerpt(stderr)));
                }
                if let Some(stdout) = stdout {
                    out.push_str(&format!("\nstdout: {}", excerpt(stdout)));
                }
                out
            }
            other => other.to_string(),
        }
    }
}

impl From<std::io::Error> for EvalError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

/// First 500 characters of a captured output stream
fn excerpt(text: &str) -> String {
    const LIMIT: usize = 500;
    if text.chars().count() <= LIMIT {
        text.to_string()
    } else {
        let cut: String = text.chars().take(LIMIT).collect();
        format!("{cut}...")
    }
}
