//! CLI argument definitions using clap

use clap::{Parser, ValueEnum};
use claude_eval_core::{DEFAULT_CONCURRENCY, ProgressLevel};

#[derive(Parser)]
#[command(name = "claude-eval")]
#[command(about = "Evaluation runner for AI agent responses using LLM-as-a-judge scoring")]
#[command(
    long_about = "Evaluation runner for AI agent responses using LLM-as-a-judge scoring\n\n\
USAGE:\n\
  claude-eval eval.yaml                 # Run one evaluation\n\
  claude-eval 'evals/*.yaml'            # Run a batch with coordinated progress\n\
  claude-eval --concurrency 3 a.yaml b.yaml c.yaml\n\
  claude-eval --format json eval.yaml   # Machine-readable output\n\n\
Exits 0 when every evaluation passes, 1 otherwise."
)]
#[command(version)]
pub struct Cli {
    /// YAML evaluation files or glob patterns
    #[arg(required = true)]
    pub files: Vec<String>,

    /// Number of concurrent evaluations
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Output format
    #[arg(long, value_enum, default_value = "console")]
    pub format: OutputFormat,

    /// Show detailed progress including partial responses
    #[arg(long, short)]
    pub verbose: bool,

    /// Suppress progress output
    #[arg(long, short, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Console,
    Json,
}

impl Cli {
    pub fn progress_level(&self) -> ProgressLevel {
        if self.quiet {
            ProgressLevel::Quiet
        } else if self.verbose {
            ProgressLevel::Verbose
        } else {
            ProgressLevel::Normal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_progress_level_mapping() {
        let cli = Cli::parse_from(["claude-eval", "a.yaml"]);
        assert_eq!(cli.progress_level(), ProgressLevel::Normal);
        assert_eq!(cli.concurrency, DEFAULT_CONCURRENCY);

        let cli = Cli::parse_from(["claude-eval", "--quiet", "a.yaml"]);
        assert_eq!(cli.progress_level(), ProgressLevel::Quiet);

        let cli = Cli::parse_from(["claude-eval", "--verbose", "a.yaml"]);
        assert_eq!(cli.progress_level(), ProgressLevel::Verbose);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let parsed = Cli::try_parse_from(["claude-eval", "--quiet", "--verbose", "a.yaml"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_format_values() {
        let cli = Cli::parse_from(["claude-eval", "--format", "json", "a.yaml"]);
        assert_eq!(cli.format, OutputFormat::Json);
    }
}
