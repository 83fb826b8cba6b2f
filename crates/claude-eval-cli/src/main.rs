//! claude-eval CLI entry point
//!
//! Expands the file arguments, picks the execution path (single evaluation
//! with direct output, or a coordinated batch), and maps results to the exit
//! code: 0 only when every evaluation passed.

mod args;
mod report;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use claude_eval_core::{
    BatchOptions, DirectSink, EvalRunner, ProgressLevel, TerminalProgressManager,
};
use tracing_subscriber::EnvFilter;

use args::{Cli, OutputFormat};

#[tokio::main]
async fn main() {
    // Set RUST_LOG=debug for internal diagnostics; user-facing progress goes
    // through the sinks, not the log.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            1
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let level = cli.progress_level();
    let files = expand_patterns(&cli.files)?;

    if files.is_empty() {
        eprintln!("No evaluation files found");
        return Ok(1);
    }

    let runner = EvalRunner::new();

    if files.len() == 1 {
        let sink = DirectSink::new(level);
        let result = match runner.run_single(&files[0], &sink).await {
            Ok(result) => result,
            Err(e) => {
                eprintln!("Error: {e}");
                if cli.verbose {
                    eprintln!("{}", e.details());
                }
                return Ok(1);
            }
        };

        match cli.format {
            OutputFormat::Json => println!("{}", report::format_json(&result)?),
            OutputFormat::Console => println!("{}", report::format_console(&result)),
        }
        return Ok(if result.overall { 0 } else { 1 });
    }

    let manager = Arc::new(TerminalProgressManager::new(level));
    let results = runner
        .run_batch(files, BatchOptions::new(cli.concurrency, manager))
        .await?;

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
        OutputFormat::Console => {
            // The progress manager already narrated the batch; quiet mode
            // still gets a minimal summary assembled from the results.
            if level == ProgressLevel::Quiet {
                println!("{}", report::format_batch_results(&results));
            }
        }
    }

    let any_failed = results.iter().any(|r| !r.result.overall);
    Ok(if any_failed { 1 } else { 0 })
}

/// Expand glob patterns among the file arguments; plain paths pass through
/// untouched.
fn expand_patterns(patterns: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        if pattern.contains(|c: char| matches!(c, '*' | '?' | '[')) {
            let matches = glob::glob(pattern)
                .with_context(|| format!("invalid glob pattern: {pattern}"))?;
            for entry in matches {
                files.push(entry.with_context(|| format!("failed to expand pattern: {pattern}"))?);
            }
        } else {
            files.push(PathBuf::from(pattern));
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_paths_pass_through() {
        let files = expand_patterns(&["a.yaml".to_string(), "dir/b.yaml".to_string()]).unwrap();
        assert_eq!(files, vec![PathBuf::from("a.yaml"), PathBuf::from("dir/b.yaml")]);
    }

    #[test]
    fn test_glob_expansion() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("one.yaml"), "x").unwrap();
        std::fs::write(dir.path().join("two.yaml"), "x").unwrap();
        std::fs::write(dir.path().join("other.txt"), "x").unwrap();

        let pattern = format!("{}/*.yaml", dir.path().display());
        let mut files = expand_patterns(&[pattern]).unwrap();
        files.sort();
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("one.yaml"));
        assert!(files[1].ends_with("two.yaml"));
    }

    #[test]
    fn test_unmatched_glob_yields_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = format!("{}/*.yaml", dir.path().display());
        let files = expand_patterns(&[pattern]).unwrap();
        assert!(files.is_empty());
    }
}
