//! Result rendering for the CLI surface

use claude_eval_core::{BatchResult, EvaluationResult};
use colored::Colorize;

/// Per-criterion console breakdown for a single evaluation
pub fn format_console(result: &EvaluationResult) -> String {
    let mut lines = Vec::new();
    for criterion in &result.criteria {
        let icon = if criterion.passed {
            "✅".green()
        } else {
            "❌".red()
        };
        lines.push(format!("{icon} {}", criterion.criterion));
        if !criterion.reason.is_empty() {
            lines.push(format!("   {}", criterion.reason));
        }
    }

    let summary = format!("{}/{} passed", result.passed_count(), result.criteria.len());
    lines.push(String::new());
    if result.overall {
        lines.push(format!("{}", format!("✅ PASSED ({summary})").green()));
    } else {
        lines.push(format!("{}", format!("❌ FAILED ({summary})").red()));
    }
    lines.join("\n")
}

/// Pretty-printed JSON for a single evaluation
pub fn format_json(result: &EvaluationResult) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

/// Minimal per-file batch summary, used when progress narration was quiet
pub fn format_batch_results(results: &[BatchResult]) -> String {
    let mut lines = Vec::new();
    for batch in results {
        let icon = if batch.result.overall {
            "✅".green()
        } else {
            "❌".red()
        };
        lines.push(format!("{icon} {}", batch.file.display()));
    }

    let passed = results.iter().filter(|b| b.result.overall).count();
    lines.push(String::new());
    lines.push(format!("{passed}/{} evaluations passed", results.len()));
    lines.join("\n")
}
