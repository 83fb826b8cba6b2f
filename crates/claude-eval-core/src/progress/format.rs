//! Line formatting shared by the direct and buffered sinks

use colored::Colorize;
use std::time::Duration;

/// Rendering status for a step line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StepStatus {
    Progress,
    Success,
    Error,
}

/// Character budget for prompt/response dumps in verbose mode
pub(crate) const CONTENT_LOG_LIMIT: usize = 500;

pub(crate) fn format_duration_suffix(duration: Option<Duration>) -> String {
    match duration {
        Some(d) => format!(" {}", format!("({:.1}s)", d.as_secs_f64()).dimmed()),
        None => String::new(),
    }
}

pub(crate) fn format_section_header(text: &str) -> String {
    format!("\n{}", format!("📋 {text}").yellow())
}

pub(crate) fn format_step(text: &str, status: StepStatus, duration: Option<Duration>) -> String {
    let suffix = format_duration_suffix(duration);
    match status {
        StepStatus::Progress => format!("  {} {text}...", "⏳".yellow()),
        StepStatus::Success => format!("  {} {text}{suffix}", "✓".green()),
        StepStatus::Error => format!("  {} {text}{suffix}", "❌".red()),
    }
}

pub(crate) fn format_success(text: &str) -> String {
    format!("{} {text}", "✅".green())
}

pub(crate) fn format_error(text: &str) -> String {
    format!("{} {text}", "❌".red())
}

pub(crate) fn format_debug(text: &str) -> String {
    format!("{}", format!("🔍 {text}").dimmed())
}

/// Single-line preview of a streaming response: hard-truncated, newlines
/// flattened. Called with the full accumulated text on every update.
pub(crate) fn format_partial(response: &str, max_len: usize) -> String {
    let truncated = if response.chars().count() > max_len {
        let cut: String = response.chars().take(max_len).collect();
        format!("{cut}...")
    } else {
        response.to_string()
    };
    format!("{}", format!("    → {}", truncated.replace('\n', " ")).dimmed())
}

pub(crate) fn format_batch_summary(passed: usize, total: usize, duration: Duration) -> String {
    let duration_text = format!("({:.1}s total)", duration.as_secs_f64()).dimmed();
    let summary = format!("{passed}/{total} evaluations passed");
    if passed == total {
        format!(
            "{} {duration_text}",
            format!("🎉 All evaluations completed! {summary}").green()
        )
    } else {
        format!(
            "{} {duration_text}",
            format!("⚠️  Batch completed: {summary}").yellow()
        )
    }
}

/// Header plus truncated body for a verbose content dump; appends the
/// total-character marker whenever the body was cut.
pub(crate) fn format_content_log(header: String, content: &str) -> Vec<String> {
    let mut lines = vec![
        header,
        format!("{}", truncate_content(content, CONTENT_LOG_LIMIT).dimmed()),
    ];
    let total = content.chars().count();
    if total > CONTENT_LOG_LIMIT {
        lines.push(format!(
            "{}",
            format!("    ... ({total} total characters)").dimmed()
        ));
    }
    lines
}

/// Truncate to at most `max_len` characters, preferring to break at a
/// newline, then a sentence end, then a word boundary, before falling back
/// to a hard cut. Content is never dropped silently: truncated output always
/// carries the `...` suffix.
pub fn truncate_content(content: &str, max_len: usize) -> String {
    let chars: Vec<char> = content.chars().collect();
    if chars.len() <= max_len {
        return content.to_string();
    }

    let window = &chars[..max_len];
    let last_newline = window.iter().rposition(|&c| c == '\n');
    let last_sentence = window.iter().rposition(|&c| matches!(c, '.' | '!' | '?'));
    let last_space = window.iter().rposition(|&c| c == ' ');

    // Candidates in the early part of the window are ignored; a break there
    // would drop most of the preview.
    let mut break_point = max_len;
    if let Some(pos) = last_newline.filter(|&p| p as f64 > max_len as f64 * 0.7) {
        break_point = pos;
    } else if let Some(pos) = last_sentence.filter(|&p| p as f64 > max_len as f64 * 0.7) {
        break_point = pos + 1;
    } else if let Some(pos) = last_space.filter(|&p| p as f64 > max_len as f64 * 0.8) {
        break_point = pos;
    }

    let mut out: String = chars[..break_point].iter().collect();
    out.push_str("...");
    out
}
