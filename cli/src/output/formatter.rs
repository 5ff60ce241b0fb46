//! Formatter for tool events
//!
//! Every tool renders the same way: a colored status dot with the tool name
//! and its formatted input, followed by an indented result line.

use colored::Colorize;
use concierge_core::stream::ToolInfo;

/// Longest result shown before truncating
const MAX_RESULT_CHARS: usize = 200;

/// Status of tool execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStatus {
    Success,
    Error,
}

/// Unified formatter for tool output
#[derive(Debug, Default)]
pub struct EventFormatter;

impl EventFormatter {
    pub fn new() -> Self {
        Self
    }

    /// Format tool execution status with colored dot
    pub fn format_tool_status(&self, tool_name: &str, input: &str, status: ToolStatus) -> String {
        let dot = match status {
            ToolStatus::Success => "⏺".green(),
            ToolStatus::Error => "⏺".red(),
        };

        format!("{} {}({})", dot, tool_name.bold(), single_line(input))
    }

    /// Status line plus the indented result
    pub fn format_tool_result(
        &self,
        tool_name: &str,
        input: &str,
        content: &str,
        success: bool,
    ) -> String {
        let status = if success {
            ToolStatus::Success
        } else {
            ToolStatus::Error
        };
        let status_line = self.format_tool_status(tool_name, input, status);

        if content.trim().is_empty() {
            return status_line;
        }

        format!("{}\n  ⎿  {}", status_line, truncate(&single_line(content), MAX_RESULT_CHARS))
    }

    /// Render a tool event from a replayed turn
    pub fn format_tool_event(&self, info: &ToolInfo) -> String {
        let success = !is_error_output(&info.output_data);
        self.format_tool_result(&info.tool_name, &info.input_data, &info.output_data, success)
    }
}

/// Collapse pretty-printed text onto one line
fn single_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cut at a character boundary, appending `...` when shortened
fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Whether a tool's output is the `{"error": ...}` wire shape
fn is_error_output(output: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(output)
        .ok()
        .and_then(|value| value.as_object().map(|object| object.contains_key("error")))
        .unwrap_or(false)
}
