//! Console output formatting for turns

use colored::Colorize;
use parley_domain::{Role, ToolRegistry, Turn};

/// Formats turns and tool listings for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format an assistant reply. Error turns are shown in red with their
    /// stage marker.
    pub fn format_reply(turn: &Turn) -> String {
        match &turn.error {
            Some(error) => format!(
                "{}\n{}",
                turn.content.red(),
                format!("[{}]", error).dimmed()
            ),
            None => turn.content.clone(),
        }
    }

    /// Marker printed after a streamed reply that did not complete normally
    pub fn format_stream_error(turn: &Turn) -> Option<String> {
        turn.error
            .as_ref()
            .map(|error| format!("{}", format!("[{}]", error).red()))
    }

    /// Format the registered tools, one per line
    pub fn format_tools(registry: &ToolRegistry) -> String {
        if registry.is_empty() {
            return format!("{}\n", "No tools registered.".yellow());
        }

        let mut output = Self::section_header("Tools");
        let width = registry.names().map(str::len).max().unwrap_or(0);
        for (name, description) in registry.describe_all() {
            let padded = format!("{:<width$}", name, width = width);
            output.push_str(&format!("  {}  {}\n", padded.green().bold(), description));
        }
        output
    }

    /// Format a conversation transcript
    pub fn format_history(turns: &[Turn]) -> String {
        if turns.is_empty() {
            return format!("{}\n", "No turns yet.".dimmed());
        }

        let mut output = Self::section_header("History");
        for turn in turns {
            let time = turn.timestamp.format("%H:%M:%S").to_string();
            let role = match turn.role {
                Role::User => "you".cyan().bold(),
                Role::Assistant if turn.is_error() => "assistant".red().bold(),
                Role::Assistant => "assistant".yellow().bold(),
                Role::System => "system".dimmed(),
            };
            output.push_str(&format!(
                "{} {}: {}\n",
                time.dimmed(),
                role,
                Self::indent_continuation(&turn.content, "    ")
            ));
        }
        output
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    /// Indent every line after the first
    fn indent_continuation(text: &str, indent: &str) -> String {
        text.lines()
            .enumerate()
            .map(|(i, line)| {
                if i == 0 {
                    line.to_string()
                } else {
                    format!("{}{}", indent, line)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
