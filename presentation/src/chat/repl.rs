//! REPL (Read-Eval-Print Loop) for interactive chat

use crate::ConsoleFormatter;
use crate::ProgressReporter;
use colored::Colorize;
use parley_application::{Orchestrator, OrchestratorError};
use parley_domain::Turn;
use reedline::{DefaultPrompt, DefaultPromptSegment, FileBackedHistory, Reedline, Signal};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

const HISTORY_CAPACITY: usize = 1000;

/// Interactive chat REPL
pub struct ChatRepl {
    orchestrator: Arc<Orchestrator>,
    conversation_id: String,
    progress: Option<Arc<ProgressReporter>>,
    stream: bool,
    history_path: Option<PathBuf>,
}

impl ChatRepl {
    /// Create a new ChatRepl for one conversation
    pub fn new(orchestrator: Arc<Orchestrator>, conversation_id: impl Into<String>) -> Self {
        Self {
            orchestrator,
            conversation_id: conversation_id.into(),
            progress: None,
            stream: true,
            history_path: None,
        }
    }

    /// Spinner shared with the orchestrator; cleared before a reply prints
    pub fn with_progress(mut self, progress: Arc<ProgressReporter>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Set whether replies are printed fragment by fragment
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Set the line-editor history file
    pub fn with_history_file(mut self, path: Option<PathBuf>) -> Self {
        self.history_path = path;
        self
    }

    /// Run the interactive REPL
    pub async fn run(&self) -> io::Result<()> {
        let mut editor = Reedline::create();

        if let Some(path) = &self.history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            match FileBackedHistory::with_file(HISTORY_CAPACITY, path.clone()) {
                Ok(history) => editor = editor.with_history(Box::new(history)),
                Err(e) => warn!("Could not open history file {}: {}", path.display(), e),
            }
        }

        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic(self.conversation_id.clone()),
            DefaultPromptSegment::Empty,
        );

        self.print_welcome();

        loop {
            match editor.read_line(&prompt)? {
                Signal::Success(line) => {
                    let line = line.trim();

                    if line.is_empty() {
                        continue;
                    }

                    if line.starts_with('/') {
                        if self.handle_command(line).await {
                            break;
                        }
                        continue;
                    }

                    println!();
                    if let Err(e) = self.send(line).await {
                        eprintln!("{} {}", "Error:".red().bold(), e);
                    }
                    println!();
                }
                Signal::CtrlC => {
                    println!("^C");
                    continue;
                }
                Signal::CtrlD => {
                    println!("Bye!");
                    break;
                }
            }
        }

        self.orchestrator.release(&self.conversation_id).await;
        Ok(())
    }

    /// Send one message and print the reply.
    ///
    /// A routing failure is returned as an error and nothing is printed.
    /// Every other outcome, including tool failures, is an assistant turn.
    pub async fn send(&self, text: &str) -> Result<Turn, OrchestratorError> {
        let result = if self.stream {
            self.send_streaming(text).await
        } else {
            self.send_whole(text).await
        };
        self.clear_progress();
        result
    }

    async fn send_whole(&self, text: &str) -> Result<Turn, OrchestratorError> {
        let turn = self.orchestrator.process(&self.conversation_id, text).await?;
        self.clear_progress();
        println!("{}", ConsoleFormatter::format_reply(&turn));
        Ok(turn)
    }

    async fn send_streaming(&self, text: &str) -> Result<Turn, OrchestratorError> {
        let mut stream = self
            .orchestrator
            .process_stream(&self.conversation_id, text)
            .await?;
        self.clear_progress();

        let mut stdout = io::stdout();
        let mut cancelled = false;
        loop {
            tokio::select! {
                fragment = stream.next_fragment() => match fragment {
                    Some(fragment) => {
                        print!("{}", fragment);
                        let _ = stdout.flush();
                    }
                    None => break,
                },
                _ = tokio::signal::ctrl_c(), if !cancelled => {
                    stream.cancel();
                    cancelled = true;
                }
            }
        }
        println!();

        let turn = stream.finish().await?;
        if let Some(marker) = ConsoleFormatter::format_stream_error(&turn) {
            println!("{}", marker);
        }
        Ok(turn)
    }

    fn clear_progress(&self) {
        if let Some(progress) = &self.progress {
            progress.clear(&self.conversation_id);
        }
    }

    fn print_welcome(&self) {
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│               Parley - Chat Mode            │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        println!("Conversation: {}", self.conversation_id.cyan());
        println!(
            "Tools: {}",
            self.orchestrator
                .registry()
                .names()
                .collect::<Vec<_>>()
                .join(", ")
        );
        println!();
        Self::print_commands();
    }

    fn print_commands() {
        println!("Commands:");
        println!("  /help, /h, /?     - Show this help");
        println!("  /tools            - List available tools");
        println!("  /history          - Show this conversation");
        println!("  /reset            - Forget this conversation");
        println!("  /quit, /exit, /q  - Exit chat");
        println!();
    }

    /// Handle slash commands. Returns true if should exit.
    async fn handle_command(&self, cmd: &str) -> bool {
        match cmd {
            "/quit" | "/exit" | "/q" => {
                println!("Bye!");
                true
            }
            "/help" | "/h" | "/?" => {
                println!();
                Self::print_commands();
                false
            }
            "/tools" => {
                println!(
                    "{}",
                    ConsoleFormatter::format_tools(self.orchestrator.registry())
                );
                false
            }
            "/history" => {
                let turns = self.orchestrator.history(&self.conversation_id).await;
                println!("{}", ConsoleFormatter::format_history(&turns));
                false
            }
            "/reset" => {
                self.orchestrator.reset(&self.conversation_id).await;
                println!("{}", "Conversation cleared.".green());
                false
            }
            _ => {
                println!("Unknown command: {}", cmd);
                println!("Type /help for available commands");
                false
            }
        }
    }
}
