//! Chat session management

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::engine::{ApprovalSummary, DialogEngine, EngineError, TurnInput, TurnOutcome};

/// One interactive conversation thread
pub struct ChatSession {
    engine: DialogEngine,
    thread_id: String,
    passenger_id: Option<String>,
}

impl ChatSession {
    pub fn new(engine: DialogEngine, thread_id: String, passenger_id: Option<String>) -> Self {
        Self {
            engine,
            thread_id,
            passenger_id,
        }
    }

    /// Run the chat main loop
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();

        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            let readline = rl.readline(&format!("{} ", ">".bright_green()));

            match readline {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }

                    let _ = rl.add_history_entry(input);

                    if input.starts_with('/') {
                        match self.handle_slash_command(input) {
                            SlashResult::Continue => continue,
                            SlashResult::Quit => break,
                        }
                    } else {
                        self.process_turn(&mut rl, TurnInput::User(input.to_string())).await?;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    /// Submit a turn and keep resolving approval gates until a reply lands
    async fn process_turn(&mut self, rl: &mut DefaultEditor, mut input: TurnInput) -> Result<()> {
        loop {
            let outcome = self
                .engine
                .submit_turn(&self.thread_id, self.passenger_id.as_deref(), input)
                .await;

            match outcome {
                Ok(TurnOutcome::Reply(text)) => {
                    println!();
                    println!("{text}");
                    println!();
                    return Ok(());
                }
                Ok(TurnOutcome::PendingApproval(summary)) => {
                    input = self.prompt_approval(rl, &summary)?;
                }
                Err(EngineError::ApprovalPending) => {
                    println!("{}", "A sensitive action is still awaiting your decision.".yellow());
                    return Ok(());
                }
                Err(e) => {
                    println!("{} {}", "Error:".bright_red(), e);
                    return Ok(());
                }
            }
        }
    }

    /// Ask the user to approve or deny a suspended sensitive call
    fn prompt_approval(&self, rl: &mut DefaultEditor, summary: &ApprovalSummary) -> Result<TurnInput> {
        println!();
        println!("{}", "Sensitive action requested:".bright_yellow().bold());
        println!("  tool: {}", summary.tool.bright_cyan());
        println!(
            "  args: {}",
            serde_json::to_string_pretty(&summary.args).unwrap_or_else(|_| summary.args.to_string())
        );

        let answer = rl.readline(&format!("{} ", "approve? [y/N]".bright_yellow()))?;
        let approved = matches!(answer.trim().to_lowercase().as_str(), "y" | "yes");

        if approved {
            return Ok(TurnInput::Approval {
                approved: true,
                reason: None,
            });
        }

        let reason = rl.readline(&format!("{} ", "reason (optional):".dimmed()))?;
        let reason = reason.trim();
        Ok(TurnInput::Approval {
            approved: false,
            reason: (!reason.is_empty()).then(|| reason.to_string()),
        })
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "Concierge Travel Support".bright_cyan().bold());
        println!("Thread: {}", self.thread_id);
        if let Some(id) = &self.passenger_id {
            println!("Passenger: {id}");
        }
        println!("Type {} for help, {} to quit", "/help".yellow(), "/quit".yellow());
        println!();
    }

    fn handle_slash_command(&mut self, input: &str) -> SlashResult {
        let parts: Vec<&str> = input.split_whitespace().collect();
        let cmd = parts.first().copied().unwrap_or("");

        match cmd {
            "/help" | "/h" => {
                self.print_help();
                SlashResult::Continue
            }
            "/quit" | "/q" | "/exit" => SlashResult::Quit,
            "/thread" => {
                println!("{}", self.thread_id);
                SlashResult::Continue
            }
            _ => {
                println!("{} {}", "Unknown command:".bright_red(), cmd);
                SlashResult::Continue
            }
        }
    }

    fn print_help(&self) {
        println!("Commands:");
        println!("  {}  Show this help", "/help".yellow());
        println!("  {}  Print the thread id", "/thread".yellow());
        println!("  {}  Exit the chat", "/quit".yellow());
    }
}

enum SlashResult {
    Continue,
    Quit,
}
