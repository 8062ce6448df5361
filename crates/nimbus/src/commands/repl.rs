//! REPL (Read-Eval-Print Loop) implementation for interactive weather chat.

use anyhow::Result;
use console::{Style, Term, style};
use nimbus_weather::{WeatherAssistant, reply};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};

/// REPL state and configuration.
pub struct Repl {
    assistant: WeatherAssistant,
    use_tools: bool,
    editor: Editor<(), DefaultHistory>,
    term: Term,
    verbose: bool,
}

impl Repl {
    /// Create a new REPL instance.
    pub fn new(assistant: WeatherAssistant, use_tools: bool, verbose: bool) -> Result<Self> {
        let config = Config::builder()
            .history_ignore_space(true)
            .auto_add_history(true)
            .build();

        let editor = Editor::with_config(config)?;

        Ok(Self {
            assistant,
            use_tools,
            editor,
            term: Term::stdout(),
            verbose,
        })
    }

    /// Run the REPL loop, then close the session.
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();

        loop {
            let prompt = self.format_prompt();

            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();

                    if line.is_empty() {
                        continue;
                    }

                    if line.starts_with('/') {
                        match self.handle_slash_command(line) {
                            Ok(ControlFlow::Continue) => continue,
                            Ok(ControlFlow::Exit) => {
                                println!("👋 Goodbye!");
                                break;
                            }
                            Err(e) => {
                                self.print_error(&format!("Command error: {}", e));
                                continue;
                            }
                        }
                    }

                    if let Err(e) = self.send_message(line).await {
                        self.print_error(&e.to_string());
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                    println!();
                    println!("🛑 Shutting down weather client...");
                    break;
                }
                Err(e) => {
                    self.print_error(&format!("Input error: {}", e));
                    break;
                }
            }
        }

        self.assistant.session().disconnect().await?;
        self.print_dim("Disconnected from weather server");
        Ok(())
    }

    /// Answer one message.
    async fn send_message(&mut self, message: &str) -> Result<()> {
        self.print_dim("🌤️ Getting weather data...");

        let answer = if self.use_tools && self.assistant.has_llm() {
            self.assistant.ask_with_tools(message).await?
        } else {
            self.assistant.respond(message).await?
        };

        println!("{}", answer);
        println!();
        Ok(())
    }

    /// Handle a slash command.
    fn handle_slash_command(&mut self, input: &str) -> Result<ControlFlow> {
        let cmd = input[1..].split_whitespace().next().unwrap_or("");

        match cmd {
            "quit" | "q" | "exit" => {
                return Ok(ControlFlow::Exit);
            }
            "help" | "h" | "?" => {
                println!();
                println!("{}", reply::help(&self.assistant.session().tools()));
                println!();
            }
            "tools" => {
                println!("{}", style("Available weather tools:").bold());
                println!("{}", reply::tool_list(&self.assistant.session().tools()));
                println!();
            }
            "clear" | "cls" => {
                self.term.clear_screen()?;
            }
            "" => {
                self.print_dim("Type /help for available commands");
            }
            _ => {
                self.print_error(&format!("Unknown command: /{}", cmd));
                self.print_dim("Type /help for available commands");
            }
        }

        Ok(ControlFlow::Continue)
    }

    fn print_welcome(&self) {
        let dim = Style::new().dim();
        println!();
        println!("{}", style("Nimbus Weather Chat").bold().cyan());
        println!("{}", dim.apply_to("─".repeat(40)));
        println!(
            "💬 Weather chat started! Ask about weather in any US city. \
             Type \"/help\" for commands or \"/quit\" to exit"
        );
        if self.verbose {
            let session = self.assistant.session();
            println!(
                "{}",
                dim.apply_to(format!(
                    "Server: {} ({} tools)",
                    session.name(),
                    session.tools().len()
                ))
            );
            let mode = match (self.use_tools, self.assistant.has_llm()) {
                (true, true) => "function calling",
                (_, true) => "rule-based + LLM",
                _ => "rule-based",
            };
            println!("{}", dim.apply_to(format!("Mode: {}", mode)));
        }
        println!();
    }

    fn format_prompt(&self) -> String {
        format!("{} ", style("You:").cyan().bold())
    }

    fn print_dim(&self, msg: &str) {
        let dim = Style::new().dim();
        println!("{}", dim.apply_to(msg));
    }

    fn print_error(&self, msg: &str) {
        let red = Style::new().red();
        println!("{} {}", red.apply_to("Error:"), msg);
    }
}

/// Control flow for the REPL.
pub enum ControlFlow {
    Continue,
    Exit,
}
