//! Chat command - interactive REPL mode.

use anyhow::{Context as _, Result};
use clap::Args;

use super::Context;
use super::repl::Repl;

/// Arguments for the chat command.
#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Let the LLM choose the tool for each message (needs an API key)
    #[arg(long)]
    pub tools: bool,
}

/// Run the chat command (REPL).
pub async fn run(args: ChatArgs, ctx: &Context) -> Result<()> {
    println!("🌤️ Nimbus weather client starting...");

    let assistant = super::start_assistant(ctx)
        .await
        .context("Failed to start weather client")?;

    let mut repl = Repl::new(assistant, args.tools, ctx.verbose)?;
    repl.run().await
}
