//! Ask command - one-shot weather question.

use anyhow::Result;
use clap::Args;
use console::Style;

use super::Context;

/// Arguments for the ask command.
#[derive(Args, Debug)]
pub struct AskArgs {
    /// The question, e.g. "Do I need an umbrella in Seattle?"
    #[arg(required = true)]
    pub prompt: String,

    /// Let the LLM choose the tool (needs an API key)
    #[arg(long)]
    pub tools: bool,
}

/// Run the ask command.
pub async fn run(args: AskArgs, ctx: &Context) -> Result<()> {
    let assistant = super::start_assistant(ctx).await?;

    if ctx.verbose {
        let dim = Style::new().dim();
        let mode = if args.tools {
            "function calling"
        } else if assistant.has_llm() {
            "rule-based + LLM"
        } else {
            "rule-based"
        };
        println!("{}", dim.apply_to(format!("Mode: {}", mode)));
        println!();
    }

    let answer = if args.tools {
        assistant.ask_with_tools(&args.prompt).await
    } else {
        assistant.respond(&args.prompt).await
    };
    assistant.session().disconnect().await?;

    println!("{}", answer?);
    Ok(())
}
