//! Tools command - list the tool server's tools.

use anyhow::Result;
use clap::Args;
use console::style;
use nimbus_mcp::function_declarations;
use nimbus_weather::reply;

use super::Context;

/// Arguments for the tools command.
#[derive(Args, Debug)]
pub struct ToolsArgs {
    /// Print the tools as function declarations in JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the tools command.
pub async fn run(args: ToolsArgs, ctx: &Context) -> Result<()> {
    let session = super::connect(ctx).await?;
    let tools = session.tools();

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&function_declarations(&tools))?
        );
    } else if tools.is_empty() {
        println!("No tools available.");
    } else {
        println!("{}", style("Available weather tools:").bold());
        println!("{}", reply::tool_list(&tools));
    }

    session.disconnect().await?;
    Ok(())
}
