//! Config command - show the resolved configuration.

use anyhow::Result;
use clap::Args;
use console::Style;
use nimbus_config::NimbusConfig;

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Only print the user config file path
    #[arg(long)]
    pub path: bool,
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    if args.path {
        match nimbus_config::user_config_path() {
            Some(path) => println!("{}", path.display()),
            None => println!("(no config directory on this platform)"),
        }
        return Ok(());
    }

    let dim = Style::new().dim();
    println!("# Nimbus Configuration\n");

    if ctx.sources.is_empty() {
        println!("{}", dim.apply_to("# No config files loaded (using defaults)"));
    } else {
        for source in &ctx.sources {
            println!("{}", dim.apply_to(format!("# Loaded: {}", source.display())));
        }
    }
    println!();

    let mut llm = ctx.config.llm();
    let key_source = nimbus_config::resolve_api_key(llm.api_key.as_deref())
        .map(|s| s.source.to_string())
        .unwrap_or_else(|| "not set".to_string());
    if llm.api_key.is_some() {
        llm.api_key = Some("********".to_string());
    }

    let resolved = NimbusConfig {
        server: Some(ctx.config.server()),
        llm: Some(llm),
    };
    print!("{}", resolved.to_toml()?);
    println!();
    println!("{}", dim.apply_to(format!("# API key: {}", key_source)));

    Ok(())
}
