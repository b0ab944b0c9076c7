//! `lister presets` - list configured presets

use serde_json::json;

use crate::cli::OutputFormat;
use crate::commands::dispatch::CommandContext;
use lister_core::error::Result;

pub fn execute(ctx: &CommandContext) -> Result<()> {
    let presets = &ctx.config.presets;

    match ctx.cli.format {
        OutputFormat::Json => {
            let items: Vec<_> = presets
                .iter()
                .map(|(kind, def)| {
                    json!({
                        "kind": kind,
                        "endpoint": def.source.endpoint,
                        "method": def.source.method.as_str(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
        OutputFormat::Human => {
            if presets.is_empty() {
                if !ctx.cli.quiet {
                    println!("No presets configured");
                }
                return Ok(());
            }
            for (kind, def) in presets {
                println!("{kind}\t{} {}", def.source.method.as_str(), def.source.endpoint);
            }
        }
    }
    Ok(())
}
