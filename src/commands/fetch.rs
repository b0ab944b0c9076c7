//! `lister fetch` - one-shot fetch of a preset

use serde_json::json;

use crate::cli::parse::parse_filters;
use crate::cli::{FetchArgs, OutputFormat};
use crate::commands::dispatch::{trace_command, CommandContext};
use lister_core::error::Result;
use lister_core::option::ListerOption;
use lister_core::runtime::FetchQuery;

pub fn execute(ctx: &CommandContext, args: &FetchArgs) -> Result<()> {
    let filters = parse_filters(&args.filter)?;
    let runtime = ctx.runtime()?;
    let query = FetchQuery {
        query: args.query.clone().unwrap_or_default(),
    };

    let result = ctx.block_on(runtime.fetch(args.kind.as_str(), filters, query))??;
    trace_command!(ctx.cli, ctx.start, "fetch");

    match ctx.cli.format {
        OutputFormat::Json => {
            let output = json!({
                "kind": args.kind,
                "count": result.options.len(),
                "options": result.options,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Human => {
            if result.options.is_empty() && !ctx.cli.quiet {
                println!("No options found");
            }
            for option in &result.options {
                println!("{}", format_option(option));
            }
        }
    }
    Ok(())
}

/// One `value<TAB>label` line, flagged when disabled
pub fn format_option(option: &ListerOption) -> String {
    let mut line = format!("{}\t{}", option.value, option.label);
    if option.disabled {
        line.push_str(" (disabled)");
    }
    line
}
