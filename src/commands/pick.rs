//! `lister pick` - run a picker session non-interactively
//!
//! Opens a session, waits for the first load, applies each `--select` and
//! resolves with `apply`. Without selections the session is closed.

use lister_core::bail_invalid;
use lister_core::details::{DetailOptions, OpenResult, Reason};
use lister_core::error::{ListerError, Result};
use lister_core::runtime::{ListerRuntime, OpenOptions};
use lister_core::session::{DraftValue, Mode};
use tracing::debug;

use crate::cli::parse::parse_filters;
use crate::cli::{OutputFormat, PickArgs};
use crate::commands::dispatch::{trace_command, CommandContext};
use crate::commands::fetch::format_option;

pub fn execute(ctx: &CommandContext, args: &PickArgs) -> Result<()> {
    let filters = parse_filters(&args.filter)?;
    let runtime = ctx.runtime()?;

    let result = ctx.block_on(run_session(&runtime, args, filters))??;
    trace_command!(ctx.cli, ctx.start, "pick");

    match ctx.cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Human => print_human(&result, ctx.cli.quiet),
    }
    Ok(())
}

async fn run_session(
    runtime: &ListerRuntime,
    args: &PickArgs,
    filters: serde_json::Value,
) -> Result<OpenResult> {
    let mode = if args.multiple {
        Mode::Multiple
    } else {
        Mode::Single
    };
    let mut opts = OpenOptions {
        mode,
        confirm: true,
        search_mode: args.search_mode,
        initial_query: args.query.clone(),
        ..OpenOptions::default()
    };
    if !args.default_value.is_empty() {
        opts.default_value = Some(DraftValue::Multiple(args.default_value.clone()));
    }

    let handle = runtime.open(args.kind.as_str(), filters, opts);
    let Some(id) = handle.session_id().cloned() else {
        let result = handle.wait().await;
        return Err(match result.details.error_code.as_deref() {
            Some("preset_not_found") => ListerError::preset_not_found(&args.kind),
            _ => ListerError::AccessDenied,
        });
    };

    let Some(session) = runtime.settled(&id).await else {
        return Err(ListerError::SessionNotFound { id: id.to_string() });
    };
    if let Some(code) = &session.error_code {
        runtime.cancel(&id);
        return Err(ListerError::Other(format!("loading {} failed: {code}", args.kind)));
    }

    let visible = runtime.visible_options(&id);
    for value in &args.select {
        match visible.iter().find(|o| &o.value == value) {
            Some(option) if !option.disabled => {
                runtime.select(&id, value.clone());
            }
            _ => {
                runtime.cancel(&id);
                bail_invalid!("option", value);
            }
        }
    }
    debug!(session = %id, selected = args.select.len(), "pick_selected");

    if args.select.is_empty() {
        runtime.close(&id);
    } else {
        runtime.apply(&id);
    }
    Ok(handle.wait().await)
}

fn print_human(result: &OpenResult, quiet: bool) {
    if !quiet {
        println!("{}", reason_label(result.reason));
    }
    match &result.details.options {
        DetailOptions::Multiple(options) => {
            for option in options {
                println!("{}", format_option(option));
            }
        }
        DetailOptions::Single(Some(option)) => println!("{}", format_option(option)),
        DetailOptions::Single(None) => {}
    }
}

fn reason_label(reason: Reason) -> &'static str {
    match reason {
        Reason::Apply => "apply",
        Reason::Cancel => "cancel",
        Reason::Close => "close",
        Reason::Denied => "denied",
        Reason::Error => "error",
    }
}
