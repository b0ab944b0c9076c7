//! Command dispatch logic for lister

use std::time::Instant;

use crate::cli::{Cli, Commands};
use crate::commands;
use lister_core::error::Result;

mod command;
mod macros;

pub use command::{Command, CommandContext};
use command::NoCommand;
pub(crate) use macros::trace_command;

pub fn run(cli: &Cli, start: Instant) -> Result<()> {
    let Some(cmd) = &cli.command else {
        return NoCommand.execute();
    };

    let ctx = CommandContext::load(cli, start)?;
    trace_command!(cli, start, "load_config");

    cmd.execute(&ctx)
}

impl Command for Commands {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        match self {
            Commands::Presets => commands::presets::execute(ctx),
            Commands::Fetch(args) => commands::fetch::execute(ctx, args),
            Commands::Pick(args) => commands::pick::execute(ctx, args),
        }
    }
}
