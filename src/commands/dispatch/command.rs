//! Command trait and context for dispatching commands

use std::path::PathBuf;
use std::time::Instant;

use crate::cli::Cli;
use lister_core::config::{ListerConfig, CONFIG_FILE};
use lister_core::error::{ListerError, Result};
use lister_core::runtime::ListerRuntime;

/// Resolve the config path from `--config`, falling back to `./lister.toml`
pub fn resolve_config_path(cli: &Cli) -> PathBuf {
    cli.config.clone().unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
}

/// Shared context for command execution
pub struct CommandContext<'a> {
    pub cli: &'a Cli,
    pub config: ListerConfig,
    pub start: Instant,
}

impl<'a> CommandContext<'a> {
    pub fn load(cli: &'a Cli, start: Instant) -> Result<Self> {
        let config = ListerConfig::load(&resolve_config_path(cli))?;
        Ok(Self { cli, config, start })
    }

    /// Runtime over the default HTTP transport with every configured preset
    pub fn runtime(&self) -> Result<ListerRuntime> {
        let runtime = ListerRuntime::with_default_http(self.config.runtime.clone())?;
        for (kind, definition) in &self.config.presets {
            runtime.register_preset(kind.clone(), definition.clone());
        }
        Ok(runtime)
    }

    /// Current-thread tokio runtime for the async commands
    pub fn block_on<F: std::future::Future>(&self, future: F) -> Result<F::Output> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ListerError::Io)?;
        Ok(rt.block_on(future))
    }
}

/// Trait for commands that can be executed
pub trait Command {
    fn execute(&self, ctx: &CommandContext) -> Result<()>;
}

/// No-op command (when no subcommand is provided)
pub struct NoCommand;

impl NoCommand {
    pub fn execute(&self) -> Result<()> {
        println!("lister {}", env!("CARGO_PKG_VERSION"));
        println!();
        println!("Pick values from remote lists.");
        println!();
        println!("Run `lister --help` for usage information.");
        Ok(())
    }
}
