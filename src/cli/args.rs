//! Per-command arguments

use clap::Args;

use super::parse::{parse_option_id, parse_search_mode};
use lister_core::option::OptionId;
use lister_core::search::SearchMode;

#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    /// Preset kind from the config
    pub kind: String,

    /// Base filter as key=value (repeatable; values may be JSON)
    #[arg(long, short, action = clap::ArgAction::Append)]
    pub filter: Vec<String>,

    /// Search query sent with the request
    #[arg(long)]
    pub query: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct PickArgs {
    /// Preset kind from the config
    pub kind: String,

    /// Allow selecting several options
    #[arg(long, short)]
    pub multiple: bool,

    /// Base filter as key=value (repeatable; values may be JSON)
    #[arg(long, short, action = clap::ArgAction::Append)]
    pub filter: Vec<String>,

    /// Initial search query
    #[arg(long)]
    pub query: Option<String>,

    /// Where the query is resolved: local, remote or hybrid
    #[arg(long, value_parser = parse_search_mode, default_value = "remote")]
    pub search_mode: SearchMode,

    /// Option value to select (repeatable)
    #[arg(long, short, action = clap::ArgAction::Append, value_parser = parse_option_id)]
    pub select: Vec<OptionId>,

    /// Preselected value (repeatable)
    #[arg(long = "default", action = clap::ArgAction::Append, value_parser = parse_option_id)]
    pub default_value: Vec<OptionId>,
}
