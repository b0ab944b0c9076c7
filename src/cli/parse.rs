use serde_json::{Map, Value};

use lister_core::bail_invalid;
use lister_core::error::Result;
use lister_core::option::OptionId;
use lister_core::search::SearchMode;

/// Parse an option value; integers stay numeric
pub fn parse_option_id(s: &str) -> std::result::Result<OptionId, String> {
    Ok(OptionId::parse(s))
}

/// Parse search mode from string
pub fn parse_search_mode(s: &str) -> std::result::Result<SearchMode, String> {
    match s.to_lowercase().as_str() {
        "local" => Ok(SearchMode::Local),
        "remote" => Ok(SearchMode::Remote),
        "hybrid" => Ok(SearchMode::Hybrid),
        other => Err(format!("unknown search mode '{other}' (expected local, remote or hybrid)")),
    }
}

/// Build a filter object from `key=value` pairs. Values that parse as JSON keep
/// their type; anything else is a string.
pub fn parse_filters(pairs: &[String]) -> Result<Value> {
    if pairs.is_empty() {
        return Ok(Value::Null);
    }

    let mut filters = Map::new();
    for pair in pairs {
        let Some((key, raw)) = pair.split_once('=') else {
            bail_invalid!("filter", pair);
        };
        let key = key.trim();
        if key.is_empty() {
            bail_invalid!("filter", pair);
        }
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::from(raw));
        filters.insert(key.to_string(), value);
    }
    Ok(Value::Object(filters))
}
