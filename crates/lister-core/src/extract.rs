//! Pull the raw record array out of a response body

use serde_json::Value;

use crate::definition::Selector;
use crate::error::{ListerError, Result};
use crate::path::get_path;

const PREVIEW_LIMIT: usize = 120;

/// Extract the candidate records from `body`.
///
/// Without a selector the lookup order is `body.data`, then `body`, then
/// `body.data.data`; the first array wins.
pub fn extract(body: &Value, selector: Option<&Selector>) -> Result<Vec<Value>> {
    match selector {
        Some(Selector::Func(f)) => into_array(f(body), "selector", selector),
        Some(Selector::Path(path)) => {
            let value = get_path(body, path).cloned().unwrap_or(Value::Null);
            into_array(value, "selector", selector)
        }
        None => {
            let candidate = [get_path(body, "data"), Some(body), get_path(body, "data.data")]
                .into_iter()
                .flatten()
                .find(|v| v.is_array());
            match candidate {
                Some(Value::Array(items)) => Ok(items.clone()),
                _ => Err(not_array("default", None, body)),
            }
        }
    }
}

fn into_array(value: Value, stage: &str, selector: Option<&Selector>) -> Result<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(not_array(stage, selector, &other)),
    }
}

fn not_array(stage: &str, selector: Option<&Selector>, value: &Value) -> ListerError {
    ListerError::ExtractNotArray {
        stage: stage.to_string(),
        selector: selector.map_or_else(|| "none".to_string(), Selector::describe),
        preview: preview(value),
    }
}

fn preview(value: &Value) -> String {
    let text = value.to_string();
    if text.chars().count() <= PREVIEW_LIMIT {
        text
    } else {
        let cut: String = text.chars().take(PREVIEW_LIMIT).collect();
        format!("{cut}…")
    }
}
