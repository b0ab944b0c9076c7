//! Mode-aware selection payloads and session results

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::option::{ListerOption, OptionId};
use crate::session::{DraftValue, Mode, SessionId};

/// What produced a [`Details`] payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailAction {
    Init,
    Select,
    Deselect,
    Clear,
    Apply,
    Cancel,
    Close,
    Denied,
    Error,
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reason {
    Apply,
    Cancel,
    Close,
    Denied,
    Error,
}

impl From<Reason> for DetailAction {
    fn from(reason: Reason) -> Self {
        match reason {
            Reason::Apply => DetailAction::Apply,
            Reason::Cancel => DetailAction::Cancel,
            Reason::Close => DetailAction::Close,
            Reason::Denied => DetailAction::Denied,
            Reason::Error => DetailAction::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DetailOptions {
    Multiple(Vec<ListerOption>),
    Single(Option<ListerOption>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Details {
    pub options: DetailOptions,
    /// `raw` of the selected option(s): an array in multiple mode, a record or `null` otherwise
    pub raw: Value,
    pub action: DetailAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
}

impl Details {
    /// Details with nothing selected
    pub fn empty(mode: Mode, action: DetailAction) -> Self {
        match mode {
            Mode::Single => Self::new(DetailOptions::Single(None), Value::Null, action),
            Mode::Multiple => Self::new(
                DetailOptions::Multiple(Vec::new()),
                Value::Array(Vec::new()),
                action,
            ),
        }
    }

    fn new(options: DetailOptions, raw: Value, action: DetailAction) -> Self {
        Self {
            options,
            raw,
            action,
            error_code: None,
            session_id: None,
        }
    }

    pub fn with_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn with_error_code(mut self, error_code: Option<String>) -> Self {
        self.error_code = error_code;
        self
    }
}

/// Project the draft selection onto the current options
pub fn build_details(
    mode: Mode,
    draft: &DraftValue,
    options: &[ListerOption],
    action: DetailAction,
) -> Details {
    let by_value: HashMap<&OptionId, &ListerOption> =
        options.iter().map(|o| (&o.value, o)).collect();

    match mode {
        Mode::Multiple => {
            let selected: Vec<ListerOption> = draft
                .ids()
                .iter()
                .filter_map(|id| by_value.get(id).map(|o| (*o).clone()))
                .collect();
            let raw = Value::Array(selected.iter().map(|o| o.raw.clone()).collect());
            Details::new(DetailOptions::Multiple(selected), raw, action)
        }
        Mode::Single => {
            let selected = draft
                .ids()
                .first()
                .and_then(|id| by_value.get(id))
                .map(|o| (*o).clone());
            let raw = selected.as_ref().map_or(Value::Null, |o| o.raw.clone());
            Details::new(DetailOptions::Single(selected), raw, action)
        }
    }
}

/// The value an `open` call settles with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenResult {
    pub reason: Reason,
    pub value: DraftValue,
    pub details: Details,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options() -> Vec<ListerOption> {
        [1, 2, 3]
            .into_iter()
            .map(|i: i64| ListerOption {
                raw: json!({"id": i}),
                ..ListerOption::new(i, format!("Item {i}"))
            })
            .collect()
    }

    #[test]
    fn test_multiple_keeps_selection_order_and_drops_unknown() {
        let draft =
            DraftValue::Multiple(vec![OptionId::Int(3), OptionId::Int(99), OptionId::Int(1)]);
        let details = build_details(Mode::Multiple, &draft, &options(), DetailAction::Select);

        let DetailOptions::Multiple(selected) = &details.options else {
            panic!("expected multiple options");
        };
        let ids: Vec<_> = selected.iter().map(|o| o.value.clone()).collect();
        assert_eq!(ids, vec![OptionId::Int(3), OptionId::Int(1)]);
        assert_eq!(details.raw, json!([{"id": 3}, {"id": 1}]));
        assert_eq!(details.action, DetailAction::Select);
    }

    #[test]
    fn test_single_option_or_null() {
        let pick = |id| DraftValue::Single(Some(OptionId::Int(id)));
        let hit = build_details(Mode::Single, &pick(2), &options(), DetailAction::Init);
        assert_eq!(hit.raw, json!({"id": 2}));
        assert!(matches!(hit.options, DetailOptions::Single(Some(ref o)) if o.label == "Item 2"));

        let miss = build_details(Mode::Single, &pick(7), &options(), DetailAction::Init);
        assert_eq!(miss.options, DetailOptions::Single(None));
        assert_eq!(miss.raw, Value::Null);
    }

    #[test]
    fn test_serialized_shape() {
        let details =
            build_details(Mode::Single, &DraftValue::Single(None), &[], DetailAction::Cancel)
                .with_session("s1".into());
        assert_eq!(
            serde_json::to_value(&details).unwrap(),
            json!({"options": null, "raw": null, "action": "cancel", "session_id": "s1"})
        );
    }
}
