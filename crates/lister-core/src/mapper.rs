//! Map raw records into selectable options
//!
//! The mapper is tolerant: records without a value are skipped rather than reported.

use serde_json::Value;

use crate::definition::{MapContext, Mapping, Resolver};
use crate::option::{ListerOption, OptionId};

pub fn map_options(
    raw_list: &[Value],
    mapping: &Mapping,
    ctx: &MapContext<'_>,
) -> Vec<ListerOption> {
    raw_list
        .iter()
        .filter_map(|raw| map_one(raw, mapping, ctx))
        .collect()
}

fn map_one(raw: &Value, mapping: &Mapping, ctx: &MapContext<'_>) -> Option<ListerOption> {
    let value = OptionId::from_value(&mapping.value.resolve(raw, ctx)?)?;

    let label = match &mapping.label {
        Some(resolver) => resolver.resolve(raw, ctx).map(|v| text(&v)),
        None => raw.get("label").filter(|v| !v.is_null()).map(text),
    }
    .unwrap_or_else(|| value.to_string());

    Some(ListerOption {
        label,
        icon: resolve_text(mapping.icon.as_ref(), raw, ctx),
        description: resolve_text(mapping.description.as_ref(), raw, ctx),
        disabled: mapping
            .disabled
            .as_ref()
            .and_then(|r| r.resolve(raw, ctx))
            .is_some_and(|v| truthy(&v)),
        group: resolve_text(mapping.group.as_ref(), raw, ctx),
        meta: mapping.meta.as_ref().and_then(|r| r.resolve(raw, ctx)),
        raw: raw.clone(),
        value,
    })
}

fn resolve_text(resolver: Option<&Resolver>, raw: &Value, ctx: &MapContext<'_>) -> Option<String> {
    resolver.and_then(|r| r.resolve(raw, ctx)).map(|v| text(&v))
}

/// String form of a scalar; strings are not quoted
pub(crate) fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> (Value, &'static str) {
        (Value::Null, "")
    }

    #[test]
    fn test_map_skips_records_without_value() {
        let (filters, query) = ctx();
        let ctx = MapContext {
            filters: &filters,
            query,
        };
        let raw = vec![
            json!({"id": 1, "name": "One"}),
            json!({"name": "No id"}),
            json!({"id": null, "name": "Null id"}),
            json!({"id": "b", "name": "Bee"}),
        ];
        let mapping = Mapping::new(Resolver::path("id")).with_label(Resolver::path("name"));

        let options = map_options(&raw, &mapping, &ctx);

        assert_eq!(options.len(), 2);
        assert_eq!(options[0].value, OptionId::Int(1));
        assert_eq!(options[0].label, "One");
        assert_eq!(options[1].value, OptionId::from("b"));
        assert_eq!(options[1].raw, raw[3]);
    }

    #[test]
    fn test_label_fallbacks() {
        let (filters, query) = ctx();
        let ctx = MapContext {
            filters: &filters,
            query,
        };
        let raw = vec![json!({"id": 7, "label": "Seven"}), json!({"id": 8})];
        let options = map_options(&raw, &Mapping::new(Resolver::path("id")), &ctx);

        assert_eq!(options[0].label, "Seven");
        assert_eq!(options[1].label, "8");
    }

    #[test]
    fn test_optional_fields() {
        let (filters, query) = ctx();
        let ctx = MapContext {
            filters: &filters,
            query,
        };
        let raw = vec![
            json!({"id": 1, "active": false, "team": "core"}),
            json!({"id": 2, "active": true}),
        ];
        let mapping = Mapping::new(Resolver::path("id"))
            .with_disabled(Resolver::func(|raw, _| {
                json!(!raw["active"].as_bool().unwrap_or(false))
            }))
            .with_group(Resolver::path("team"));

        let options = map_options(&raw, &mapping, &ctx);

        assert!(options[0].disabled);
        assert_eq!(options[0].group.as_deref(), Some("core"));
        assert!(!options[1].disabled);
        assert_eq!(options[1].group, None);
        assert_eq!(options[1].icon, None);
    }
}
