//! Merging of parsed row trees that share an identity.
//!
//! Objects merge field-wise, arrays merge item-wise by `id`, and leaf
//! disagreements keep the first-seen value and record a
//! [`Warning::MergeConflict`]. Merge order is sheet order then row order, so
//! "first" is deterministic.

use serde_json::{Map, Value};
use sheetfold_common::{Warning, WarningSink, display_json};

/// Identity of the row being merged, pre-rendered for warning messages.
pub(crate) struct MergeContext<'a> {
    /// Root-id field name and rendered value, when both are present.
    pub root_id: Option<(&'a str, String)>,
    pub id: String,
    pub sheet: &'a str,
}

pub(crate) fn merge_object(
    dst: &mut Map<String, Value>,
    src: Map<String, Value>,
    ctx: &MergeContext<'_>,
    warnings: &mut WarningSink,
) {
    for (field, incoming) in src {
        match dst.get_mut(&field) {
            None => {
                dst.insert(field, incoming);
            }
            Some(existing) => merge_field(&field, existing, incoming, ctx, warnings),
        }
    }
}

fn merge_field(
    field: &str,
    existing: &mut Value,
    incoming: Value,
    ctx: &MergeContext<'_>,
    warnings: &mut WarningSink,
) {
    match (existing, incoming) {
        (Value::Object(dst), Value::Object(src)) => merge_object(dst, src, ctx, warnings),
        (Value::Array(dst), Value::Array(src)) => merge_array(dst, src, ctx, warnings),
        (existing, incoming) => {
            if *existing != incoming {
                warnings.push(Warning::MergeConflict {
                    field: field.to_string(),
                    root_id: ctx
                        .root_id
                        .as_ref()
                        .map(|(name, value)| (name.to_string(), value.clone())),
                    id: ctx.id.clone(),
                    sheet: ctx.sheet.to_string(),
                    first: display_json(existing),
                    second: display_json(&incoming),
                });
            }
        }
    }
}

/// Items carrying an `id` combine with the item of the same `id`; items
/// without one are appended. The same anonymous item arriving from several
/// rows therefore duplicates — there is nothing to merge it on.
fn merge_array(
    dst: &mut Vec<Value>,
    src: Vec<Value>,
    ctx: &MergeContext<'_>,
    warnings: &mut WarningSink,
) {
    for incoming in src {
        let id = incoming
            .as_object()
            .and_then(|obj| obj.get("id"))
            .cloned();
        let target = id.as_ref().and_then(|id| {
            dst.iter_mut()
                .find(|item| item.as_object().is_some_and(|obj| obj.get("id") == Some(id)))
        });
        match (target, incoming) {
            (Some(Value::Object(existing)), Value::Object(src_obj)) => {
                merge_object(existing, src_obj, ctx, warnings);
            }
            (_, incoming) => dst.push(incoming),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx<'a>() -> MergeContext<'a> {
        MergeContext {
            root_id: Some(("ocid", "1".into())),
            id: "2".into(),
            sheet: "sub".into(),
        }
    }

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn new_fields_are_added_and_equal_leaves_are_silent() {
        let mut sink = WarningSink::new();
        let mut dst = as_map(json!({"ocid": 1, "id": 2}));
        merge_object(&mut dst, as_map(json!({"ocid": 1, "a": "b"})), &ctx(), &mut sink);
        assert_eq!(Value::Object(dst), json!({"ocid": 1, "id": 2, "a": "b"}));
        assert!(sink.is_empty());
    }

    #[test]
    fn leaf_conflicts_keep_the_first_value_and_warn() {
        let mut sink = WarningSink::new();
        let mut dst = as_map(json!({"testB": 4}));
        merge_object(&mut dst, as_map(json!({"testB": 5})), &ctx(), &mut sink);
        assert_eq!(Value::Object(dst), json!({"testB": 4}));
        assert_eq!(
            sink.messages(),
            vec![r#"Conflict when merging field "testB" for ocid "1", id "2" in sheet sub: "4" != "5""#]
        );
    }

    #[test]
    fn array_items_merge_by_id() {
        let mut sink = WarningSink::new();
        let mut dst = as_map(json!({"testA": [{"id": 3, "x": 1}]}));
        merge_object(
            &mut dst,
            as_map(json!({"testA": [{"id": 3, "y": 2}, {"z": 3}]})),
            &ctx(),
            &mut sink,
        );
        assert_eq!(
            Value::Object(dst),
            json!({"testA": [{"id": 3, "x": 1, "y": 2}, {"z": 3}]})
        );
        assert!(sink.is_empty());
    }

    #[test]
    fn idless_items_duplicate_rather_than_merge() {
        let mut sink = WarningSink::new();
        let mut dst = as_map(json!({"testA": [{"testB": 9}]}));
        merge_object(&mut dst, as_map(json!({"testA": [{"testB": 9}]})), &ctx(), &mut sink);
        assert_eq!(Value::Object(dst), json!({"testA": [{"testB": 9}, {"testB": 9}]}));
    }
}
