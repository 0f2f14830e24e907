//! Flatten-then-unflatten round trips over identified documents, including
//! the known asymmetry for array items without identity.

use serde_json::{Value, json};
use sheetfold_engine::{FlattenOptions, Flattener, UnflattenOptions, Unflattener};
use sheetfold_spec::SchemaIndex;

fn round_trip(
    doc: &Value,
    schema: Option<&SchemaIndex>,
    flatten_options: FlattenOptions,
    unflatten_options: UnflattenOptions,
) -> Vec<Value> {
    let mut flattener = match schema {
        Some(schema) => Flattener::new(flatten_options).with_schema(schema),
        None => Flattener::new(flatten_options),
    };
    flattener.flatten_value(doc).expect("flatten succeeds");
    let sheets = flattener.to_input_sheets();
    let mut unflattener = match schema {
        Some(schema) => Unflattener::new(unflatten_options).with_schema(schema),
        None => Unflattener::new(unflatten_options),
    };
    unflattener.unflatten(&sheets).expect("unflatten succeeds")
}

#[test]
fn identified_records_round_trip_without_a_schema() {
    let doc = json!([
        {
            "ocid": "pub-1",
            "id": 1,
            "title": "First",
            "buyer": {"id": 7, "name": "Town Hall"},
            "items": [
                {"id": 10, "d": "v1", "parts": [{"id": 100, "p": "a"}]},
                {"id": 11, "d": "v2"}
            ]
        },
        {"ocid": "pub-1", "id": 2, "title": "Second"}
    ]);
    let output = round_trip(
        &doc,
        None,
        FlattenOptions::default(),
        UnflattenOptions::default(),
    );
    assert_eq!(Value::Array(output), doc);
}

fn release_schema() -> SchemaIndex {
    SchemaIndex::from_value(&json!({
        "properties": {
            "id": {"type": "integer"},
            "title": {"type": "string"},
            "tags": {"type": "array", "items": {"type": "string"}},
            "c": {"type": "array", "items": {"$ref": "#/citem"}}
        },
        "citem": {
            "type": "object",
            "properties": {
                "id": {"type": "integer"},
                "d": {"type": "string"}
            }
        }
    }))
    .expect("schema loads")
}

#[test]
fn schema_guided_round_trip_covers_string_arrays_and_ref_sheets() {
    let doc = json!([
        {
            "ocid": "pub-1",
            "id": 1,
            "title": "First",
            "tags": ["x", "y"],
            "c": [{"id": 10, "d": "v1"}, {"id": 11, "d": "v2"}]
        }
    ]);
    let schema = release_schema();
    let output = round_trip(
        &doc,
        Some(&schema),
        FlattenOptions::default(),
        UnflattenOptions::default(),
    );
    assert_eq!(Value::Array(output), doc);
}

#[test]
fn semicolons_inside_string_array_items_are_lossy() {
    // The delimiter has no escape: one item containing `;` comes back as two.
    let doc = json!([{"ocid": "pub-1", "id": 1, "tags": ["x;y"]}]);
    let schema = release_schema();
    let output = round_trip(
        &doc,
        Some(&schema),
        FlattenOptions::default(),
        UnflattenOptions::default(),
    );
    assert_eq!(
        Value::Array(output),
        json!([{"ocid": "pub-1", "id": 1, "tags": ["x", "y"]}])
    );
}

fn rollup_options() -> FlattenOptions {
    FlattenOptions {
        rollup: true,
        ..FlattenOptions::default()
    }
}

#[test]
fn rollup_round_trips_cleanly_when_ids_are_rolled_up() {
    let schema = SchemaIndex::from_value(&json!({
        "properties": {
            "id": {"type": "integer"},
            "testA": {
                "type": "array",
                "rollUp": ["id", "testB"],
                "items": {
                    "type": "object",
                    "properties": {
                        "id": {"type": "string"},
                        "testB": {"type": "string"},
                        "testC": {"type": "string"}
                    }
                }
            }
        }
    }))
    .expect("schema loads");
    let doc = json!([
        {"ocid": "pub-1", "id": 1, "testA": [{"id": "a", "testB": "1", "testC": "2"}]}
    ]);
    let output = round_trip(
        &doc,
        Some(&schema),
        rollup_options(),
        UnflattenOptions::default(),
    );
    // The rolled-up columns fold into an item with the same id as the
    // sub-sheet row, so the arrays merge back to a single item.
    assert_eq!(Value::Array(output), doc);
}

#[test]
fn rollup_sentinel_cells_are_dropped_on_the_way_back() {
    let schema = SchemaIndex::from_value(&json!({
        "properties": {
            "id": {"type": "integer"},
            "testA": {
                "type": "array",
                "rollUp": ["id", "testB"],
                "items": {
                    "type": "object",
                    "properties": {
                        "id": {"type": "string"},
                        "testB": {"type": "string"}
                    }
                }
            }
        }
    }))
    .expect("schema loads");
    let doc = json!([
        {"ocid": "pub-1", "id": 1, "testA": [
            {"id": "a", "testB": "1"},
            {"id": "b", "testB": "2"}
        ]}
    ]);
    let output = round_trip(
        &doc,
        Some(&schema),
        rollup_options(),
        UnflattenOptions::default(),
    );
    assert_eq!(Value::Array(output), doc);
}

#[test]
fn idless_rolled_up_items_duplicate_on_the_way_back() {
    // The documented asymmetry: without an id, the rolled-up copy on the
    // main sheet and the sub-sheet row cannot be recognised as one item.
    let schema = SchemaIndex::from_value(&json!({
        "properties": {
            "testA": {
                "type": "array",
                "rollUp": ["testB"],
                "items": {
                    "type": "object",
                    "properties": {
                        "testB": {"type": "string"},
                        "testC": {"type": "string"}
                    }
                }
            }
        }
    }))
    .expect("schema loads");
    let doc = json!([
        {"ocid": "pub-1", "id": 1, "testA": [{"testB": "1", "testC": "2"}]}
    ]);
    let output = round_trip(
        &doc,
        Some(&schema),
        rollup_options(),
        UnflattenOptions::default(),
    );
    assert_eq!(
        Value::Array(output),
        json!([
            {"ocid": "pub-1", "id": 1, "testA": [
                {"testB": "1"},
                {"testB": "1", "testC": "2"}
            ]}
        ])
    );
}

#[test]
fn root_id_leads_every_emitted_object() {
    // Even when the flattened main row happens to list other columns first.
    let doc = json!([{"id": 1, "ocid": "pub-1", "title": "First"}]);
    let output = round_trip(
        &doc,
        None,
        FlattenOptions::default(),
        UnflattenOptions::default(),
    );
    let object = output[0].as_object().expect("object");
    assert_eq!(object.keys().next().map(String::as_str), Some("ocid"));
}
