use serde_json::json;
use sheetfold_parse::{PathStep, parse_field_path, render_path};
use sheetfold_spec::{SchemaError, SchemaIndex, SchemaType};

fn contracting_schema() -> SchemaIndex {
    let schema = json!({
        "properties": {
            "id": {"title": "Identifier", "type": "integer"},
            "testA": {"title": "A title", "type": "integer"},
            "testB": {
                "title": "B title",
                "type": "object",
                "properties": {
                    "testC": {"title": "C title", "type": "integer"},
                    "testD": {"title": "D title", "type": "integer"}
                }
            },
            "testR": {
                "title": "R title",
                "type": "array",
                "rollUp": ["id", "testB"],
                "items": {
                    "type": "object",
                    "properties": {
                        "id": {"title": "Identifier", "type": "string"},
                        "testB": {"title": "B title", "type": "string"},
                        "testC": {"title": "C title", "type": "string"},
                        "testSA": {
                            "title": "SA title",
                            "type": "array",
                            "items": {"type": "string"}
                        }
                    }
                }
            },
            "testSA": {
                "title": "SA title",
                "type": "array",
                "items": {"type": "string"}
            }
        }
    });
    SchemaIndex::from_value(&schema).expect("schema loads")
}

#[test]
fn resolves_declared_paths() {
    let index = contracting_schema();
    let path = parse_field_path("testB/testC").unwrap();
    let node = index.resolve(&path).expect("declared path resolves");
    assert_eq!(node.schema_type, Some(SchemaType::Integer));

    assert!(index.resolve(&parse_field_path("missing/field").unwrap()).is_none());
}

#[test]
fn arrays_are_transparent_to_field_steps() {
    let index = contracting_schema();
    let bare = parse_field_path("testR/id").unwrap();
    let node = index.resolve(&bare).expect("resolves through the array");
    assert_eq!(node.schema_type, Some(SchemaType::String));

    let indexed = parse_field_path("testR/0/id").unwrap();
    assert_eq!(
        index.resolve(&indexed).unwrap().schema_type,
        Some(SchemaType::String)
    );
}

#[test]
fn string_arrays_are_detected() {
    let index = contracting_schema();
    assert!(index.is_string_array(&parse_field_path("testSA").unwrap()));
    assert!(index.is_string_array(&parse_field_path("testR/testSA").unwrap()));
    assert!(!index.is_string_array(&parse_field_path("testR").unwrap()));
    assert!(index.is_array(&parse_field_path("testR").unwrap()));
}

#[test]
fn expansion_inserts_anonymous_hops() {
    let index = contracting_schema();
    let path = parse_field_path("testR/testB").unwrap();
    let expanded = index.expand_anonymous(&path);
    assert_eq!(
        expanded.as_slice(),
        &[
            PathStep::Field("testR".into()),
            PathStep::Anonymous,
            PathStep::Field("testB".into()),
        ]
    );
    // Canonical rendering is unchanged by the hop.
    assert_eq!(render_path(&expanded), "testR/testB");

    // Explicitly indexed columns are left alone.
    let indexed = parse_field_path("testR/5/testB").unwrap();
    assert_eq!(index.expand_anonymous(&indexed).as_slice(), indexed.as_slice());

    // Undeclared fields gain nothing.
    let unknown = parse_field_path("newtest/a").unwrap();
    assert_eq!(index.expand_anonymous(&unknown).as_slice(), unknown.as_slice());
}

#[test]
fn titles_convert_per_step_with_passthrough() {
    let index = contracting_schema();
    assert_eq!(
        index.convert_title_column("B title:C title").unwrap(),
        "testB/testC"
    );
    assert_eq!(
        index.convert_title_column("B title:Not in schema").unwrap(),
        "testB/Not in schema"
    );
    // Space- and case-insensitive matching.
    assert_eq!(
        index.convert_title_column("B  title : c  title").unwrap(),
        "testB/testC"
    );
    assert_eq!(
        index.convert_title_column("btitle : Not in schema").unwrap(),
        "testB/Not in schema"
    );
    // Numbered steps pass through and keep resolving inside the array items.
    assert_eq!(
        index.convert_title_column("R title:0:C title").unwrap(),
        "testR/0/testC"
    );
    // Item titles resolve whether or not the field is in the rollUp list.
    assert_eq!(
        index.convert_title_column("R title:C title").unwrap(),
        "testR/testC"
    );
}

#[test]
fn rollup_fields_follow_declaration_order() {
    let index = contracting_schema();
    let fields = index.rollup_fields(&parse_field_path("testR").unwrap());
    // rollUp lists ["id", "testB"]; item properties declare id before testB.
    assert_eq!(fields, vec!["id", "testB"]);
    assert!(index.rollup_fields(&parse_field_path("testSA").unwrap()).is_empty());
}

#[test]
fn ref_items_name_sub_sheets() {
    let schema = json!({
        "properties": {
            "c": {
                "type": "array",
                "items": {"$ref": "#/testB"}
            }
        },
        "testB": {
            "type": "object",
            "properties": {
                "d": {"type": "string"},
                "f": {"type": "string"}
            }
        }
    });
    let index = SchemaIndex::from_value(&schema).unwrap();
    let path = parse_field_path("c").unwrap();
    assert_eq!(index.sub_sheet_name(&path), Some("testB"));
    assert_eq!(index.field_for_sub_sheet("testB"), Some("c"));
    // Without a $ref the sheet is named after the field itself.
    assert_eq!(index.field_for_sub_sheet("c"), Some("c"));
}

#[test]
fn unresolved_refs_are_fatal() {
    let schema = json!({
        "properties": {
            "c": {"type": "array", "items": {"$ref": "#/nowhere"}}
        }
    });
    match SchemaIndex::from_value(&schema) {
        Err(SchemaError::UnresolvedRef { reference }) => assert_eq!(reference, "#/nowhere"),
        other => panic!("expected an unresolved-ref error, got {other:?}"),
    }
}

#[test]
fn cyclic_refs_stop_expanding() {
    let schema = json!({
        "properties": {
            "node": {"$ref": "#/definitions/node"}
        },
        "definitions": {
            "node": {
                "type": "object",
                "properties": {
                    "child": {"$ref": "#/definitions/node"},
                    "label": {"type": "string"}
                }
            }
        }
    });
    let index = SchemaIndex::from_value(&schema).expect("cycle does not hang the loader");
    let node = index.resolve(&parse_field_path("node/label").unwrap());
    assert_eq!(node.unwrap().schema_type, Some(SchemaType::String));
}

#[test]
fn schema_must_be_an_object() {
    match SchemaIndex::from_value(&json!([1, 2])) {
        Err(SchemaError::RootNotObject) => {}
        other => panic!("expected a root-shape error, got {other:?}"),
    }
}
