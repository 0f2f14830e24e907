use crate::node::{SchemaNode, SchemaType, normalize_title};
use serde_json::Value as JsonValue;
use sheetfold_parse::{ColumnPathError, Path, PathStep, integer_step, split_title_steps};
use std::path::PathBuf;
use thiserror::Error;

/// Fatal problems while loading a schema document. Once loaded, schema
/// queries never fail; unknown paths answer `None`.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read schema file `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("schema is not valid JSON")]
    Parse(#[from] serde_json::Error),
    #[error("schema root must be a JSON object")]
    RootNotObject,
    #[error("unresolvable schema reference `{reference}`")]
    UnresolvedRef { reference: String },
}

/// A loaded schema, indexed for the queries the engine needs.
#[derive(Debug, Clone)]
pub struct SchemaIndex {
    root: SchemaNode,
}

impl SchemaIndex {
    pub fn from_value(schema: &JsonValue) -> Result<Self, SchemaError> {
        if !schema.is_object() {
            return Err(SchemaError::RootNotObject);
        }
        let mut visiting = Vec::new();
        let root = build_node(schema, schema, &mut visiting)?;
        Ok(Self { root })
    }

    pub fn from_json_str(text: &str) -> Result<Self, SchemaError> {
        let value: JsonValue = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, SchemaError> {
        let path = path.into();
        let text = std::fs::read_to_string(&path)
            .map_err(|source| SchemaError::Io { path: path.clone(), source })?;
        Self::from_json_str(&text)
    }

    pub fn root(&self) -> &SchemaNode {
        &self.root
    }

    /// Walk the schema along a path. Arrays are transparent to field steps so
    /// that both expanded (`testR/<anon>/id`) and bare (`testR/id`) paths
    /// resolve.
    pub fn resolve(&self, path: &[PathStep]) -> Option<&SchemaNode> {
        let mut node = &self.root;
        for step in path {
            node = match step {
                PathStep::Field(name) => node.object_context().property(name)?,
                PathStep::Index(_) | PathStep::Anonymous => node.item()?,
            };
        }
        Some(node)
    }

    pub fn is_array(&self, path: &[PathStep]) -> bool {
        self.resolve(path).is_some_and(SchemaNode::is_array)
    }

    pub fn is_string_array(&self, path: &[PathStep]) -> bool {
        self.resolve(path).is_some_and(SchemaNode::is_string_array)
    }

    /// Rollup fields declared on the array at `path`, in canonical column
    /// order.
    pub fn rollup_fields(&self, path: &[PathStep]) -> Vec<&str> {
        self.resolve(path)
            .map(SchemaNode::rollup_columns)
            .unwrap_or_default()
    }

    /// Name for the sub-sheet of the array at `path`: the `$ref`'d definition
    /// name of its items, when there is one.
    pub fn sub_sheet_name(&self, path: &[PathStep]) -> Option<&str> {
        self.resolve(path)?.item()?.ref_name.as_deref()
    }

    /// Reverse of [`Self::sub_sheet_name`]: the array field a sub-sheet name
    /// refers to, searching declaration order depth-first.
    pub fn field_for_sub_sheet(&self, sheet: &str) -> Option<&str> {
        fn dfs<'a>(node: &'a SchemaNode, sheet: &str) -> Option<&'a str> {
            for (name, child) in &node.properties {
                if child.is_array() && !child.is_string_array() {
                    let named = child
                        .item()
                        .and_then(|items| items.ref_name.as_deref())
                        .unwrap_or(name.as_str());
                    if named == sheet || name == sheet {
                        return Some(name);
                    }
                }
                if let Some(found) = dfs(child, sheet) {
                    return Some(found);
                }
            }
            if let Some(items) = node.item() {
                return dfs(items, sheet);
            }
            None
        }
        dfs(&self.root, sheet)
    }

    /// Insert the implicit anonymous array hop wherever the schema declares
    /// an array but the column supplies no index (`testR/id` becomes
    /// `testR/<anon>/id`).
    pub fn expand_anonymous(&self, path: &[PathStep]) -> Path {
        let mut out = Path::new();
        let mut node: Option<&SchemaNode> = Some(&self.root);
        let mut iter = path.iter().peekable();
        while let Some(step) = iter.next() {
            match step {
                PathStep::Field(name) => {
                    let child = node.map(SchemaNode::object_context).and_then(|c| c.property(name));
                    out.push(step.clone());
                    if let Some(c) = child {
                        if c.is_array() && matches!(iter.peek(), Some(PathStep::Field(_))) {
                            out.push(PathStep::Anonymous);
                            node = c.item();
                            continue;
                        }
                    }
                    node = child;
                }
                other => {
                    out.push(other.clone());
                    node = node.and_then(SchemaNode::item);
                }
            }
        }
        out
    }

    /// Convert a title-form heading into a fieldname column. Each step is
    /// matched against the titles of the current schema context; a step with
    /// no matching title passes through verbatim and ends schema tracking for
    /// the rest of the heading.
    ///
    /// TODO: headings for the root-id column are matched by fieldname only;
    /// resolving the root-id *title* needs the root id threaded in here and a
    /// decision on where it lives in the schema.
    pub fn convert_title_column(&self, column: &str) -> Result<String, ColumnPathError> {
        let steps = split_title_steps(column)?;
        let mut out: Vec<String> = Vec::with_capacity(steps.len());
        let mut node: Option<&SchemaNode> = Some(&self.root);
        for raw in &steps {
            if integer_step(raw).is_some() {
                out.push(raw.clone());
                node = node.and_then(SchemaNode::item);
                continue;
            }
            let ctx = node.map(SchemaNode::object_context);
            match ctx.and_then(|c| c.field_for_title(raw)) {
                Some(field) => {
                    out.push(field.to_string());
                    node = ctx.and_then(|c| c.property(field));
                }
                None => {
                    out.push(raw.clone());
                    node = None;
                }
            }
        }
        Ok(out.join("/"))
    }
}

fn build_node(
    value: &JsonValue,
    root: &JsonValue,
    visiting: &mut Vec<String>,
) -> Result<SchemaNode, SchemaError> {
    let Some(obj) = value.as_object() else {
        return Ok(SchemaNode::default());
    };

    if let Some(reference) = obj.get("$ref").and_then(JsonValue::as_str) {
        let target = resolve_ref(root, reference)?;
        if visiting.iter().any(|seen| seen == reference) {
            // Schema data is acyclic by construction; a cyclic $ref stops
            // expanding rather than recursing.
            return Ok(SchemaNode::default());
        }
        visiting.push(reference.to_string());
        let mut node = build_node(target, root, visiting)?;
        visiting.pop();
        node.ref_name = reference.rsplit('/').next().map(str::to_string);
        return Ok(node);
    }

    let mut node = SchemaNode {
        schema_type: obj
            .get("type")
            .and_then(JsonValue::as_str)
            .and_then(SchemaType::parse),
        title: obj
            .get("title")
            .and_then(JsonValue::as_str)
            .map(str::to_string),
        ..SchemaNode::default()
    };

    if let Some(props) = obj.get("properties").and_then(JsonValue::as_object) {
        for (name, child) in props {
            let child_node = build_node(child, root, visiting)?;
            if let Some(title) = &child_node.title {
                node.titles.insert(normalize_title(title), name.clone());
            }
            node.properties.insert(name.clone(), child_node);
        }
    }

    if let Some(items) = obj.get("items") {
        node.items = Some(Box::new(build_node(items, root, visiting)?));
    }

    if let Some(roll) = obj.get("rollUp").and_then(JsonValue::as_array) {
        node.roll_up = roll
            .iter()
            .filter_map(JsonValue::as_str)
            .map(str::to_string)
            .collect();
    }

    // Untyped nodes with structure still answer shape queries.
    if node.schema_type.is_none() {
        if !node.properties.is_empty() {
            node.schema_type = Some(SchemaType::Object);
        } else if node.items.is_some() {
            node.schema_type = Some(SchemaType::Array);
        }
    }

    Ok(node)
}

fn resolve_ref<'a>(root: &'a JsonValue, reference: &str) -> Result<&'a JsonValue, SchemaError> {
    let unresolved = || SchemaError::UnresolvedRef {
        reference: reference.to_string(),
    };
    let pointer = reference.strip_prefix("#/").ok_or_else(unresolved)?;
    let mut node = root;
    for segment in pointer.split('/') {
        node = node.get(segment).ok_or_else(unresolved)?;
    }
    Ok(node)
}
