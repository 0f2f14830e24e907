use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashMap;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Lowercase a title and strip every run of whitespace. `B  title` and
/// `btitle` normalize identically, which is what makes heading lookup
/// space- and case-insensitive.
pub(crate) fn normalize_title(title: &str) -> String {
    WHITESPACE.replace_all(&title.to_lowercase(), "").into_owned()
}

/// Declared type of a schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaType {
    Object,
    Array,
    String,
    Integer,
    Number,
    Boolean,
    Null,
}

impl SchemaType {
    pub(crate) fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "object" => SchemaType::Object,
            "array" => SchemaType::Array,
            "string" => SchemaType::String,
            "integer" => SchemaType::Integer,
            "number" => SchemaType::Number,
            "boolean" => SchemaType::Boolean,
            "null" => SchemaType::Null,
            _ => return None,
        })
    }
}

/// One node of the loaded schema tree, mirroring the data it describes.
#[derive(Debug, Clone, Default)]
pub struct SchemaNode {
    pub schema_type: Option<SchemaType>,
    pub title: Option<String>,
    pub properties: IndexMap<String, SchemaNode>,
    pub items: Option<Box<SchemaNode>>,
    /// Field names listed under `rollUp`, in list order.
    pub roll_up: Vec<String>,
    /// Definition name when this node was reached through an internal `$ref`;
    /// used to name sub-sheets on flatten.
    pub ref_name: Option<String>,
    /// Normalized child title -> property name, built eagerly at load.
    pub(crate) titles: FxHashMap<String, String>,
}

impl SchemaNode {
    pub fn is_array(&self) -> bool {
        self.schema_type == Some(SchemaType::Array)
    }

    /// Array of scalar strings: serialized as one `;`-delimited cell rather
    /// than a sub-sheet.
    pub fn is_string_array(&self) -> bool {
        self.is_array()
            && self
                .items
                .as_deref()
                .is_some_and(|items| items.schema_type == Some(SchemaType::String))
    }

    pub fn item(&self) -> Option<&SchemaNode> {
        self.items.as_deref()
    }

    pub fn property(&self, name: &str) -> Option<&SchemaNode> {
        self.properties.get(name)
    }

    /// Reverse title lookup among this node's direct properties.
    pub fn field_for_title(&self, title: &str) -> Option<&str> {
        self.titles.get(&normalize_title(title)).map(String::as_str)
    }

    /// The object context for field lookups at this node: arrays delegate to
    /// their item schema.
    pub(crate) fn object_context(&self) -> &SchemaNode {
        if self.is_array() {
            self.item().unwrap_or(self)
        } else {
            self
        }
    }

    /// Rollup fields of an array node, ordered by the item schema's property
    /// declaration order; `rollUp` entries not declared as properties keep
    /// their list order at the end.
    pub fn rollup_columns(&self) -> Vec<&str> {
        if self.roll_up.is_empty() {
            return Vec::new();
        }
        let mut out: Vec<&str> = Vec::with_capacity(self.roll_up.len());
        if let Some(items) = self.item() {
            for name in items.properties.keys() {
                if self.roll_up.iter().any(|r| r == name) {
                    out.push(name.as_str());
                }
            }
        }
        for name in &self.roll_up {
            if !out.contains(&name.as_str()) {
                out.push(name.as_str());
            }
        }
        out
    }
}
