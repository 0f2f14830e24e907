//! Per-row tree building.
//!
//! A row's cells fold into one nested JSON value. Every path prefix gets a
//! shape decision (object, array, or primitive leaf) the first time a column
//! touches it; a later column that disagrees is dropped whole with a
//! [`Warning::ShapeConflict`]. Array items are keyed by identity — a distinct
//! explicit index is a distinct item in first-seen order, and everything
//! anonymous shares the single item at position zero.

use rustc_hash::FxHashMap;
use serde_json::{Map, Value};
use sheetfold_common::{ShapeKind, Warning, WarningSink};
use sheetfold_parse::{PathStep, render_path};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Object,
    Array,
    Leaf,
}

impl Shape {
    fn kind(self) -> ShapeKind {
        match self {
            Shape::Object => ShapeKind::Object,
            Shape::Array => ShapeKind::Array,
            Shape::Leaf => ShapeKind::Primitive,
        }
    }

    fn required_by(step: &PathStep) -> Shape {
        if step.is_array_step() {
            Shape::Array
        } else {
            Shape::Object
        }
    }
}

/// Identity keys for the slots of one array.
#[derive(Debug, Default)]
struct ArraySlots {
    anonymous: Option<usize>,
    explicit: FxHashMap<u32, usize>,
}

impl ArraySlots {
    /// The anonymous item always sits at position 0; creating it late shifts
    /// every explicit item one slot down.
    fn anonymous_pos(&mut self, items: &mut Vec<Value>) -> (usize, bool) {
        match self.anonymous {
            Some(pos) => (pos, false),
            None => {
                items.insert(0, Value::Null);
                for pos in self.explicit.values_mut() {
                    *pos += 1;
                }
                self.anonymous = Some(0);
                (0, true)
            }
        }
    }

    fn explicit_pos(&mut self, items: &mut Vec<Value>, n: u32) -> (usize, bool) {
        match self.explicit.get(&n) {
            Some(&pos) => (pos, false),
            None => {
                items.push(Value::Null);
                let pos = items.len() - 1;
                self.explicit.insert(n, pos);
                (pos, true)
            }
        }
    }
}

/// Shape-prefix keys distinguish the anonymous slot from explicit ones, so
/// they use an internal `-` marker rather than the canonical rendering.
fn step_key(step: &PathStep) -> String {
    match step {
        PathStep::Field(name) => name.clone(),
        PathStep::Index(n) => n.to_string(),
        PathStep::Anonymous => "-".to_string(),
    }
}

fn empty_container(next: &PathStep) -> Value {
    if next.is_array_step() {
        Value::Array(Vec::new())
    } else {
        Value::Object(Map::new())
    }
}

#[derive(Debug)]
pub(crate) struct RowTreeBuilder {
    root: Value,
    shapes: FxHashMap<String, Shape>,
    slots: FxHashMap<String, ArraySlots>,
}

impl RowTreeBuilder {
    pub(crate) fn new() -> Self {
        Self {
            root: Value::Object(Map::new()),
            shapes: FxHashMap::default(),
            slots: FxHashMap::default(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.root.as_object().is_none_or(Map::is_empty)
    }

    pub(crate) fn finish(self) -> Map<String, Value> {
        match self.root {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    /// Fold one cell into the tree. `column` is only used in warnings.
    pub(crate) fn insert(
        &mut self,
        column: &str,
        path: &[PathStep],
        value: Value,
        warnings: &mut WarningSink,
    ) {
        // The document root is an object; a column keyed by a bare integer
        // has nowhere to attach.
        if !path.first().is_some_and(PathStep::is_field) {
            return;
        }

        // First pass: agree on a shape for every prefix before touching the
        // tree, so a conflicting cell is dropped whole and leaves no trace.
        let mut keys: Vec<String> = Vec::with_capacity(path.len());
        let mut prefix_key = String::new();
        for (i, step) in path.iter().enumerate() {
            if i > 0 {
                prefix_key.push('/');
            }
            prefix_key.push_str(&step_key(step));
            keys.push(prefix_key.clone());

            let required = if i + 1 == path.len() {
                Shape::Leaf
            } else {
                Shape::required_by(&path[i + 1])
            };
            if let Some(&existing) = self.shapes.get(&keys[i]) {
                if existing != required {
                    warnings.push(Warning::ShapeConflict {
                        column: column.to_string(),
                        prefix: render_path(&path[..=i]),
                        treated_as: required.kind(),
                    });
                    return;
                }
            }
        }
        for (i, key) in keys.iter().enumerate() {
            let required = if i + 1 == path.len() {
                Shape::Leaf
            } else {
                Shape::required_by(&path[i + 1])
            };
            self.shapes.insert(key.clone(), required);
        }

        // Second pass: materialize containers and place the value.
        let RowTreeBuilder { root, slots, .. } = self;
        let mut value = Some(value);
        let mut cursor: &mut Value = root;
        let mut array_key = String::new();
        for (i, step) in path.iter().enumerate() {
            let last = i + 1 == path.len();
            match step {
                PathStep::Field(name) => {
                    let Some(map) = cursor.as_object_mut() else {
                        return;
                    };
                    if last {
                        if !map.contains_key(name.as_str()) {
                            map.insert(name.clone(), value.take().unwrap_or(Value::Null));
                        }
                        return;
                    }
                    let template = empty_container(&path[i + 1]);
                    cursor = map.entry(name.clone()).or_insert_with(|| template);
                }
                PathStep::Index(_) | PathStep::Anonymous => {
                    let Some(items) = cursor.as_array_mut() else {
                        return;
                    };
                    let slot = slots.entry(array_key.clone()).or_default();
                    let (pos, created) = if let PathStep::Index(n) = step {
                        slot.explicit_pos(items, *n)
                    } else {
                        slot.anonymous_pos(items)
                    };
                    if created {
                        items[pos] = if last {
                            value.take().unwrap_or(Value::Null)
                        } else {
                            empty_container(&path[i + 1])
                        };
                    }
                    if last {
                        // Two cells landed on the same slot: first wins.
                        return;
                    }
                    cursor = &mut items[pos];
                }
            }
            if i > 0 {
                array_key.push('/');
            }
            array_key.push_str(&step_key(step));
        }
    }
}
