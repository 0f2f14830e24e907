//! Recoverable-condition reporting.
//!
//! The engine never aborts on malformed columns or merge disagreements; it
//! records a [`Warning`] in an ordered [`WarningSink`] and carries on. The
//! rendered message text is part of the public contract and is pinned by the
//! integration suites.

use std::fmt::{self, Display};

/// The container shape a column implies for some path prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Object,
    Array,
    Primitive,
}

impl ShapeKind {
    /// Rendering with its indefinite article, as used in warning messages.
    pub fn with_article(self) -> &'static str {
        match self {
            ShapeKind::Object => "an object",
            ShapeKind::Array => "an array",
            ShapeKind::Primitive => "a primitive",
        }
    }
}

/// A recoverable condition encountered while transforming.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// A column was dropped because it disagrees with an earlier column about
    /// the shape of a path prefix.
    ShapeConflict {
        column: String,
        prefix: String,
        treated_as: ShapeKind,
    },
    /// Two rows supplied different values for the same leaf of the same
    /// object; the first value was kept.
    MergeConflict {
        field: String,
        /// Root-id field name and value, when a root id is configured and the
        /// object carries one.
        root_id: Option<(String, String)>,
        id: String,
        sheet: String,
        first: String,
        second: String,
    },
    /// A rollup column could not be filled because the array holds more than
    /// one item; the sentinel was written instead.
    RollupTooManyValues { field: String },
}

impl Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::ShapeConflict {
                column,
                prefix,
                treated_as,
            } => write!(
                f,
                "Column {column} has been ignored, because it treats {prefix} as {}, but another column does not.",
                treated_as.with_article()
            ),
            Warning::MergeConflict {
                field,
                root_id,
                id,
                sheet,
                first,
                second,
            } => {
                write!(f, "Conflict when merging field \"{field}\" for ")?;
                if let Some((name, value)) = root_id {
                    write!(f, "{name} \"{value}\", ")?;
                }
                write!(f, "id \"{id}\" in sheet {sheet}: \"{first}\" != \"{second}\"")
            }
            Warning::RollupTooManyValues { field } => write!(
                f,
                "Could not provide rollup for {field}: more than one value supplied, consult the relevant sub-sheet for the data."
            ),
        }
    }
}

/// Ordered accumulator for warnings. One sink lives for the duration of a
/// transform and is drained by the caller at the end.
#[derive(Debug, Default)]
pub struct WarningSink {
    warnings: Vec<Warning>,
}

impl WarningSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, warning: Warning) {
        #[cfg(feature = "tracing")]
        tracing::warn!("{warning}");
        self.warnings.push(warning);
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn as_slice(&self) -> &[Warning] {
        &self.warnings
    }

    /// Rendered message per warning, in emission order.
    pub fn messages(&self) -> Vec<String> {
        self.warnings.iter().map(|w| w.to_string()).collect()
    }

    pub fn into_inner(self) -> Vec<Warning> {
        self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_conflict_message() {
        let w = Warning::ShapeConflict {
            column: "newtest/0/a".into(),
            prefix: "newtest".into(),
            treated_as: ShapeKind::Array,
        };
        assert_eq!(
            w.to_string(),
            "Column newtest/0/a has been ignored, because it treats newtest as an array, but another column does not."
        );
    }

    #[test]
    fn merge_conflict_message() {
        let w = Warning::MergeConflict {
            field: "testB".into(),
            root_id: Some(("ocid".into(), "1".into())),
            id: "2".into(),
            sheet: "testA".into(),
            first: "4".into(),
            second: "5".into(),
        };
        assert_eq!(
            w.to_string(),
            "Conflict when merging field \"testB\" for ocid \"1\", id \"2\" in sheet testA: \"4\" != \"5\""
        );
    }

    #[test]
    fn merge_conflict_message_without_root_id() {
        let w = Warning::MergeConflict {
            field: "testB".into(),
            root_id: None,
            id: "2".into(),
            sheet: "sub".into(),
            first: "4".into(),
            second: "5".into(),
        };
        assert_eq!(
            w.to_string(),
            "Conflict when merging field \"testB\" for id \"2\" in sheet sub: \"4\" != \"5\""
        );
    }

    #[test]
    fn rollup_message_names_the_field() {
        let w = Warning::RollupTooManyValues {
            field: "testA".into(),
        };
        assert!(w.to_string().starts_with("Could not provide rollup"));
        assert!(w.to_string().contains("testA"));
    }
}
