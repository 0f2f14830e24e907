use crate::path::{Path, PathStep};
use thiserror::Error;

/// Errors for column names that cannot be lexed at all. Anything that splits
/// into non-empty steps is representable; unknown fields are not an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColumnPathError {
    #[error("column name is empty")]
    EmptyColumn,
    #[error("column `{column}` has an empty step at position {pos}")]
    EmptyStep { column: String, pos: usize },
}

/// Interpret a step as an integer per `^-?\d+$`. Overflowing values fall back
/// to being treated as field names.
pub fn integer_step(step: &str) -> Option<i64> {
    let digits = step.strip_prefix('-').unwrap_or(step);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    step.parse::<i64>().ok()
}

fn classify(step: &str, out: &mut Path) {
    if let Some(n) = integer_step(step) {
        if n >= 0 {
            out.push(PathStep::Index(n as u32));
        } else {
            out.push(PathStep::Anonymous);
        }
        return;
    }
    // `name[]` marks an array hop through the named field, as written by the
    // flatten side in rollup and back-reference columns.
    if let Some(name) = step.strip_suffix("[]") {
        if !name.is_empty() && integer_step(name).is_none() {
            out.push(PathStep::Field(name.to_string()));
            out.push(PathStep::Anonymous);
            return;
        }
    }
    out.push(PathStep::Field(step.to_string()));
}

/// Lex a fieldname-form column (`/`-separated) into a [`Path`].
pub fn parse_field_path(column: &str) -> Result<Path, ColumnPathError> {
    if column.is_empty() {
        return Err(ColumnPathError::EmptyColumn);
    }
    let mut path = Path::new();
    for (pos, step) in column.split('/').enumerate() {
        if step.is_empty() {
            return Err(ColumnPathError::EmptyStep {
                column: column.to_string(),
                pos,
            });
        }
        classify(step, &mut path);
    }
    Ok(path)
}

/// Split a title-form heading (`:`-separated) into raw steps. Outer
/// whitespace on each step is dropped; titles are matched
/// whitespace-insensitively downstream anyway, and passthrough steps should
/// not keep separator padding.
pub fn split_title_steps(column: &str) -> Result<Vec<String>, ColumnPathError> {
    if column.is_empty() {
        return Err(ColumnPathError::EmptyColumn);
    }
    let mut steps = Vec::new();
    for (pos, step) in column.split(':').enumerate() {
        let step = step.trim();
        if step.is_empty() {
            return Err(ColumnPathError::EmptyStep {
                column: column.to_string(),
                pos,
            });
        }
        steps.push(step.to_string());
    }
    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::render_path;

    fn field(name: &str) -> PathStep {
        PathStep::Field(name.to_string())
    }

    #[test]
    fn lexes_plain_fields() {
        let path = parse_field_path("testO/testB").unwrap();
        assert_eq!(path.as_slice(), &[field("testO"), field("testB")]);
    }

    #[test]
    fn lexes_explicit_indices() {
        let path = parse_field_path("testL/0/id").unwrap();
        assert_eq!(
            path.as_slice(),
            &[field("testL"), PathStep::Index(0), field("id")]
        );
    }

    #[test]
    fn negative_indices_are_anonymous() {
        let path = parse_field_path("testR/-1/id").unwrap();
        assert_eq!(
            path.as_slice(),
            &[field("testR"), PathStep::Anonymous, field("id")]
        );
    }

    #[test]
    fn bracket_suffix_is_an_array_hop() {
        let path = parse_field_path("testA[]/testB").unwrap();
        assert_eq!(
            path.as_slice(),
            &[field("testA"), PathStep::Anonymous, field("testB")]
        );
    }

    #[test]
    fn overlong_integers_stay_fields() {
        let path = parse_field_path("99999999999999999999").unwrap();
        assert_eq!(path.as_slice(), &[field("99999999999999999999")]);
    }

    #[test]
    fn empty_inputs_error() {
        assert_eq!(parse_field_path(""), Err(ColumnPathError::EmptyColumn));
        assert_eq!(
            parse_field_path("a//b"),
            Err(ColumnPathError::EmptyStep {
                column: "a//b".into(),
                pos: 1
            })
        );
    }

    #[test]
    fn render_omits_anonymous_steps() {
        let path = parse_field_path("testR/-1/id").unwrap();
        assert_eq!(render_path(&path), "testR/id");
        let path = parse_field_path("testL/0/id").unwrap();
        assert_eq!(render_path(&path), "testL/0/id");
    }

    #[test]
    fn title_steps_split_and_trim() {
        let steps = split_title_steps("B  title : c  title").unwrap();
        assert_eq!(steps, vec!["B  title".to_string(), "c  title".to_string()]);
        assert!(split_title_steps("a::b").is_err());
    }
}
