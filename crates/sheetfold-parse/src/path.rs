use smallvec::SmallVec;
use std::fmt::{self, Display};

/// One step of a column path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathStep {
    /// Descend into an object field.
    Field(String),
    /// Descend into an explicitly numbered array item. The number is an
    /// identity key, not a literal position: output positions follow the
    /// insertion order of distinct keys.
    Index(u32),
    /// Descend into the anonymous array item. Negative integer steps, `[]`
    /// suffixes, and schema-implied array hops all land here; the anonymous
    /// item always occupies the first output position.
    Anonymous,
}

impl PathStep {
    pub fn is_field(&self) -> bool {
        matches!(self, PathStep::Field(_))
    }

    /// True for steps that require an array container (`Index`/`Anonymous`).
    pub fn is_array_step(&self) -> bool {
        matches!(self, PathStep::Index(_) | PathStep::Anonymous)
    }

    pub fn field_name(&self) -> Option<&str> {
        match self {
            PathStep::Field(name) => Some(name.as_str()),
            _ => None,
        }
    }
}

impl Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStep::Field(name) => write!(f, "{name}"),
            PathStep::Index(n) => write!(f, "{n}"),
            PathStep::Anonymous => Ok(()),
        }
    }
}

/// An ordered sequence of steps. Most paths are short; four inline slots
/// cover everything the test corpus produces without spilling.
pub type Path = SmallVec<[PathStep; 4]>;

/// Canonical string form: steps joined by `/`, integers for explicit indices,
/// anonymous steps omitted.
pub fn render_path(steps: &[PathStep]) -> String {
    let mut out = String::new();
    for step in steps {
        if matches!(step, PathStep::Anonymous) {
            continue;
        }
        if !out.is_empty() {
            out.push('/');
        }
        out.push_str(&step.to_string());
    }
    out
}
