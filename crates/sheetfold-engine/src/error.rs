use sheetfold_parse::ColumnPathError;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal engine errors. Everything recoverable is a
/// [`sheetfold_common::Warning`] instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("cannot supply both a JSON file and an in-memory document")]
    ConflictingInputs,
    #[error("no JSON input was supplied")]
    MissingInput,
    #[error("failed to read `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("badly formed JSON in `{path}`")]
    BadJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("expected a list of records under `{path}`")]
    RootListMissing { path: String },
    #[error(transparent)]
    Column(#[from] ColumnPathError),
}
