use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Malformed delimited data in {} at line {line}: {source}", path.display())]
    Parse {
        path: PathBuf,
        line: u64,
        #[source]
        source: csv::Error,
    },

    #[error("No header row in {}", .0.display())]
    MissingHeader(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug, PartialEq)]
pub enum RecordError {
    #[error("Missing column: {0}")]
    MissingColumn(&'static str),
}

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Graph store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Query failed: {0}")]
    Query(String),
}

/// Failure of a single row: either it could not be read as the expected
/// entity, or the store rejected the write.
#[derive(Error, Debug)]
pub enum UpsertError {
    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

#[derive(Error, Debug)]
pub enum ImportError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Row {row}: {source}")]
    Row {
        row: usize,
        #[source]
        source: UpsertError,
    },

    #[error("Could not open graph session: {0}")]
    Session(#[from] WriteError),
}
