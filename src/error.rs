//! Errors raised while loading a model or running a query against it.
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A table or observation file does not exist.
    #[error("resource not found: {}", .0.display())]
    ResourceNotFound(PathBuf),
    /// A table line could not be parsed.
    #[error("{file}:{line}: {reason}")]
    MalformedTable {
        file: String,
        line: usize,
        reason: String,
    },
    /// The model lacks a structure the requested query depends on.
    #[error("model error: {0}")]
    Model(String),
    #[error("observation sequence is empty")]
    EmptyObservations,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Map a failure to open `path`, keeping "not found" distinct from other I/O errors.
    pub(crate) fn on_open(path: &std::path::Path, why: std::io::Error) -> Self {
        match why.kind() {
            std::io::ErrorKind::NotFound => Error::ResourceNotFound(path.to_path_buf()),
            _ => Error::Io(why),
        }
    }
}
