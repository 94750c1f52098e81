use std::{io, path::PathBuf};

/// Errors returned by [`crate::Database`] queries.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The caller violated a precondition: a path that isn't relative to the
    /// root, or a reviewer that is neither an email address nor `*`.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A declaration file needed to answer the query is malformed. `line` is
    /// 1-based.
    #[error("{}:{line}: {message}", path.display())]
    Syntax {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// The repository capability failed to read or enumerate a path.
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self, Error::Syntax { .. })
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Error::InvalidInput(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
