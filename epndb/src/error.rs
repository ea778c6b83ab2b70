use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure kinds surfaced by the crate.
///
/// Lookup misses, transport failures, bad HTTP statuses, and malformed
/// archive data are deliberately distinct variants so callers can react to
/// each without string matching.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("cannot reach the database: {0}")]
    Network(#[from] reqwest::Error),

    #[error("cannot connect to the database: HTTP {status} for {url}")]
    Http {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("no pulsar named '{0}' in the database")]
    NotFound(String),

    #[error("malformed archive data: {0}")]
    Parse(String),

    #[error("no catalog snapshot at {}; run an update first", .0.display())]
    CacheMissing(PathBuf),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("export failed: {0}")]
    Export(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
