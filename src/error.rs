use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("dictionary is not initialized; call `initialize` first")]
    Uninitialized,

    /// A source the lexicon cannot work without is missing or failed to open.
    #[error("required dictionary source `{id}` is unavailable")]
    MissingRequiredSource {
        id: String,
        #[source]
        source: Option<io::Error>,
    },

    #[error("dictionary source `{id}` is unavailable")]
    SourceUnavailable {
        id: String,
        #[source]
        source: Option<io::Error>,
    },

    #[error("failed reading dictionary source `{id}`")]
    SourceRead {
        id: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to start the reload thread")]
    ReloadThread(#[source] io::Error),

    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Identifier of the source this error concerns, if any.
    pub fn source_id(&self) -> Option<&str> {
        match self {
            Error::MissingRequiredSource { id, .. }
            | Error::SourceUnavailable { id, .. }
            | Error::SourceRead { id, .. } => Some(id),
            _ => None,
        }
    }
}
