pub mod profile_store;
pub mod script_io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed profiles file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("No configuration directory available")]
    NoConfigDir,
    #[error("Unknown profile '{0}'")]
    UnknownProfile(String),
}

impl Error {
    pub(crate) fn io(path: impl std::fmt::Display, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_string(),
            source,
        }
    }
}
