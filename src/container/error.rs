use std::path::PathBuf;

use crate::fsutil;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid container name: {0}")]
    InvalidContainerName(String),
    #[error("container `{name}` not found: no configuration at `{path}`")]
    NotFound { name: String, path: PathBuf },
    #[error("failed to read configuration of container `{name}`: {source}")]
    ConfigRead {
        name: String,
        #[source]
        source: fsutil::FileReadError,
    },
    #[error("failed to list active containers in `{path}`: {source}")]
    List {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
pub type Result<T> = std::result::Result<T, Error>;
