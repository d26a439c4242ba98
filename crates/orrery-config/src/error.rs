//! Errors raised while persisting or validating settings.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exists but is not valid RON for [`Config`](crate::Config).
    #[error("malformed settings file: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("settings could not be encoded as RON: {0}")]
    Encode(#[from] ron::Error),

    /// A value parsed but lies outside its usable range.
    #[error("invalid `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}
