//! Error kinds raised by every component of the crate.
//!
//! All errors are synchronous and raised where they are detected; nothing is
//! retried internally. Note that an FSArray lookup of a state with the wrong
//! photon count is *not* an error (see [`FSArray::find`][crate::fsarray::FSArray::find]).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FockError {
    /// Malformed textual Fock state, annotation, or snapshot contents.
    #[error("format error: {0}")]
    Format(String),

    /// Mismatched mode counts or matrix shapes.
    #[error("dimension error: {0}")]
    Dimension(String),

    /// Out-of-bounds index, slice, or map pair.
    #[error("range error: {0}")]
    Range(String),

    /// A snapshot whose stored `(m, n)` differs from the requested one.
    #[error("consistency error: {0}")]
    Consistency(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}
pub type FockResult<T> = Result<T, FockError>;

impl FockError {
    pub(crate) fn format<S: Into<String>>(msg: S) -> Self {
        Self::Format(msg.into())
    }

    pub(crate) fn dimension<S: Into<String>>(msg: S) -> Self {
        Self::Dimension(msg.into())
    }

    pub(crate) fn range<S: Into<String>>(msg: S) -> Self {
        Self::Range(msg.into())
    }
}

impl From<toml::de::Error> for FockError {
    fn from(err: toml::de::Error) -> Self { Self::Config(err.to_string()) }
}
