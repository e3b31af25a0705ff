use std::fmt;

/// Errors surfaced at the public API boundary.
///
/// Shape errors are programmer errors: they are reported as soon as a call
/// receives a vector or tensor that does not match the layer schedule.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    InvalidShape(String),
    InvalidConfig(String),
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidShape(msg) => write!(f, "invalid shape: {msg}"),
            Error::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Error::InvalidData(msg) => write!(f, "invalid data: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(feature = "serde")]
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidData(format!("json: {err}"))
    }
}
