//! Error taxonomy.
//!
//! Every fallible call returns a [`NetResult`], an `anyhow::Result`. Failures
//! that callers need to tell apart are raised as a [`NetError`] and can be
//! recovered from the anyhow error, through any context layers, with
//! [`NetErrorExt::net_error`].
use std::fmt;

pub type NetResult<T> = anyhow::Result<T>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetError {
    /// Network name outside of the supported set.
    UnsupportedModel(String),
    /// Builder used in a state where the requested transition is illegal.
    InvalidBuildState(String),
    /// Unknown operation, padding or data format tag.
    UnknownOperation(String),
    /// A branch column with no operation in it.
    EmptyBranch { module: String, column: usize },
    /// `share` pointing past the end of the previous column.
    ShareIndexOutOfRange { module: String, column: usize, position: usize, available: usize },
    ShapeMismatch(String),
    MalformedRecord(String),
    /// Numeric argument outside of its domain (zero channels, zero stride...).
    InvalidParameter(String),
}

impl fmt::Display for NetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use NetError::*;
        match self {
            UnsupportedModel(m) => write!(f, "Unsupported model {m:?}"),
            InvalidBuildState(s) => write!(f, "Invalid build state: {s}"),
            UnknownOperation(s) => write!(f, "Unknown operation: {s}"),
            EmptyBranch { module, column } => {
                write!(f, "Empty branch: column {column} of module {module} has no operation")
            }
            ShareIndexOutOfRange { module, column, position, available } => write!(
                f,
                "Share index out of range: column {column} of module {module} shares position {position}, previous column has {available} operation(s)"
            ),
            ShapeMismatch(s) => write!(f, "Shape mismatch: {s}"),
            MalformedRecord(s) => write!(f, "Malformed record: {s}"),
            InvalidParameter(s) => write!(f, "Invalid parameter: {s}"),
        }
    }
}

impl std::error::Error for NetError {}

pub trait NetErrorExt {
    /// The first [`NetError`] found in the error chain, if any.
    fn net_error(&self) -> Option<&NetError>;
}

impl NetErrorExt for anyhow::Error {
    fn net_error(&self) -> Option<&NetError> {
        self.chain().find_map(|e| e.downcast_ref::<NetError>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn net_error_survives_context() {
        let e: NetResult<()> = Err(NetError::ShapeMismatch("batch 8 vs 4".into()))
            .context("wiring loss")
            .context("building inception3");
        let e = e.unwrap_err();
        assert_eq!(e.net_error(), Some(&NetError::ShapeMismatch("batch 8 vs 4".into())));
        assert!(format!("{e:?}").contains("batch 8 vs 4"));
    }

    #[test]
    fn plain_errors_have_no_kind() {
        let e = anyhow::anyhow!("something else");
        assert!(e.net_error().is_none());
    }
}
