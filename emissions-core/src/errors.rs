use std::path::PathBuf;
use thiserror::Error;

/// Error type for invalid operations.
#[derive(Error, Debug)]
pub enum EmissionsError {
    /// An input source could not be read or parsed at startup. Fatal: there
    /// is no partial dataset, and no retry is attempted.
    #[error("data source unavailable: {path}: {reason}")]
    DataSourceUnavailable { path: PathBuf, reason: String },
    /// The emissions source has zero or more than one unrecognized column,
    /// so the quantity column cannot be identified unambiguously.
    #[error("emissions schema error: {0}")]
    Schema(String),
    /// A derived-view request carried a structurally invalid argument
    /// (e.g. a zero top-N). A caller bug, not a data condition.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Convenience type for `Result<T, EmissionsError>`.
pub type EmissionsResult<T> = Result<T, EmissionsError>;
