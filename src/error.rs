//! Top-level error taxonomy: one enum per component boundary, composed here
//! so every driver can propagate with `?` and `main` can format a single
//! diagnostic line without re-deriving the cause.

use crate::mem::IoError;
use crate::procfs::EnumError;
use crate::process::{AttachError, DetachError};
use crate::scan::ScanError;

#[derive(Debug, thiserror::Error)]
pub enum UsageError {
    #[error("invalid pid {0:?}")]
    Pid(String),
    #[error("invalid mode {0:?}: expected one of search, filter, write")]
    Mode(String),
    #[error(transparent)]
    Value(#[from] crate::value::ValueError),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Usage(#[from] UsageError),
    #[error(transparent)]
    Attach(#[from] AttachError),
    #[error(transparent)]
    Detach(#[from] DetachError),
    #[error(transparent)]
    Enum(#[from] EnumError),
    #[error(transparent)]
    Io(#[from] IoError),
    #[error(transparent)]
    Scan(#[from] ScanError),
}
