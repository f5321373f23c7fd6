//! Construction errors.

use std::fmt;

/// Errors from building a [`crate::Z80`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Z80Error {
    /// No memory device was supplied.
    MissingMemory,
    /// No port device was supplied.
    MissingPorts,
}

impl fmt::Display for Z80Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingMemory => write!(f, "Z80 requires a memory device"),
            Self::MissingPorts => write!(f, "Z80 requires a port device"),
        }
    }
}

impl std::error::Error for Z80Error {}
