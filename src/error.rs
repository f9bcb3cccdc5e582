use std::fmt;

use crate::cell::PieceKind;
use crate::location::Location;

/// Reasons a board cannot be generated with the requested parameters.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigurationError {
    /// Generated boards must be at least 2 cells on a side.
    #[allow(missing_docs)]
    GridTooSmall { size: usize },
    /// Sources and targets together must leave at least one cell free.
    #[allow(missing_docs)]
    TooManyEndpoints { sources: usize, targets: usize, cells: usize },
    /// Every piece weight was zero, so no filler piece can be chosen.
    NoPieceWeights,
    /// Solvable layouts were required but none turned up in time.
    #[allow(missing_docs)]
    NoSolvableLayout { attempts: u32 },
    /// Every layout tried was solved before any piece turned.
    #[allow(missing_docs)]
    NoUnsolvedLayout { attempts: u32 },
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::GridTooSmall { size } => {
                write!(f, "grid size {size} is below the minimum of 2")
            }
            ConfigurationError::TooManyEndpoints { sources, targets, cells } => write!(
                f,
                "{sources} sources and {targets} targets do not fit in {cells} cells"
            ),
            ConfigurationError::NoPieceWeights => write!(f, "all piece weights are zero"),
            ConfigurationError::NoSolvableLayout { attempts } => {
                write!(f, "no solvable layout found in {attempts} attempts")
            }
            ConfigurationError::NoUnsolvedLayout { attempts } => {
                write!(f, "all {attempts} layouts tried were already solved")
            }
        }
    }
}

impl std::error::Error for ConfigurationError {}

/// A rotation the board refused to perform. The board is left untouched.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InvalidOperation {
    /// The location is not on the board.
    #[allow(missing_docs)]
    OutOfBounds { location: Location },
    /// Sources, targets and empty cells never turn.
    #[allow(missing_docs)]
    Immutable { location: Location, kind: PieceKind },
}

impl fmt::Display for InvalidOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidOperation::OutOfBounds { location } => {
                write!(f, "({}, {}) is off the board", location.0, location.1)
            }
            InvalidOperation::Immutable { location, kind } => {
                write!(f, "{kind:?} at ({}, {}) cannot be rotated", location.0, location.1)
            }
        }
    }
}

impl std::error::Error for InvalidOperation {}

/// Storage read/write or (de)serialization failures.
#[derive(Debug)]
pub enum PersistenceError {
    /// The backing store could not be read or written.
    Io(std::io::Error),
    /// A stored blob exists but is not valid for its key.
    #[allow(missing_docs)]
    Parse { key: String, source: serde_json::Error },
    /// A value could not be turned into JSON.
    #[allow(missing_docs)]
    Serialize { key: String, source: serde_json::Error },
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::Io(e) => write!(f, "I/O error: {e}"),
            PersistenceError::Parse { key, source } => write!(f, "could not parse {key}: {source}"),
            PersistenceError::Serialize { key, source } => {
                write!(f, "could not serialize {key}: {source}")
            }
        }
    }
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistenceError::Io(e) => Some(e),
            PersistenceError::Parse { source, .. } | PersistenceError::Serialize { source, .. } => {
                Some(source)
            }
        }
    }
}

impl From<std::io::Error> for PersistenceError {
    fn from(e: std::io::Error) -> Self {
        PersistenceError::Io(e)
    }
}

/// An imported save bundle was rejected; current state is kept as it was.
#[derive(Debug)]
pub enum ImportFormatError {
    /// Not JSON, or not shaped like a save bundle.
    Malformed(serde_json::Error),
    /// Written by a newer format than this build reads.
    #[allow(missing_docs)]
    UnsupportedVersion { found: u32, supported: u32 },
    /// Well-formed but holding values no session could be in.
    Invalid(String),
}

impl fmt::Display for ImportFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportFormatError::Malformed(e) => write!(f, "malformed save file: {e}"),
            ImportFormatError::UnsupportedVersion { found, supported } => write!(
                f,
                "save file is v{found}, but this build only reads up to v{supported}"
            ),
            ImportFormatError::Invalid(msg) => write!(f, "invalid save file: {msg}"),
        }
    }
}

impl std::error::Error for ImportFormatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImportFormatError::Malformed(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ImportFormatError {
    fn from(e: serde_json::Error) -> Self {
        ImportFormatError::Malformed(e)
    }
}
