use std::path::PathBuf;

use thiserror::Error;

use crate::git_path::GitPathError;
use crate::object::{DecodeError, Id, Kind, ParseIdError};

/// Describes the potential error conditions that might arise from repository operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No object, ref, or path matches the given name.
    #[error("not found: {0}")]
    NotFound(String),

    /// An ID prefix matched more than one stored object.
    #[error("ID prefix `{prefix}` is ambiguous ({count} objects match)")]
    AmbiguousPrefix { prefix: String, count: usize },

    /// Stored bytes (object or index) failed to decode.
    #[error("corrupt {what}: {reason}")]
    CorruptObject { what: String, reason: String },

    /// The path has no entry in the staging index.
    #[error("path `{0}` is not staged")]
    NotStaged(String),

    /// A commit with more than one parent was reached while walking history.
    #[error("commit {0} has more than one parent; only linear history is supported")]
    UnsupportedHistory(Id),

    /// HEAD is neither a branch reference nor a commit ID.
    #[error("HEAD is in an invalid state: {0}")]
    InvalidRefState(String),

    /// An object was found but is not of the expected kind.
    #[error("object {id} is a {found}, not a {expected}")]
    WrongKind { id: Id, expected: Kind, found: Kind },

    /// A branch or tag name is not a single valid path segment.
    #[error("invalid ref name `{0}`")]
    InvalidRefName(String),

    /// A branch or tag with this name already exists.
    #[error("ref `{0}` already exists")]
    RefExists(String),

    #[error("invalid object ID: {0}")]
    InvalidId(#[from] ParseIdError),

    #[error("invalid path `{path}`: {source}")]
    InvalidPath {
        path: String,
        #[source]
        source: GitPathError,
    },

    #[error("invalid config: {0}")]
    InvalidConfig(#[from] toml::de::Error),

    #[error("work dir doesn't exist: {0}")]
    WorkDirDoesntExist(PathBuf),

    #[error("not a repository (missing {0})")]
    GitDirDoesntExist(PathBuf),

    #[error("repository already exists at {0}")]
    GitDirShouldntExist(PathBuf),

    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn corrupt<W: ToString, R: ToString>(what: W, reason: R) -> Error {
        Error::CorruptObject {
            what: what.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn decode(id: &Id, err: DecodeError) -> Error {
        Error::corrupt(format!("object {}", id), err)
    }
}

/// A specialized `Result` type for repository operations.
pub type Result<T> = std::result::Result<T, Error>;
