//! Represents the concept of an "object": an immutable blob, tree, or commit
//! identified by the hash of its type, length, and content.
//!
//! This module only knows how to turn objects into bytes and back.
//! Placing those bytes on disk is the job of [`crate::repo::objects`].

use std::str;

use thiserror::Error;

mod attribution;
pub use attribution::Attribution;

mod commit;
pub use commit::Commit;

mod id;
pub use id::{check_prefix, Id, ParseIdError, ID_LEN};

mod kind;
pub use kind::Kind;

pub(crate) mod parse_utils;

mod tree;
pub use tree::{Tree, TreeEntry};

/// Reasons why a byte sequence could not be decoded as an object.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum DecodeError {
    #[error("object header is malformed")]
    BadHeader,

    #[error("unknown object type tag `{0}`")]
    UnknownKind(String),

    #[error("header declares {declared} bytes but payload has {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("truncated {0}")]
    Truncated(&'static str),

    #[error("missing {0}")]
    Missing(&'static str),

    #[error("unrecognized file mode `{0}`")]
    BadMode(String),

    #[error("invalid tree entry name `{0}`")]
    BadName(String),

    #[error("malformed {0} line")]
    BadAttribution(&'static str),

    #[error("{0} is not valid UTF-8")]
    InvalidUtf8(&'static str),

    #[error(transparent)]
    BadId(#[from] ParseIdError),
}

/// An object stored (or about to be stored) in a repository.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Object {
    Blob(Vec<u8>),
    Tree(Tree),
    Commit(Commit),
}

impl Object {
    /// Return the kind of the object.
    pub fn kind(&self) -> Kind {
        match self {
            Object::Blob(_) => Kind::Blob,
            Object::Tree(_) => Kind::Tree,
            Object::Commit(_) => Kind::Commit,
        }
    }

    /// Serialize the object's payload (without header).
    pub fn payload(&self) -> Vec<u8> {
        match self {
            Object::Blob(data) => data.clone(),
            Object::Tree(tree) => tree.to_payload(),
            Object::Commit(commit) => commit.to_payload(),
        }
    }

    /// Decode a payload of the given kind.
    pub fn from_payload(kind: Kind, payload: &[u8]) -> Result<Object, DecodeError> {
        match kind {
            Kind::Blob => Ok(Object::Blob(payload.to_vec())),
            Kind::Tree => Ok(Object::Tree(Tree::from_payload(payload)?)),
            Kind::Commit => Ok(Object::Commit(Commit::from_payload(payload)?)),
        }
    }

    /// Serialize the object with its `<type-digit> <length>\0` header.
    ///
    /// These are the exact bytes that are hashed and (compressed) stored.
    pub fn to_framed(&self) -> Vec<u8> {
        let payload = self.payload();
        let mut framed = format!("{} {}\0", self.kind().tag(), payload.len()).into_bytes();
        framed.extend_from_slice(&payload);
        framed
    }

    /// Parse framed bytes (header plus payload), validating the declared length.
    pub fn from_framed(framed: &[u8]) -> Result<Object, DecodeError> {
        let space = framed
            .iter()
            .position(|b| *b == b' ')
            .ok_or(DecodeError::BadHeader)?;
        let (tag, rest) = (&framed[..space], &framed[space + 1..]);

        let nul = rest
            .iter()
            .position(|b| *b == 0)
            .ok_or(DecodeError::BadHeader)?;
        let (len, payload) = (&rest[..nul], &rest[nul + 1..]);

        let kind = Kind::from_tag_slice(tag)
            .ok_or_else(|| DecodeError::UnknownKind(String::from_utf8_lossy(tag).into_owned()))?;

        let declared: usize = str::from_utf8(len)
            .ok()
            .and_then(|len| len.parse().ok())
            .ok_or(DecodeError::BadHeader)?;

        if declared != payload.len() {
            return Err(DecodeError::LengthMismatch {
                declared,
                actual: payload.len(),
            });
        }

        Object::from_payload(kind, payload)
    }

    /// Computes the object's ID from its content, size, and type.
    pub fn id(&self) -> Id {
        Id::for_content(&self.to_framed())
    }

    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Object::Blob(data) => Some(data.as_slice()),
            _ => None,
        }
    }

    pub fn as_tree(&self) -> Option<&Tree> {
        match self {
            Object::Tree(tree) => Some(tree),
            _ => None,
        }
    }

    pub fn as_commit(&self) -> Option<&Commit> {
        match self {
            Object::Commit(commit) => Some(commit),
            _ => None,
        }
    }
}
