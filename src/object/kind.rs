use std::fmt::{self, Display, Formatter};

/// Describes the fundamental object type (commit, tree, or blob).
///
/// We use the word `kind` here to avoid conflict with the Rust reserved word `type`.
///
/// On disk, the kind is recorded as a single ASCII digit at the start of the
/// object header rather than as a name: `1` for commits, `2` for trees, and
/// `3` for blobs.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Kind {
    Commit,
    Tree,
    Blob,
}

impl Kind {
    /// Return the numeric tag used in the object header.
    pub fn tag(self) -> u8 {
        match self {
            Kind::Commit => 1,
            Kind::Tree => 2,
            Kind::Blob => 3,
        }
    }

    /// Parse the ASCII digits found in an object header.
    ///
    /// Returns `None` if the value is not one of the recognized tags.
    pub fn from_tag_slice(tag: &[u8]) -> Option<Kind> {
        match tag {
            b"1" => Some(Kind::Commit),
            b"2" => Some(Kind::Tree),
            b"3" => Some(Kind::Blob),
            _ => None,
        }
    }

    /// Parse the human-readable name (as accepted by `hash-object -t`).
    pub fn from_name(name: &str) -> Option<Kind> {
        match name {
            "commit" => Some(Kind::Commit),
            "tree" => Some(Kind::Tree),
            "blob" => Some(Kind::Blob),
            _ => None,
        }
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Kind::Commit => write!(f, "commit"),
            Kind::Tree => write!(f, "tree"),
            Kind::Blob => write!(f, "blob"),
        }
    }
}
