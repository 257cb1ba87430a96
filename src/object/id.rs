use std::fmt;
use std::str::{self, FromStr};

use sha1::{Digest, Sha1};
use thiserror::Error;

/// Number of hex digits retained in an object ID.
///
/// The full SHA-1 digest is 40 hex digits; only the first 20 are kept.
/// Every object already written relies on this length, so it must not change.
pub const ID_LEN: usize = 20;

/// An error which can be returned when parsing an object ID or ID prefix.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum ParseIdError {
    /// Value being parsed is empty.
    #[error("cannot parse object ID from empty string")]
    Empty,

    /// Contains an invalid digit.
    ///
    /// Among other causes, this variant will be constructed when parsing a string that
    /// contains an upper-case letter.
    #[error("value contains invalid digit `{0}`")]
    InvalidDigit(char),

    /// ID string is longer than an object ID can be.
    #[error("value is more than 20 digits long")]
    Overflow,

    /// ID string is shorter than a full object ID.
    #[error("value is less than 20 digits long")]
    Underflow,
}

/// An object ID is a string that identifies an object within a repository.
///
/// It is the lower-case hex rendering of the SHA-1 digest of the object's
/// header and payload, truncated to [`ID_LEN`] characters. The ID is stored
/// as those ASCII characters, which is also how it appears in tree payloads
/// and index entries.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Id {
    hex: [u8; ID_LEN],
}

impl Id {
    /// Compute the ID for a complete object (header and payload).
    pub fn for_content(content: &[u8]) -> Id {
        let digest = hex::encode(Sha1::digest(content));

        let mut hex = [0u8; ID_LEN];
        hex.copy_from_slice(&digest.as_bytes()[..ID_LEN]);
        Id { hex }
    }

    /// Convert a 20-character hex ID to an object ID.
    ///
    /// It is an error if the ID contains anything other than 20 lowercase hex digits.
    pub fn from_hex<T: AsRef<[u8]>>(id: T) -> Result<Id, ParseIdError> {
        let id = id.as_ref();
        check_prefix(id)?;

        if id.len() < ID_LEN {
            return Err(ParseIdError::Underflow);
        }

        let mut hex = [0u8; ID_LEN];
        hex.copy_from_slice(id);
        Ok(Id { hex })
    }

    /// Return the ID as ASCII bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.hex
    }

    /// Return the ID as a string slice.
    pub fn as_str(&self) -> &str {
        // Only hex digits are ever stored, so this can't fail.
        str::from_utf8(&self.hex).unwrap_or_default()
    }

    /// Name of the fan-out directory under `objects/` (first two digits).
    pub fn dir_name(&self) -> &str {
        &self.as_str()[..2]
    }

    /// Name of the object file within its fan-out directory.
    pub fn file_name(&self) -> &str {
        &self.as_str()[2..]
    }

    /// Returns true if this ID begins with the given prefix.
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.as_str().starts_with(prefix)
    }
}

/// Check that `prefix` could be the beginning of an object ID.
pub fn check_prefix<T: AsRef<[u8]>>(prefix: T) -> Result<(), ParseIdError> {
    let prefix = prefix.as_ref();

    if prefix.is_empty() {
        return Err(ParseIdError::Empty);
    }

    if prefix.len() > ID_LEN {
        return Err(ParseIdError::Overflow);
    }

    match prefix.iter().find(|c| !is_hex_digit(**c)) {
        Some(c) => Err(ParseIdError::InvalidDigit(*c as char)),
        None => Ok(()),
    }
}

fn is_hex_digit(c: u8) -> bool {
    matches!(c, b'0'..=b'9' | b'a'..=b'f')
}

impl FromStr for Id {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Id::from_hex(s.as_bytes())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.as_str())
    }
}
