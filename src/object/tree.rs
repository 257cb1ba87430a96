use std::str;

use super::{parse_utils::split_once, DecodeError, Id, ID_LEN};
use crate::file_mode::FileMode;

/// One named child of a [`Tree`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TreeEntry {
    pub mode: FileMode,
    pub name: String,
    pub id: Id,
}

/// A directory snapshot: a mapping from entry name to (mode, object ID).
///
/// Entries are kept in the order they were added; adding a name that is
/// already present replaces the earlier entry in place.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    /// Create an empty tree.
    pub fn new() -> Tree {
        Tree::default()
    }

    /// Add (or replace) the entry for `name`.
    pub fn add(&mut self, mode: FileMode, name: &str, id: Id) {
        let entry = TreeEntry {
            mode,
            name: name.to_string(),
            id,
        };

        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Look up the entry for `name`.
    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize as repeated `<mode> <name>\0<id>` records.
    pub fn to_payload(&self) -> Vec<u8> {
        let mut payload = Vec::new();
        for entry in &self.entries {
            payload.extend_from_slice(entry.mode.to_octal_string().as_bytes());
            payload.push(b' ');
            payload.extend_from_slice(entry.name.as_bytes());
            payload.push(0);
            payload.extend_from_slice(entry.id.as_bytes());
        }
        payload
    }

    /// Parse a tree payload.
    pub fn from_payload(payload: &[u8]) -> Result<Tree, DecodeError> {
        let mut tree = Tree::new();
        let mut rest = payload;

        while !rest.is_empty() {
            if !rest.contains(&b' ') {
                return Err(DecodeError::Truncated("tree entry mode"));
            }
            let (mode, after_mode) = split_once(rest, &b' ');
            let mode = FileMode::from_octal_slice(mode)
                .ok_or_else(|| DecodeError::BadMode(String::from_utf8_lossy(mode).into_owned()))?;

            if !after_mode.contains(&0) {
                return Err(DecodeError::Truncated("tree entry name"));
            }
            let (name, after_name) = split_once(after_mode, &0);
            let name = str::from_utf8(name).map_err(|_| DecodeError::InvalidUtf8("tree entry name"))?;
            if name.is_empty() || name.contains('/') {
                return Err(DecodeError::BadName(name.to_string()));
            }

            if after_name.len() < ID_LEN {
                return Err(DecodeError::Truncated("tree entry ID"));
            }
            let id = Id::from_hex(&after_name[..ID_LEN])?;

            tree.add(mode, name, id);
            rest = &after_name[ID_LEN..];
        }

        Ok(tree)
    }
}
