use std::str;

use super::{
    parse_utils::{header, next_line},
    Attribution, DecodeError, Id,
};

/// A snapshot of a tree plus its ancestry, authorship, and message.
///
/// New commits have at most one parent. Decoding keeps every `parent`
/// line it finds so that history traversal can reject merge commits
/// instead of silently following only one side.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Commit {
    tree: Id,
    parents: Vec<Id>,
    author: Attribution,
    committer: Attribution,
    message: String,
}

impl Commit {
    /// Create a commit with zero or one parent.
    ///
    /// The author also serves as committer.
    pub fn new(tree: Id, parent: Option<Id>, author: Attribution, message: &str) -> Commit {
        Commit::with_parents(tree, parent.into_iter().collect(), author, message)
    }

    /// Create a commit with an arbitrary parent list.
    ///
    /// Such commits can be stored and read back, but history traversal
    /// refuses to walk through any commit with more than one parent.
    pub fn with_parents(tree: Id, parents: Vec<Id>, author: Attribution, message: &str) -> Commit {
        Commit {
            tree,
            parents,
            committer: author.clone(),
            author,
            message: message.to_string(),
        }
    }

    pub fn tree(&self) -> Id {
        self.tree
    }

    pub fn parents(&self) -> &[Id] {
        &self.parents
    }

    /// Returns the sole parent, if there is exactly one.
    pub fn parent(&self) -> Option<Id> {
        match self.parents.as_slice() {
            [parent] => Some(*parent),
            _ => None,
        }
    }

    pub fn author(&self) -> &Attribution {
        &self.author
    }

    pub fn committer(&self) -> &Attribution {
        &self.committer
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn to_payload(&self) -> Vec<u8> {
        let mut content = format!("tree {}\n", self.tree);
        for parent in &self.parents {
            content.push_str(&format!("parent {}\n", parent));
        }
        content.push_str(&format!("author {}\n", self.author));
        content.push_str(&format!("committer {}\n", self.committer));
        content.push('\n');
        content.push_str(&self.message);
        content.into_bytes()
    }

    pub fn from_payload(payload: &[u8]) -> Result<Commit, DecodeError> {
        let (line, mut rest) = next_line(payload).ok_or(DecodeError::Missing("tree"))?;
        let tree = header(line, b"tree").ok_or(DecodeError::Missing("tree"))?;
        let tree = Id::from_hex(tree)?;

        let mut parents = Vec::new();
        let line = loop {
            let (line, after) = next_line(rest).ok_or(DecodeError::Missing("author"))?;
            rest = after;
            match header(line, b"parent") {
                Some(parent) => parents.push(Id::from_hex(parent)?),
                None => break line,
            }
        };

        let author = header(line, b"author").ok_or(DecodeError::Missing("author"))?;
        let author = Attribution::parse(author).ok_or(DecodeError::BadAttribution("author"))?;

        let (line, after) = next_line(rest).ok_or(DecodeError::Missing("committer"))?;
        rest = after;
        let committer = header(line, b"committer").ok_or(DecodeError::Missing("committer"))?;
        let committer =
            Attribution::parse(committer).ok_or(DecodeError::BadAttribution("committer"))?;

        // A blank line separates the headers from the message.
        let message = match next_line(rest) {
            Some((b"", message)) => message,
            Some(_) => return Err(DecodeError::Missing("blank line before message")),
            None => b"",
        };
        let message = str::from_utf8(message)
            .map_err(|_| DecodeError::InvalidUtf8("commit message"))?
            .to_string();

        Ok(Commit {
            tree,
            parents,
            author,
            committer,
            message,
        })
    }
}
