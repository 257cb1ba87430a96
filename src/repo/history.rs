//! Walks linear commit history from a starting commit back to the root.

use std::collections::BTreeMap;
use std::fmt;
use std::iter::FusedIterator;

use tracing::debug;

use super::objects::ObjectStore;
use super::refs::{HeadState, Refs};
use super::{Error, Result};
use crate::object::{Commit, Id};

/// The ref names that point at a particular commit.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Decoration {
    /// HEAD is detached at this commit.
    pub detached_head: bool,

    /// HEAD follows this branch, which points at this commit.
    pub head_branch: Option<String>,

    /// Other branches pointing at this commit.
    pub branches: Vec<String>,

    pub tags: Vec<String>,
}

impl Decoration {
    pub fn is_empty(&self) -> bool {
        !self.detached_head
            && self.head_branch.is_none()
            && self.branches.is_empty()
            && self.tags.is_empty()
    }
}

impl fmt::Display for Decoration {
    /// Renders as `HEAD -> master, topic, tag: v1`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();

        if let Some(branch) = &self.head_branch {
            parts.push(format!("HEAD -> {}", branch));
        } else if self.detached_head {
            parts.push("HEAD".to_string());
        }

        parts.extend(self.branches.iter().cloned());
        parts.extend(self.tags.iter().map(|t| format!("tag: {}", t)));

        f.write_str(&parts.join(", "))
    }
}

/// A commit yielded by [`HistoryWalker`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AnnotatedCommit {
    pub id: Id,
    pub commit: Commit,
    pub decoration: Decoration,
}

/// Iterator over a commit and its ancestors, newest first.
///
/// Only linear history can be walked: reaching a commit with more than one
/// parent yields [`Error::UnsupportedHistory`] and ends the iteration.
pub struct HistoryWalker<'a> {
    store: &'a ObjectStore,
    next: Option<Id>,
    head: HeadState,
    branches: BTreeMap<String, Id>,
    tags: BTreeMap<String, Id>,
}

impl<'a> HistoryWalker<'a> {
    /// Start walking at `start`. Ref names are captured now for decoration.
    ///
    /// If `start` is `None`, the walker yields nothing.
    pub fn new(store: &'a ObjectStore, refs: &Refs, start: Option<Id>) -> Result<HistoryWalker<'a>> {
        Ok(HistoryWalker {
            store,
            next: start,
            head: refs.head.state().clone(),
            branches: refs.branches.list_all()?,
            tags: refs.tags.list_all()?,
        })
    }

    fn decorate(&self, id: &Id) -> Decoration {
        let mut decoration = Decoration::default();

        match &self.head {
            HeadState::Detached(head) => decoration.detached_head = head == id,
            HeadState::Symbolic(branch) => {
                if self.branches.get(branch) == Some(id) {
                    decoration.head_branch = Some(branch.clone());
                }
            }
        }

        decoration.branches = self
            .branches
            .iter()
            .filter(|(name, target)| {
                *target == id && decoration.head_branch.as_ref() != Some(*name)
            })
            .map(|(name, _)| name.clone())
            .collect();

        decoration.tags = self
            .tags
            .iter()
            .filter(|(_, target)| *target == id)
            .map(|(name, _)| name.clone())
            .collect();

        decoration
    }

    fn step(&mut self, id: Id) -> Result<AnnotatedCommit> {
        let commit = self.store.read_commit(&id)?;

        if commit.parents().len() > 1 {
            return Err(Error::UnsupportedHistory(id));
        }

        self.next = commit.parent();
        debug!(%id, parent = ?self.next, "history step");

        Ok(AnnotatedCommit {
            id,
            decoration: self.decorate(&id),
            commit,
        })
    }
}

impl<'a> Iterator for HistoryWalker<'a> {
    type Item = Result<AnnotatedCommit>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next.take()?;
        Some(self.step(id))
    }
}

impl<'a> FusedIterator for HistoryWalker<'a> {}
