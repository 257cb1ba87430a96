//! Conversion between flat path lists and nested tree objects.

use std::collections::BTreeMap;

use tracing::debug;

use super::objects::ObjectStore;
use super::{Error, Result};
use crate::file_mode::FileMode;
use crate::git_path::GitPath;
use crate::object::{Id, Object, Tree};

/// A file at a `/`-separated path within a snapshot.
#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub struct FlatEntry {
    pub path: String,
    pub mode: FileMode,
    pub id: Id,
}

enum Node {
    Leaf(FileMode, Id),
    Dir(BTreeMap<String, Node>),
}

/// Write one tree object per directory implied by `entries` and return
/// the ID of the root tree.
///
/// Children are written before their parents. Entries within each tree are
/// in name order, so the same set of files always yields the same root ID.
/// An empty list produces the empty tree.
pub fn build(store: &ObjectStore, entries: &[FlatEntry]) -> Result<Id> {
    let mut root = BTreeMap::new();

    for entry in entries {
        let path = GitPath::new(&entry.path).map_err(|source| Error::InvalidPath {
            path: entry.path.clone(),
            source,
        })?;
        insert(&mut root, &entry.path, path.segments().collect(), entry)?;
    }

    let id = write_dir(store, &root)?;
    debug!(root = %id, files = entries.len(), "tree built");
    Ok(id)
}

fn insert(
    dir: &mut BTreeMap<String, Node>,
    full_path: &str,
    segments: Vec<&str>,
    entry: &FlatEntry,
) -> Result<()> {
    let conflict = || {
        Error::corrupt(
            "index",
            format!("`{}` is staged as both a file and a directory", full_path),
        )
    };

    match segments.split_first() {
        Some((name, [])) => {
            if let Some(Node::Dir(_)) = dir.get(*name) {
                return Err(conflict());
            }
            dir.insert(name.to_string(), Node::Leaf(entry.mode, entry.id));
            Ok(())
        }
        Some((name, rest)) => {
            let child = dir
                .entry(name.to_string())
                .or_insert_with(|| Node::Dir(BTreeMap::new()));
            match child {
                Node::Dir(children) => insert(children, full_path, rest.to_vec(), entry),
                Node::Leaf(..) => Err(conflict()),
            }
        }
        None => Ok(()),
    }
}

fn write_dir(store: &ObjectStore, children: &BTreeMap<String, Node>) -> Result<Id> {
    let mut tree = Tree::new();

    for (name, node) in children {
        match node {
            Node::Leaf(mode, id) => tree.add(*mode, name, *id),
            Node::Dir(grandchildren) => {
                let id = write_dir(store, grandchildren)?;
                tree.add(FileMode::Tree, name, id);
            }
        }
    }

    store.write(&Object::Tree(tree))
}

/// List every file reachable from the tree `root`, sorted by path.
///
/// Subdirectories contribute their contents but no entry of their own.
pub fn flatten(store: &ObjectStore, root: &Id) -> Result<Vec<FlatEntry>> {
    let mut out = Vec::new();
    flatten_into(store, root, "", &mut out)?;
    out.sort();
    Ok(out)
}

fn flatten_into(store: &ObjectStore, id: &Id, prefix: &str, out: &mut Vec<FlatEntry>) -> Result<()> {
    let tree = store.read_tree(id)?;

    for entry in tree.entries() {
        let path = if prefix.is_empty() {
            entry.name.clone()
        } else {
            format!("{}/{}", prefix, entry.name)
        };

        if entry.mode.is_tree() {
            flatten_into(store, &entry.id, &path, out)?;
        } else {
            out.push(FlatEntry {
                path,
                mode: entry.mode,
                id: entry.id,
            });
        }
    }

    Ok(())
}
