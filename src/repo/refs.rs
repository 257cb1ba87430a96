//! References: `HEAD`, branches (`refs/heads/*`), and tags (`refs/tags/*`).
//!
//! Every reference is a small text file. Branch and tag files contain a
//! bare object ID. `HEAD` contains either `/refs/heads/<name>` (HEAD follows
//! that branch) or a bare object ID (detached HEAD).

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::fsutil::write_atomic;
use super::{Error, Result};
use crate::git_path::GitPath;
use crate::object::Id;

const HEADS_PREFIX: &str = "refs/heads/";

/// What `HEAD` currently refers to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum HeadState {
    /// HEAD follows the named branch. The branch need not exist yet.
    Symbolic(String),

    /// HEAD points directly at a commit.
    Detached(Id),
}

impl HeadState {
    fn parse(text: &str) -> Result<HeadState> {
        let text = text.trim_end();
        let symbolic = text.strip_prefix('/').unwrap_or(text);

        if let Some(branch) = symbolic.strip_prefix(HEADS_PREFIX) {
            return match check_name(branch) {
                Ok(()) => Ok(HeadState::Symbolic(branch.to_string())),
                Err(_) => Err(Error::InvalidRefState(format!(
                    "HEAD follows invalid branch name `{}`",
                    branch
                ))),
            };
        }

        Id::from_hex(text)
            .map(HeadState::Detached)
            .map_err(|_| Error::InvalidRefState(format!("HEAD contains `{}`", text)))
    }

    fn render(&self) -> String {
        match self {
            HeadState::Symbolic(branch) => format!("/{}{}", HEADS_PREFIX, branch),
            HeadState::Detached(id) => id.to_string(),
        }
    }
}

impl fmt::Display for HeadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeadState::Symbolic(branch) => write!(f, "branch {}", branch),
            HeadState::Detached(id) => write!(f, "detached at {}", id),
        }
    }
}

/// Where `HEAD` should be moved to by [`Head::point_to`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum HeadTarget {
    Branch(String),
    Commit(Id),
}

/// The repository's `HEAD` reference.
#[derive(Debug)]
pub struct Head {
    git_dir: PathBuf,
    state: HeadState,
}

impl Head {
    /// Write a fresh `HEAD` that follows `branch`.
    pub(crate) fn init(git_dir: &Path, branch: &str) -> Result<Head> {
        let head = Head {
            git_dir: git_dir.to_path_buf(),
            state: HeadState::Symbolic(branch.to_string()),
        };
        head.persist()?;
        Ok(head)
    }

    /// Read `HEAD` from the given `.git` directory.
    pub fn load(git_dir: &Path) -> Result<Head> {
        let text = fs::read_to_string(git_dir.join("HEAD"))?;
        Ok(Head {
            git_dir: git_dir.to_path_buf(),
            state: HeadState::parse(&text)?,
        })
    }

    pub fn state(&self) -> &HeadState {
        &self.state
    }

    /// Name of the branch HEAD follows, or `None` if detached.
    pub fn branch_name(&self) -> Option<&str> {
        match &self.state {
            HeadState::Symbolic(branch) => Some(branch),
            HeadState::Detached(_) => None,
        }
    }

    /// The commit HEAD resolves to.
    ///
    /// Returns `None` if HEAD follows a branch that has no commits yet.
    pub fn current_commit(&self) -> Result<Option<Id>> {
        match &self.state {
            HeadState::Symbolic(branch) => RefNamespace::branches(&self.git_dir).find(branch),
            HeadState::Detached(id) => Ok(Some(*id)),
        }
    }

    /// Record a new commit on whatever HEAD refers to.
    ///
    /// A followed branch is moved (and created if this is its first commit);
    /// a detached HEAD is moved itself.
    pub fn advance(&mut self, id: Id) -> Result<()> {
        if let HeadState::Symbolic(branch) = &self.state {
            return RefNamespace::branches(&self.git_dir).set_target(branch, id);
        }

        self.state = HeadState::Detached(id);
        self.persist()
    }

    /// Repoint HEAD to a branch or commit, updating the file immediately.
    pub fn point_to(&mut self, target: HeadTarget) -> Result<()> {
        self.state = match target {
            HeadTarget::Branch(branch) => {
                check_name(&branch)?;
                HeadState::Symbolic(branch)
            }
            HeadTarget::Commit(id) => HeadState::Detached(id),
        };
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        write_atomic(&self.git_dir.join("HEAD"), self.state.render().as_bytes())?;
        debug!(head = %self.state, "HEAD updated");
        Ok(())
    }
}

/// `HEAD` plus the branch and tag namespaces of one repository.
#[derive(Debug)]
pub struct Refs {
    pub head: Head,
    pub branches: RefNamespace,
    pub tags: RefNamespace,
}

impl Refs {
    pub fn load(git_dir: &Path) -> Result<Refs> {
        Ok(Refs {
            head: Head::load(git_dir)?,
            branches: RefNamespace::branches(git_dir),
            tags: RefNamespace::tags(git_dir),
        })
    }
}

/// A directory of references named by single path segments:
/// `refs/heads` for branches or `refs/tags` for tags.
#[derive(Clone, Debug)]
pub struct RefNamespace {
    dir: PathBuf,
    label: &'static str,
}

impl RefNamespace {
    pub fn branches(git_dir: &Path) -> RefNamespace {
        RefNamespace {
            dir: git_dir.join("refs").join("heads"),
            label: "branch",
        }
    }

    pub fn tags(git_dir: &Path) -> RefNamespace {
        RefNamespace {
            dir: git_dir.join("refs").join("tags"),
            label: "tag",
        }
    }

    /// Returns the ID `name` points to.
    pub fn get(&self, name: &str) -> Result<Id> {
        self.find(name)?
            .ok_or_else(|| Error::NotFound(format!("{} {}", self.label, name)))
    }

    /// Returns the ID `name` points to, or `None` if there is no such ref
    /// (or its file is empty).
    pub fn find(&self, name: &str) -> Result<Option<Id>> {
        check_name(name)?;

        let text = match fs::read_to_string(self.dir.join(name)) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        Id::from_hex(text).map(Some).map_err(|_| {
            Error::InvalidRefState(format!("{} `{}` contains `{}`", self.label, name, text))
        })
    }

    pub fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.find(name)?.is_some())
    }

    /// Point `name` at `id`, creating it if necessary.
    pub fn set_target(&self, name: &str, id: Id) -> Result<()> {
        check_name(name)?;
        fs::create_dir_all(&self.dir)?;
        write_atomic(&self.dir.join(name), id.as_bytes())?;

        debug!(name, %id, kind = self.label, "ref updated");
        Ok(())
    }

    /// Create a new ref. Fails if `name` already exists.
    pub fn create(&self, name: &str, id: Id) -> Result<()> {
        if self.exists(name)? {
            return Err(Error::RefExists(name.to_string()));
        }
        self.set_target(name, id)
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        check_name(name)?;

        match fs::remove_file(self.dir.join(name)) {
            Ok(()) => {
                debug!(name, kind = self.label, "ref deleted");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(Error::NotFound(format!("{} {}", self.label, name)))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// All refs in this namespace, by name.
    ///
    /// Empty ref files are skipped.
    pub fn list_all(&self) -> Result<BTreeMap<String, Id>> {
        let mut refs = BTreeMap::new();

        let dir = match fs::read_dir(&self.dir) {
            Ok(dir) => dir,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(refs),
            Err(err) => return Err(err.into()),
        };

        for entry in dir {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(id) = self.find(&name)? {
                refs.insert(name, id);
            }
        }

        Ok(refs)
    }

    /// Names of all refs in this namespace that point at `id`.
    pub fn names_pointing_at(&self, id: &Id) -> Result<Vec<String>> {
        Ok(self
            .list_all()?
            .into_iter()
            .filter(|(_, target)| target == id)
            .map(|(name, _)| name)
            .collect())
    }
}

/// A ref name is a single, valid path segment.
fn check_name(name: &str) -> Result<()> {
    match GitPath::new(name) {
        Ok(_) if !name.contains('/') => Ok(()),
        _ => Err(Error::InvalidRefName(name.to_string())),
    }
}
