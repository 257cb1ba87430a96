//! A repository stored on the local file system.
//!
//! The `.git` directory layout follows command-line git where the formats
//! overlap (`HEAD`, `refs/heads`, `refs/tags`, fanned-out `objects`), but
//! object IDs, object headers, and the index encoding are this crate's own.
//!
//! All state lives on disk. Each operation reads what it needs and writes
//! its results back before returning; an [`OnDisk`] value only remembers
//! where the repository is and what its config said when it was opened.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

mod error;
pub use error::{Error, Result};

pub mod config;
pub use config::Config;

mod fsutil;

pub mod history;
pub use history::{AnnotatedCommit, Decoration, HistoryWalker};

pub mod index;
pub use index::{FileStat, StagingEntry, StagingIndex};

pub mod objects;
pub use objects::ObjectStore;

pub mod refs;
pub use refs::{Head, HeadState, HeadTarget, RefNamespace, Refs};

pub mod tree_builder;
pub use tree_builder::FlatEntry;

use crate::file_mode::FileMode;
use crate::object::{Attribution, Commit, Id, Object};

/// Branch that a freshly-initialized repository's HEAD follows.
pub const DEFAULT_BRANCH: &str = "master";

/// A staged file whose working-tree content no longer matches the index,
/// as two line sequences for an external diff.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DiffInput {
    pub path: String,
    pub staged_lines: Vec<String>,

    /// Empty if the file has been deleted.
    pub working_lines: Vec<String>,
}

/// Staged paths whose working-tree files differ from the index.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Status {
    pub modified: Vec<String>,
    pub deleted: Vec<String>,
}

impl Status {
    pub fn is_clean(&self) -> bool {
        self.modified.is_empty() && self.deleted.is_empty()
    }
}

/// A repository rooted at a working directory with a `.git` directory inside.
#[derive(Debug)]
pub struct OnDisk {
    work_dir: PathBuf,
    git_dir: PathBuf,
    objects: ObjectStore,
    config: Config,
}

impl OnDisk {
    /// Open an existing repository.
    ///
    /// `work_dir` should be the top-level working directory. A `.git` directory should
    /// exist at this path. Use `init` function to create an empty repository if
    /// necessary.
    pub fn new(work_dir: &Path) -> Result<Self> {
        let work_dir = work_dir.to_path_buf();
        if !work_dir.exists() {
            return Err(Error::WorkDirDoesntExist(work_dir));
        }

        let git_dir = work_dir.join(".git");
        if !git_dir.exists() {
            return Err(Error::GitDirDoesntExist(git_dir));
        }

        let config = Config::load(&git_dir.join("config"))?;
        debug!(work_dir = %work_dir.display(), "opened repository");

        Ok(OnDisk {
            objects: ObjectStore::new(&git_dir.join("objects")),
            work_dir,
            git_dir,
            config,
        })
    }

    /// Creates a new, empty repository.
    ///
    /// HEAD follows `master`, which has no commits yet.
    pub fn init(work_dir: &Path) -> Result<Self> {
        if !work_dir.exists() {
            return Err(Error::WorkDirDoesntExist(work_dir.to_path_buf()));
        }

        let git_dir = work_dir.join(".git");
        if git_dir.exists() {
            return Err(Error::GitDirShouldntExist(git_dir));
        }

        fs::create_dir_all(&git_dir)?;

        let config = Config::default();
        create_config(&git_dir, &config)?;
        create_description(&git_dir)?;
        create_hooks_dir(&git_dir)?;
        create_info_dir(&git_dir)?;
        create_objects_dir(&git_dir)?;
        create_refs_dir(&git_dir)?;
        Head::init(&git_dir, DEFAULT_BRANCH)?;

        info!(git_dir = %git_dir.display(), "initialized empty repository");

        Ok(OnDisk {
            objects: ObjectStore::new(&git_dir.join("objects")),
            work_dir: work_dir.to_path_buf(),
            git_dir,
            config,
        })
    }

    /// Return the working directory for this repo.
    pub fn work_dir(&self) -> &Path {
        self.work_dir.as_path()
    }

    /// Return the path to the `.git` directory.
    pub fn git_dir(&self) -> &Path {
        self.git_dir.as_path()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn objects(&self) -> &ObjectStore {
        &self.objects
    }

    /// Read the current state of HEAD, branches, and tags.
    pub fn refs(&self) -> Result<Refs> {
        Refs::load(&self.git_dir)
    }

    fn index_path(&self) -> PathBuf {
        self.git_dir.join("index")
    }

    pub fn index(&self) -> Result<StagingIndex> {
        StagingIndex::load(&self.index_path())
    }

    /// Stage the working-tree file at `path` (relative to the work dir).
    ///
    /// Analogous to `git add <path>`.
    pub fn stage_file(&self, path: &str) -> Result<Id> {
        let file = self.work_dir.join(path);
        let metadata = fs::symlink_metadata(&file).map_err(|err| not_found(err, path))?;
        let content = read_working_file(&file, &metadata).map_err(|err| not_found(err, path))?;

        let mut index = self.index()?;
        let id = index.stage(
            &self.objects,
            path,
            &content,
            FileMode::from_metadata(&metadata),
            FileStat::from_metadata(&metadata),
        )?;
        index.save(&self.index_path())?;

        Ok(id)
    }

    /// Remove `path` from the index. The working-tree file is untouched.
    ///
    /// Analogous to `git rm --cached <path>`.
    pub fn unstage(&self, path: &str) -> Result<()> {
        let mut index = self.index()?;
        index.unstage(path)?;
        index.save(&self.index_path())
    }

    pub fn staged_entries(&self) -> Result<Vec<StagingEntry>> {
        Ok(self.index()?.entries().cloned().collect())
    }

    /// Record the index as a new commit on top of HEAD and advance HEAD.
    ///
    /// Writes, in order: the tree objects, the commit object, the ref.
    pub fn commit(&self, message: &str) -> Result<Id> {
        let index = self.index()?;
        let tree = tree_builder::build(&self.objects, &index.to_flat())?;

        let mut refs = self.refs()?;
        let parent = refs.head.current_commit()?;

        let (name, email) = self.config.author();
        let commit = Commit::new(tree, parent, Attribution::now(&name, &email), message);
        let id = self.objects.write(&Object::Commit(commit))?;

        refs.head.advance(id)?;

        info!(%id, %tree, parent = ?parent, head = %refs.head.state(), "committed");
        Ok(id)
    }

    /// Walk history from HEAD. Yields nothing if there are no commits yet.
    pub fn log(&self) -> Result<HistoryWalker<'_>> {
        let refs = self.refs()?;
        let start = refs.head.current_commit()?;
        HistoryWalker::new(&self.objects, &refs, start)
    }

    /// Interpret `name` as a branch, then a tag, then a commit ID prefix.
    ///
    /// A tag resolves to the commit it names, so checking it out detaches HEAD.
    pub fn resolve_commit(&self, name: &str) -> Result<HeadTarget> {
        let refs = self.refs()?;

        // Names that can't be refs (e.g. containing `/`) can still be ID prefixes.
        match refs.branches.find(name) {
            Ok(Some(_)) => return Ok(HeadTarget::Branch(name.to_string())),
            Ok(None) | Err(Error::InvalidRefName(_)) => (),
            Err(err) => return Err(err),
        }

        match refs.tags.find(name) {
            Ok(Some(id)) => return Ok(HeadTarget::Commit(id)),
            Ok(None) | Err(Error::InvalidRefName(_)) => (),
            Err(err) => return Err(err),
        }

        let id = self.objects.resolve(name).map_err(|err| match err {
            Error::InvalidId(_) => Error::NotFound(format!("branch, tag, or commit `{}`", name)),
            err => err,
        })?;
        self.objects.read_commit(&id)?;

        Ok(HeadTarget::Commit(id))
    }

    fn target_commit(&self, target: &HeadTarget) -> Result<Id> {
        match target {
            HeadTarget::Branch(branch) => self.refs()?.branches.get(branch),
            HeadTarget::Commit(id) => Ok(*id),
        }
    }

    /// Move HEAD to `name` and reset the index to that commit's tree.
    ///
    /// If `restore_working_tree` is set, every file in that tree is also
    /// written into the working directory. Files not in the tree are left alone.
    pub fn checkout(&self, name: &str, restore_working_tree: bool) -> Result<HeadTarget> {
        let target = self.resolve_commit(name)?;
        let commit_id = self.target_commit(&target)?;
        let commit = self.objects.read_commit(&commit_id)?;

        let mut index = StagingIndex::new();
        index.reset_to_commit(&self.objects, &commit)?;

        let mut refs = self.refs()?;
        refs.head.point_to(target.clone())?;
        index.save(&self.index_path())?;

        if restore_working_tree {
            for entry in index.entries() {
                let content = self.objects.read_blob(&entry.id)?;
                write_working_file(&self.work_dir.join(&entry.path), entry.mode, &content)?;
            }
        }

        info!(
            commit = %commit_id,
            head = %refs.head.state(),
            files = index.len(),
            restore_working_tree,
            "checked out"
        );
        Ok(target)
    }

    /// Create a branch at `start` (any name `resolve_commit` accepts), or at HEAD.
    pub fn create_branch(&self, name: &str, start: Option<&str>) -> Result<Id> {
        let id = self.commit_or_head(start)?;
        self.refs()?.branches.create(name, id)?;
        info!(branch = name, %id, "created branch");
        Ok(id)
    }

    /// Delete a branch. The branch HEAD follows can't be deleted.
    pub fn delete_branch(&self, name: &str) -> Result<()> {
        let refs = self.refs()?;
        if refs.head.branch_name() == Some(name) {
            return Err(Error::InvalidRefState(format!(
                "cannot delete branch `{}` while HEAD follows it",
                name
            )));
        }

        refs.branches.delete(name)?;
        info!(branch = name, "deleted branch");
        Ok(())
    }

    /// Create a tag at `target` (any name `resolve_commit` accepts), or at HEAD.
    pub fn create_tag(&self, name: &str, target: Option<&str>) -> Result<Id> {
        let id = self.commit_or_head(target)?;
        self.refs()?.tags.create(name, id)?;
        info!(tag = name, %id, "created tag");
        Ok(id)
    }

    pub fn delete_tag(&self, name: &str) -> Result<()> {
        self.refs()?.tags.delete(name)?;
        info!(tag = name, "deleted tag");
        Ok(())
    }

    pub fn branches(&self) -> Result<BTreeMap<String, Id>> {
        self.refs()?.branches.list_all()
    }

    pub fn tags(&self) -> Result<BTreeMap<String, Id>> {
        self.refs()?.tags.list_all()
    }

    fn commit_or_head(&self, name: Option<&str>) -> Result<Id> {
        match name {
            Some(name) => {
                let target = self.resolve_commit(name)?;
                self.target_commit(&target)
            }
            None => self
                .refs()?
                .head
                .current_commit()?
                .ok_or_else(|| Error::NotFound("HEAD has no commits yet".to_string())),
        }
    }

    /// Staged and working-tree content for every staged path that has changed.
    pub fn diff_inputs(&self) -> Result<Vec<DiffInput>> {
        self.changed_entries()?
            .into_iter()
            .map(|(entry, working)| -> Result<DiffInput> {
                let staged = self.objects.read_blob(&entry.id)?;
                Ok(DiffInput {
                    path: entry.path,
                    staged_lines: to_lines(&staged),
                    working_lines: working.as_deref().map(to_lines).unwrap_or_default(),
                })
            })
            .collect()
    }

    /// Which staged paths have been modified or deleted in the working tree.
    ///
    /// Untracked files are not reported.
    pub fn status(&self) -> Result<Status> {
        let mut status = Status::default();

        for (entry, working) in self.changed_entries()? {
            match working {
                Some(_) => status.modified.push(entry.path),
                None => status.deleted.push(entry.path),
            }
        }

        Ok(status)
    }

    /// Staged entries whose working file hashes differ, with the working
    /// content (`None` if the file is gone or is no longer a file).
    fn changed_entries(&self) -> Result<Vec<(StagingEntry, Option<Vec<u8>>)>> {
        let mut changed = Vec::new();

        for entry in self.index()?.entries() {
            let content = working_content(&self.work_dir, &entry.path)?;

            let unchanged = match &content {
                Some(content) => Object::Blob(content.clone()).id() == entry.id,
                None => false,
            };

            if !unchanged {
                changed.push((entry.clone(), content));
            }
        }

        Ok(changed)
    }
}

/// Content at `path` in the working tree, or `None` if nothing file-like
/// is there any more.
fn working_content(work_dir: &Path, path: &str) -> Result<Option<Vec<u8>>> {
    let file = work_dir.join(path);

    match fs::symlink_metadata(&file) {
        Ok(metadata) if metadata.is_dir() => Ok(None),
        Ok(metadata) => Ok(Some(read_working_file(&file, &metadata)?)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        // A file now sits where one of the parent directories was.
        Err(_) if has_file_parent(work_dir, path) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn has_file_parent(work_dir: &Path, path: &str) -> bool {
    path.match_indices('/').any(|(i, _)| {
        fs::symlink_metadata(work_dir.join(&path[..i]))
            .map(|m| !m.is_dir())
            .unwrap_or(false)
    })
}

fn not_found(err: io::Error, path: &str) -> Error {
    if err.kind() == io::ErrorKind::NotFound {
        Error::NotFound(format!("file {}", path))
    } else {
        err.into()
    }
}

/// Content of a working-tree file. For a symbolic link, that is the link target.
fn read_working_file(file: &Path, metadata: &fs::Metadata) -> io::Result<Vec<u8>> {
    if metadata.file_type().is_symlink() {
        let target = fs::read_link(file)?;
        Ok(target.to_string_lossy().into_owned().into_bytes())
    } else {
        fs::read(file)
    }
}

fn write_working_file(file: &Path, mode: FileMode, content: &[u8]) -> Result<()> {
    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent)?;
    }

    if let Ok(metadata) = fs::symlink_metadata(file) {
        if metadata.file_type().is_symlink() || mode == FileMode::SymbolicLink {
            fs::remove_file(file)?;
        }
    }

    match mode {
        FileMode::SymbolicLink => write_symlink(file, content),
        mode if mode.is_executable() => {
            fs::write(file, content)?;
            set_executable(file)
        }
        _ => fs::write(file, content).map_err(|e| e.into()),
    }
}

#[cfg(unix)]
fn write_symlink(file: &Path, content: &[u8]) -> Result<()> {
    let target = String::from_utf8_lossy(content).into_owned();
    std::os::unix::fs::symlink(target, file).map_err(|e| e.into())
}

#[cfg(not(unix))]
fn write_symlink(file: &Path, content: &[u8]) -> Result<()> {
    fs::write(file, content).map_err(|e| e.into())
}

#[cfg(unix)]
fn set_executable(file: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(file)?.permissions();
    perms.set_mode(perms.mode() | 0o111);
    fs::set_permissions(file, perms).map_err(|e| e.into())
}

#[cfg(not(unix))]
fn set_executable(_file: &Path) -> Result<()> {
    Ok(())
}

fn to_lines(content: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(content)
        .lines()
        .map(str::to_string)
        .collect()
}

fn create_config(git_dir: &Path, config: &Config) -> Result<()> {
    let config_path = git_dir.join("config");
    fs::write(config_path, config.to_git_text()).map_err(|e| e.into())
}

fn create_description(git_dir: &Path) -> Result<()> {
    let desc_path = git_dir.join("description");
    let desc_txt = "Unnamed repository; edit this file 'description' to name the repository.\n";

    fs::write(desc_path, desc_txt).map_err(|e| e.into())
}

fn create_hooks_dir(git_dir: &Path) -> Result<()> {
    let hooks_dir = git_dir.join("hooks");
    fs::create_dir_all(&hooks_dir).map_err(|e| e.into())
}

fn create_info_dir(git_dir: &Path) -> Result<()> {
    let info_dir = git_dir.join("info");
    fs::create_dir_all(&info_dir)?;

    let exclude_path = info_dir.join("exclude");
    let exclude_txt = "# sgit ls-files --others --exclude-from=.git/info/exclude\n# Lines that start with '#' are comments.\n.DS_Store\n";

    fs::write(exclude_path, exclude_txt).map_err(|e| e.into())
}

fn create_objects_dir(git_dir: &Path) -> Result<()> {
    let info_dir = git_dir.join("objects/info");
    fs::create_dir_all(&info_dir)?;

    let pack_dir = git_dir.join("objects/pack");
    fs::create_dir_all(&pack_dir).map_err(|e| e.into())
}

fn create_refs_dir(git_dir: &Path) -> Result<()> {
    let heads_dir = git_dir.join("refs/heads");
    fs::create_dir_all(&heads_dir)?;

    let tags_dir = git_dir.join("refs/tags");
    fs::create_dir_all(&tags_dir).map_err(|e| e.into())
}
