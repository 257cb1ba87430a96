use thiserror::Error;

/// Reasons why a string can not be accepted as a repository-relative path.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum GitPathError {
    #[error("path is empty")]
    EmptyPath,

    #[error("path must be relative to the repository root")]
    AbsolutePath,

    #[error("path ends with `/`")]
    TrailingSlash,

    #[error("path contains an empty segment")]
    DuplicateSlash,

    #[error("path contains a NUL character")]
    ContainsNull,

    #[error("path contains a `.` or `..` segment")]
    RelativeSegment,

    #[error("path points inside the repository metadata directory")]
    DotGit,
}

/// A validated, `/`-separated path relative to the top of the working tree.
///
/// These are the keys of the staging index and, split at `/`, the names
/// found in tree objects.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GitPath<'a> {
    path: &'a str,
}

impl<'a> GitPath<'a> {
    /// Convert the provided string to a `GitPath` if it is acceptable
    /// as a repository path.
    pub fn new(path: &'a str) -> Result<GitPath<'a>, GitPathError> {
        check_path(path)?;
        Ok(GitPath { path })
    }

    // Return the path.
    pub fn path(&self) -> &'a str {
        self.path
    }

    /// Iterate over the directory names and final file name.
    pub fn segments(&self) -> impl Iterator<Item = &'a str> {
        self.path.split('/')
    }
}

fn check_path(path: &str) -> Result<(), GitPathError> {
    if path.is_empty() {
        Err(GitPathError::EmptyPath)
    } else if path.starts_with('/') {
        Err(GitPathError::AbsolutePath)
    } else if path.ends_with('/') {
        Err(GitPathError::TrailingSlash)
    } else {
        for segment in path.split('/') {
            match check_segment(segment) {
                Err(GitPathError::EmptyPath) => Err(GitPathError::DuplicateSlash),
                x => x,
            }?;
        }
        Ok(())
    }
}

fn check_segment(segment: &str) -> Result<(), GitPathError> {
    if segment.is_empty() {
        Err(GitPathError::EmptyPath)
    } else if segment.contains('\0') {
        Err(GitPathError::ContainsNull)
    } else if segment == "." || segment == ".." {
        Err(GitPathError::RelativeSegment)
    } else if segment.eq_ignore_ascii_case(".git") || segment.eq_ignore_ascii_case("git~1") {
        Err(GitPathError::DotGit)
    } else {
        Ok(())
    }
}
