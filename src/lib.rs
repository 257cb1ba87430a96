//! This crate implements a small content-addressed version-control engine:
//! an object store, a binary staging index, tree snapshots, linear commit
//! history, and branch/tag/HEAD references.
//!
//! Start with [`repo::OnDisk`], which ties the pieces together for a
//! repository on the local file system.

#![deny(warnings)]

pub mod file_mode;
pub mod git_path;
pub mod object;
pub mod repo;
