//! Content-addressed storage of compressed objects.
//!
//! Each object lives at `objects/<first 2 ID digits>/<remaining 18 digits>`
//! and contains the zlib-compressed bytes of `"<type-digit> <length>\0<payload>"`.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use flate2::{read::ZlibDecoder, write::ZlibEncoder, Compression};
use tracing::{debug, warn};

use super::fsutil::write_atomic;
use super::{Error, Result};
use crate::object::{check_prefix, Commit, Id, Kind, Object, Tree, ID_LEN};

/// The object store reads and writes objects below a repository's `objects` directory.
#[derive(Clone, Debug)]
pub struct ObjectStore {
    objects_dir: PathBuf,
}

impl ObjectStore {
    /// Create an `ObjectStore` rooted at the given `objects` directory.
    pub fn new(objects_dir: &Path) -> ObjectStore {
        ObjectStore {
            objects_dir: objects_dir.to_path_buf(),
        }
    }

    /// Compute the ID an object would be stored under, without writing it.
    ///
    /// This is functionally equivalent to `hash-object` without `-w`.
    pub fn hash(&self, object: &Object) -> Id {
        object.id()
    }

    /// Store an object and return its ID.
    ///
    /// If an object with the same ID is already present, nothing is written.
    pub fn write(&self, object: &Object) -> Result<Id> {
        let framed = object.to_framed();
        let id = Id::for_content(&framed);
        let path = self.object_path(&id);

        if path.exists() {
            debug!(%id, kind = %object.kind(), "object already stored");
            return Ok(id);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&framed)?;
        let compressed = encoder.finish()?;

        write_atomic(&path, &compressed)?;
        debug!(%id, kind = %object.kind(), len = framed.len(), "object stored");
        Ok(id)
    }

    /// Returns true if an object with exactly this ID is stored.
    pub fn contains(&self, id: &Id) -> bool {
        self.object_path(id).is_file()
    }

    /// Resolve a (possibly abbreviated) ID to the one stored object it names.
    pub fn resolve(&self, prefix: &str) -> Result<Id> {
        check_prefix(prefix)?;

        if prefix.len() == ID_LEN {
            let id = Id::from_hex(prefix)?;
            return if self.contains(&id) {
                Ok(id)
            } else {
                Err(Error::NotFound(format!("object {}", prefix)))
            };
        }

        let mut matches = self.ids_with_prefix(prefix)?;
        match matches.len() {
            0 => Err(Error::NotFound(format!("object {}", prefix))),
            1 => Ok(matches.remove(0)),
            count => Err(Error::AmbiguousPrefix {
                prefix: prefix.to_string(),
                count,
            }),
        }
    }

    /// Resolve `prefix` and decode the object it names.
    pub fn read(&self, prefix: &str) -> Result<(Id, Object)> {
        let id = self.resolve(prefix)?;
        let object = self.read_object(&id)?;
        Ok((id, object))
    }

    /// Read and decode the object with exactly this ID.
    pub fn read_object(&self, id: &Id) -> Result<Object> {
        let compressed = match fs::read(self.object_path(id)) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(Error::NotFound(format!("object {}", id)));
            }
            Err(err) => return Err(err.into()),
        };

        let mut framed = Vec::new();
        ZlibDecoder::new(compressed.as_slice())
            .read_to_end(&mut framed)
            .map_err(|err| Error::corrupt(format!("object {}", id), err))?;

        Object::from_framed(&framed).map_err(|err| Error::decode(id, err))
    }

    /// Read an object that must be a commit.
    pub fn read_commit(&self, id: &Id) -> Result<Commit> {
        match self.read_object(id)? {
            Object::Commit(commit) => Ok(commit),
            other => Err(wrong_kind(id, Kind::Commit, &other)),
        }
    }

    /// Read an object that must be a tree.
    pub fn read_tree(&self, id: &Id) -> Result<Tree> {
        match self.read_object(id)? {
            Object::Tree(tree) => Ok(tree),
            other => Err(wrong_kind(id, Kind::Tree, &other)),
        }
    }

    /// Read an object that must be a blob.
    pub fn read_blob(&self, id: &Id) -> Result<Vec<u8>> {
        match self.read_object(id)? {
            Object::Blob(data) => Ok(data),
            other => Err(wrong_kind(id, Kind::Blob, &other)),
        }
    }

    fn ids_with_prefix(&self, prefix: &str) -> Result<Vec<Id>> {
        let mut ids = Vec::new();

        let dirs = match fs::read_dir(&self.objects_dir) {
            Ok(dirs) => dirs,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(ids),
            Err(err) => return Err(err.into()),
        };

        for dir in dirs {
            let dir = dir?;
            let dir_name = dir.file_name().to_string_lossy().into_owned();

            // Skips `info`, `pack`, and anything else that isn't a fan-out directory.
            if dir_name.len() != 2 || check_prefix(&dir_name).is_err() {
                continue;
            }

            let wanted = if prefix.len() >= 2 {
                dir_name == prefix[..2]
            } else {
                dir_name.starts_with(prefix)
            };
            if !wanted {
                continue;
            }

            for file in fs::read_dir(dir.path())? {
                let file = file?;
                let file_name = file.file_name().to_string_lossy().into_owned();

                match Id::from_hex(format!("{}{}", dir_name, file_name)) {
                    Ok(id) if id.starts_with(prefix) => ids.push(id),
                    Ok(_) => (),
                    Err(_) => warn!(path = %file.path().display(), "ignoring non-object file"),
                }
            }
        }

        ids.sort();
        Ok(ids)
    }

    fn object_path(&self, id: &Id) -> PathBuf {
        self.objects_dir.join(id.dir_name()).join(id.file_name())
    }
}

fn wrong_kind(id: &Id, expected: Kind, found: &Object) -> Error {
    Error::WrongKind {
        id: *id,
        expected,
        found: found.kind(),
    }
}
