//! The staging index: the set of paths that the next commit will contain.
//!
//! On disk the index is a single binary file:
//!
//! * 12-byte header: `DIRC`, version (`u32`, always 2), entry count (`u32`)
//! * entries, sorted by path, each padded with 1 to 8 NUL bytes to a
//!   multiple of 8 bytes
//! * 40 ASCII hex digits of the SHA-1 of everything before them
//!
//! All integers are big-endian.

use std::collections::BTreeMap;
use std::fs::{self, Metadata};
use std::io;
use std::path::Path;

use sha1::{Digest, Sha1};
use tracing::debug;

use super::fsutil::write_atomic;
use super::objects::ObjectStore;
use super::tree_builder::{self, FlatEntry};
use super::{Error, Result};
use crate::file_mode::FileMode;
use crate::git_path::GitPath;
use crate::object::{Commit, Id, Object, ID_LEN};

const MAGIC: &[u8; 4] = b"DIRC";
const VERSION: u32 = 2;
const HEADER_LEN: usize = 12;
const ENTRY_HEADER_LEN: usize = 62;
const CHECKSUM_LEN: usize = 40;
const MAX_FLAGS_LEN: usize = 0xFFF;

/// Filesystem metadata captured when a file is staged.
///
/// Times are stored as 32-bit floats, which is what existing index files
/// contain. Other fields are truncated to 32 bits.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FileStat {
    pub ctime_s: f32,
    pub ctime_ns: f32,
    pub mtime_s: f32,
    pub mtime_ns: f32,
    pub dev: u32,
    pub ino: u32,
    pub uid: u32,
    pub gid: u32,
    pub size: u32,
}

impl FileStat {
    #[cfg(unix)]
    pub fn from_metadata(metadata: &Metadata) -> FileStat {
        use std::os::unix::fs::MetadataExt;

        FileStat {
            ctime_s: metadata.ctime() as f32,
            ctime_ns: metadata.ctime_nsec() as f32,
            mtime_s: metadata.mtime() as f32,
            mtime_ns: metadata.mtime_nsec() as f32,
            dev: metadata.dev() as u32,
            ino: metadata.ino() as u32,
            uid: metadata.uid(),
            gid: metadata.gid(),
            size: metadata.len() as u32,
        }
    }

    #[cfg(not(unix))]
    pub fn from_metadata(metadata: &Metadata) -> FileStat {
        use std::time::UNIX_EPOCH;

        let mtime = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .unwrap_or_default();

        FileStat {
            mtime_s: mtime.as_secs() as f32,
            mtime_ns: mtime.subsec_nanos() as f32,
            size: metadata.len() as u32,
            ..FileStat::default()
        }
    }
}

/// One staged path.
#[derive(Clone, Debug, PartialEq)]
pub struct StagingEntry {
    pub path: String,
    pub id: Id,
    pub mode: FileMode,
    pub stat: FileStat,
    pub flags: u16,
}

impl StagingEntry {
    /// Create an entry, deriving `flags` from the path length.
    pub fn new(path: &str, id: Id, mode: FileMode, stat: FileStat) -> StagingEntry {
        StagingEntry {
            path: path.to_string(),
            id,
            mode,
            stat,
            flags: path.len().min(MAX_FLAGS_LEN) as u16,
        }
    }

    /// The (path, mode, ID) triple the tree assembler needs.
    pub fn to_flat(&self) -> FlatEntry {
        FlatEntry {
            path: self.path.clone(),
            mode: self.mode,
            id: self.id,
        }
    }

    fn encode(&self, out: &mut Vec<u8>) {
        let start = out.len();
        let s = &self.stat;

        for t in &[s.ctime_s, s.ctime_ns, s.mtime_s, s.mtime_ns] {
            out.extend_from_slice(&t.to_be_bytes());
        }

        for n in &[s.dev, s.ino, self.mode.to_value(), s.uid, s.gid, s.size] {
            out.extend_from_slice(&n.to_be_bytes());
        }

        out.extend_from_slice(self.id.as_bytes());
        out.extend_from_slice(&self.flags.to_be_bytes());
        out.extend_from_slice(self.path.as_bytes());

        let len = padded_len(self.path.len());
        out.resize(start + len, 0);
    }

    fn decode(r: &mut Reader<'_>) -> Result<StagingEntry> {
        let ctime_s = r.f32()?;
        let ctime_ns = r.f32()?;
        let mtime_s = r.f32()?;
        let mtime_ns = r.f32()?;
        let dev = r.u32()?;
        let ino = r.u32()?;
        let mode = r.u32()?;
        let uid = r.u32()?;
        let gid = r.u32()?;
        let size = r.u32()?;
        let id = r.take(ID_LEN, "entry header")?;
        let flags = r.u16()?;

        let mode = FileMode::from_value(mode)
            .ok_or_else(|| corrupt(format!("unknown file mode {:o}", mode)))?;
        let id = Id::from_hex(id).map_err(|err| corrupt(format!("bad object ID ({})", err)))?;

        let path_len = r
            .remaining()
            .iter()
            .position(|b| *b == 0)
            .ok_or_else(|| corrupt("entry path has no NUL terminator"))?;
        let path = r.take(path_len, "entry path")?;
        let path = String::from_utf8(path.to_vec())
            .map_err(|_| corrupt("entry path is not valid UTF-8"))?;

        let padding = padded_len(path_len) - ENTRY_HEADER_LEN - path_len;
        if r.take(padding, "entry padding")?.iter().any(|b| *b != 0) {
            return Err(corrupt(format!("entry for `{}` is not NUL-padded", path)));
        }

        Ok(StagingEntry {
            path,
            id,
            mode,
            stat: FileStat {
                ctime_s,
                ctime_ns,
                mtime_s,
                mtime_ns,
                dev,
                ino,
                uid,
                gid,
                size,
            },
            flags,
        })
    }
}

/// Total on-disk length of an entry whose path is `path_len` bytes long.
fn padded_len(path_len: usize) -> usize {
    (ENTRY_HEADER_LEN + path_len + 8) & !7
}

fn corrupt<R: ToString>(reason: R) -> Error {
    Error::corrupt("index", reason)
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8]> {
        if self.data.len() - self.pos < n {
            return Err(corrupt(format!("truncated {}", what)));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, "entry header")?);
        Ok(out)
    }

    fn u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.array()?))
    }

    fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    fn f32(&mut self) -> Result<f32> {
        Ok(f32::from_be_bytes(self.array()?))
    }
}

/// In-memory form of the index file, keyed by path.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StagingIndex {
    entries: BTreeMap<String, StagingEntry>,
}

impl StagingIndex {
    pub fn new() -> StagingIndex {
        StagingIndex::default()
    }

    /// Read the index file at `path`.
    ///
    /// A missing or empty file is an empty index.
    pub fn load(path: &Path) -> Result<StagingIndex> {
        match fs::read(path) {
            Ok(data) => StagingIndex::deserialize(&data),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(StagingIndex::new()),
            Err(err) => Err(err.into()),
        }
    }

    /// Replace the index file at `path` with the current entries.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_atomic(path, &self.serialize())?;
        debug!(entries = self.entries.len(), "index saved");
        Ok(())
    }

    /// Hash `content` into the object store and record it under `path`.
    ///
    /// Replaces any entry already present for `path`. Entries that cannot
    /// coexist with it are dropped: a staged file at one of its parent
    /// directories (`a` when staging `a/b`), or anything staged beneath it
    /// (`a/b` when staging `a`).
    pub fn stage(
        &mut self,
        store: &ObjectStore,
        path: &str,
        content: &[u8],
        mode: FileMode,
        stat: FileStat,
    ) -> Result<Id> {
        GitPath::new(path).map_err(|source| Error::InvalidPath {
            path: path.to_string(),
            source,
        })?;

        let id = store.write(&Object::Blob(content.to_vec()))?;
        self.evict_conflicts(path);
        self.entries
            .insert(path.to_string(), StagingEntry::new(path, id, mode, stat));

        debug!(path, %id, "staged");
        Ok(id)
    }

    fn evict_conflicts(&mut self, path: &str) {
        let mut evicted: Vec<String> = path
            .match_indices('/')
            .map(|(i, _)| &path[..i])
            .filter(|parent| self.entries.contains_key(*parent))
            .map(str::to_string)
            .collect();

        let dir_prefix = format!("{}/", path);
        evicted.extend(
            self.entries
                .range(dir_prefix.clone()..)
                .take_while(|(p, _)| p.starts_with(&dir_prefix))
                .map(|(p, _)| p.clone()),
        );

        for p in evicted {
            self.entries.remove(&p);
            debug!(path = %p, replaced_by = path, "unstaged conflicting path");
        }
    }

    /// Remove the entry for `path`.
    pub fn unstage(&mut self, path: &str) -> Result<StagingEntry> {
        let entry = self
            .entries
            .remove(path)
            .ok_or_else(|| Error::NotStaged(path.to_string()))?;

        debug!(path, "unstaged");
        Ok(entry)
    }

    /// Iterate over entries in path order.
    pub fn entries(&self) -> impl Iterator<Item = &StagingEntry> {
        self.entries.values()
    }

    pub fn get(&self, path: &str) -> Option<&StagingEntry> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Paths, modes, and IDs of every entry, ready for tree assembly.
    pub fn to_flat(&self) -> Vec<FlatEntry> {
        self.entries.values().map(StagingEntry::to_flat).collect()
    }

    /// Replace every entry with the contents of `commit`'s tree.
    ///
    /// Filesystem metadata is unknown for these entries and is zeroed.
    pub fn reset_to_commit(&mut self, store: &ObjectStore, commit: &Commit) -> Result<()> {
        let flat = tree_builder::flatten(store, &commit.tree())?;

        self.entries = flat
            .into_iter()
            .map(|f| {
                let entry = StagingEntry::new(&f.path, f.id, f.mode, FileStat::default());
                (f.path, entry)
            })
            .collect();

        debug!(tree = %commit.tree(), entries = self.entries.len(), "index reset");
        Ok(())
    }

    /// Content of the blob staged for `path`.
    pub fn blob_bytes(&self, store: &ObjectStore, path: &str) -> Result<Vec<u8>> {
        let entry = self
            .get(path)
            .ok_or_else(|| Error::NotStaged(path.to_string()))?;
        store.read_blob(&entry.id)
    }

    /// Encode the binary index file.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.entries.len() * 80 + CHECKSUM_LEN);

        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&VERSION.to_be_bytes());
        out.extend_from_slice(&(self.entries.len() as u32).to_be_bytes());

        for entry in self.entries.values() {
            entry.encode(&mut out);
        }

        let checksum = hex::encode(Sha1::digest(&out));
        out.extend_from_slice(checksum.as_bytes());
        out
    }

    /// Decode a binary index file.
    ///
    /// Empty input is an empty index.
    pub fn deserialize(data: &[u8]) -> Result<StagingIndex> {
        if data.is_empty() {
            return Ok(StagingIndex::new());
        }

        if data.len() < HEADER_LEN {
            return Err(corrupt("truncated header"));
        }

        if &data[..4] != MAGIC {
            return Err(corrupt("bad signature"));
        }

        let mut r = Reader { data, pos: 4 };
        let version = r.u32()?;
        if version != VERSION {
            return Err(corrupt(format!("unsupported version {}", version)));
        }
        let count = r.u32()?;

        if data.len() < HEADER_LEN + CHECKSUM_LEN {
            return Err(corrupt("missing checksum"));
        }

        let (body, trailer) = data.split_at(data.len() - CHECKSUM_LEN);
        if hex::encode(Sha1::digest(body)).as_bytes() != trailer {
            return Err(corrupt("checksum mismatch"));
        }

        let mut r = Reader {
            data: body,
            pos: HEADER_LEN,
        };

        let mut entries = BTreeMap::new();
        for _ in 0..count {
            let entry = StagingEntry::decode(&mut r)?;
            entries.insert(entry.path.clone(), entry);
        }

        if !r.remaining().is_empty() {
            return Err(corrupt("unexpected data after last entry"));
        }

        Ok(StagingIndex { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::object::{Attribution, Tree};

    use tempfile::{tempdir, TempDir};

    fn store() -> (TempDir, ObjectStore) {
        let dir = tempdir().unwrap();
        let store = ObjectStore::new(&dir.path().join("objects"));
        (dir, store)
    }

    fn sample_stat() -> FileStat {
        FileStat {
            ctime_s: 1_600_000_000.0,
            ctime_ns: 12_345.0,
            mtime_s: 1_600_000_100.0,
            mtime_ns: 67_890.0,
            dev: 66,
            ino: 4242,
            uid: 501,
            gid: 20,
            size: 2,
        }
    }

    fn index_with(store: &ObjectStore, paths: &[&str]) -> StagingIndex {
        let mut index = StagingIndex::new();
        for path in paths {
            index
                .stage(store, path, path.as_bytes(), FileMode::Normal, sample_stat())
                .unwrap();
        }
        index
    }

    #[test]
    fn empty_index() {
        let index = StagingIndex::new();
        let data = index.serialize();
        assert_eq!(data.len(), HEADER_LEN + CHECKSUM_LEN);
        assert_eq!(&data[..4], b"DIRC");
        assert_eq!(&data[4..12], &[0, 0, 0, 2, 0, 0, 0, 0]);

        assert_eq!(StagingIndex::deserialize(&data).unwrap(), index);
        assert_eq!(StagingIndex::deserialize(b"").unwrap(), index);
    }

    #[test]
    fn entry_padding() {
        let (_dir, store) = store();

        // Path lengths chosen so (62 + len) mod 8 covers 0, 1, 7, and
        // the wrap-around cases on either side.
        for len in &[1usize, 2, 3, 9, 10, 11, 17, 18] {
            let path = "p".repeat(*len);
            let index = index_with(&store, &[&path]);
            let data = index.serialize();

            let entry_len = data.len() - HEADER_LEN - CHECKSUM_LEN;
            assert_eq!(entry_len % 8, 0, "path length {}", len);

            let padding = entry_len - ENTRY_HEADER_LEN - len;
            assert!((1..=8).contains(&padding), "path length {}", len);
            assert!(data[HEADER_LEN + ENTRY_HEADER_LEN + len..HEADER_LEN + entry_len]
                .iter()
                .all(|b| *b == 0));

            assert_eq!(StagingIndex::deserialize(&data).unwrap(), index);
        }
    }

    #[test]
    fn round_trip_many() {
        let (_dir, store) = store();

        let index = index_with(&store, &["a", "b/c.txt", "b/d", "zz/top/deep/file.rs"]);
        let data = index.serialize();
        let decoded = StagingIndex::deserialize(&data).unwrap();

        assert_eq!(decoded, index);
        assert_eq!(decoded.get("b/c.txt").unwrap().stat, sample_stat());
        assert_eq!(
            decoded.entries().map(|e| e.path.as_str()).collect::<Vec<_>>(),
            vec!["a", "b/c.txt", "b/d", "zz/top/deep/file.rs"]
        );
    }

    #[test]
    fn flags_are_capped() {
        let (_dir, store) = store();

        let long = "x".repeat(5000);
        let index = index_with(&store, &["abc", &long]);
        assert_eq!(index.get("abc").unwrap().flags, 3);
        assert_eq!(index.get(&long).unwrap().flags, 0xFFF);

        let decoded = StagingIndex::deserialize(&index.serialize()).unwrap();
        assert_eq!(decoded.get(&long).unwrap().path.len(), 5000);
    }

    #[test]
    fn restage_replaces() {
        let (_dir, store) = store();

        let mut index = StagingIndex::new();
        let first = index
            .stage(&store, "f", b"one", FileMode::Normal, FileStat::default())
            .unwrap();
        let second = index
            .stage(&store, "f", b"two", FileMode::Executable, FileStat::default())
            .unwrap();

        assert_ne!(first, second);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("f").unwrap().id, second);
        assert_eq!(index.get("f").unwrap().mode, FileMode::Executable);
        assert_eq!(index.blob_bytes(&store, "f").unwrap(), b"two");
    }

    #[test]
    fn stage_replaces_file_directory_conflicts() {
        let (_dir, store) = store();

        let mut index = index_with(&store, &["a", "ab", "a-b", "z"]);
        index
            .stage(&store, "a/b/c", b"c", FileMode::Normal, FileStat::default())
            .unwrap();
        assert_eq!(
            index.entries().map(|e| e.path.as_str()).collect::<Vec<_>>(),
            vec!["a-b", "a/b/c", "ab", "z"]
        );

        index
            .stage(&store, "a/d", b"d", FileMode::Normal, FileStat::default())
            .unwrap();
        index
            .stage(&store, "a", b"a", FileMode::Normal, FileStat::default())
            .unwrap();
        assert_eq!(
            index.entries().map(|e| e.path.as_str()).collect::<Vec<_>>(),
            vec!["a", "a-b", "ab", "z"]
        );

        // The result always assembles into a tree.
        tree_builder::build(&store, &index.to_flat()).unwrap();
    }

    #[test]
    fn stage_rejects_bad_paths() {
        let (_dir, store) = store();

        let mut index = StagingIndex::new();
        for path in &["", "/abs", "a//b", "a/../b", ".git/config"] {
            match index
                .stage(&store, path, b"x", FileMode::Normal, FileStat::default())
                .unwrap_err()
            {
                Error::InvalidPath { .. } => (),
                err => panic!("Unexpected error {:?}", err),
            }
        }
        assert!(index.is_empty());
    }

    #[test]
    fn unstage() {
        let (_dir, store) = store();

        let mut index = index_with(&store, &["a", "b"]);
        assert_eq!(index.unstage("a").unwrap().path, "a");
        assert!(!index.contains("a"));
        assert!(index.contains("b"));

        match index.unstage("a").unwrap_err() {
            Error::NotStaged(path) => assert_eq!(path, "a"),
            err => panic!("Unexpected error {:?}", err),
        }

        match index.blob_bytes(&store, "a").unwrap_err() {
            Error::NotStaged(_) => (),
            err => panic!("Unexpected error {:?}", err),
        }
    }

    #[test]
    fn reset_to_commit() {
        let (_dir, store) = store();

        let x = store.write(&Object::Blob(b"x".to_vec())).unwrap();
        let y = store.write(&Object::Blob(b"y".to_vec())).unwrap();

        let mut dir = Tree::new();
        dir.add(FileMode::Normal, "y", y);
        let dir = store.write(&Object::Tree(dir)).unwrap();

        let mut root = Tree::new();
        root.add(FileMode::Normal, "x", x);
        root.add(FileMode::Tree, "dir", dir);
        let root = store.write(&Object::Tree(root)).unwrap();

        let commit = Commit::new(root, None, Attribution::new("A", "a@b", 0, 0), "m");

        let mut index = index_with(&store, &["stale"]);
        index.reset_to_commit(&store, &commit).unwrap();

        assert_eq!(
            index.entries().map(|e| e.path.as_str()).collect::<Vec<_>>(),
            vec!["dir/y", "x"]
        );
        assert_eq!(index.get("dir/y").unwrap().id, y);
        assert_eq!(index.get("x").unwrap().stat, FileStat::default());
        assert_eq!(index.blob_bytes(&store, "x").unwrap(), b"x");
    }

    #[test]
    fn load_and_save() {
        let (dir, store) = store();
        let path = dir.path().join("index");

        assert!(StagingIndex::load(&path).unwrap().is_empty());

        fs::write(&path, b"").unwrap();
        assert!(StagingIndex::load(&path).unwrap().is_empty());

        let index = index_with(&store, &["a/b.txt"]);
        index.save(&path).unwrap();
        assert_eq!(StagingIndex::load(&path).unwrap(), index);
    }

    #[test]
    fn keeps_unusual_file_modes() {
        let (_dir, store) = store();
        let mut data = index_with(&store, &["file"]).serialize();
        data[HEADER_LEN + 24..HEADER_LEN + 28].copy_from_slice(&0o100664u32.to_be_bytes());
        let data = reseal(data);

        let index = StagingIndex::deserialize(&data).unwrap();
        let entry = index.get("file").unwrap();
        assert_eq!(entry.mode, FileMode::Regular(0o100664));
        assert_eq!(entry.to_flat().mode.to_octal_string(), "100664");
        assert_eq!(index.serialize(), data);
    }

    fn expect_corrupt(data: &[u8]) {
        match StagingIndex::deserialize(data).unwrap_err() {
            Error::CorruptObject { what, .. } => assert_eq!(what, "index"),
            err => panic!("Unexpected error {:?}", err),
        }
    }

    /// Recompute the trailer so a tampered body is only caught by its own checks.
    fn reseal(mut data: Vec<u8>) -> Vec<u8> {
        data.truncate(data.len() - CHECKSUM_LEN);
        let checksum = hex::encode(Sha1::digest(&data));
        data.extend_from_slice(checksum.as_bytes());
        data
    }

    #[test]
    fn rejects_corruption() {
        let (_dir, store) = store();
        let good = index_with(&store, &["file"]).serialize();

        expect_corrupt(b"DIR");

        let mut bad_magic = good.clone();
        bad_magic[0] = b'X';
        expect_corrupt(&bad_magic);

        let mut bad_version = good.clone();
        bad_version[7] = 3;
        expect_corrupt(&reseal(bad_version));

        let mut bad_checksum = good.clone();
        let last = bad_checksum.len() - 1;
        bad_checksum[last] = if bad_checksum[last] == b'0' { b'1' } else { b'0' };
        expect_corrupt(&bad_checksum);

        let mut flipped = good.clone();
        flipped[HEADER_LEN + 3] ^= 0xff;
        expect_corrupt(&flipped);

        let mut bad_mode = good.clone();
        bad_mode[HEADER_LEN + 24..HEADER_LEN + 28].copy_from_slice(&0o160000u32.to_be_bytes());
        expect_corrupt(&reseal(bad_mode));

        let mut bad_id = good.clone();
        bad_id[HEADER_LEN + 40] = b'Z';
        expect_corrupt(&reseal(bad_id));

        let mut too_many = good.clone();
        too_many[11] = 2;
        expect_corrupt(&reseal(too_many));

        let mut no_nul = good[..HEADER_LEN + ENTRY_HEADER_LEN + 4].to_vec();
        no_nul.extend_from_slice(&[0u8; CHECKSUM_LEN]);
        expect_corrupt(&reseal(no_nul));
    }
}
