use std::fs::Metadata;
use std::str;

/// Describes the file type as represented in trees and in the index.
///
/// The following values are recognized:
///
/// * `0o100644` - normal file
/// * `0o100755` - executable file
/// * `0o120000` - symbolic link
/// * `0o040000` - tree (subdirectory)
/// * any other `0o100xxx` - regular file with unusual permissions (for
///   example `0o100664`), kept exactly as recorded
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum FileMode {
    Normal,
    Executable,
    SymbolicLink,
    Tree,
    Regular(u32),
}

const TYPE_MASK: u32 = 0o170000;
const REGULAR_TYPE: u32 = 0o100000;

impl FileMode {
    /// Convert from file-mode integer to `FileMode` enum.
    ///
    /// Returns `None` for values that are neither one of the recognized
    /// constants nor a regular file with permission bits only.
    pub fn from_value(value: u32) -> Option<FileMode> {
        match value {
            0o100644 => Some(FileMode::Normal),
            0o100755 => Some(FileMode::Executable),
            0o120000 => Some(FileMode::SymbolicLink),
            0o040000 => Some(FileMode::Tree),
            v if v & TYPE_MASK == REGULAR_TYPE && v & !(TYPE_MASK | 0o7777) == 0 => {
                Some(FileMode::Regular(v))
            }
            _ => None,
        }
    }

    /// Convert from `FileMode` enum to file-mode integer.
    pub fn to_value(self) -> u32 {
        match self {
            FileMode::Normal => 0o100644,
            FileMode::Executable => 0o100755,
            FileMode::SymbolicLink => 0o120000,
            FileMode::Tree => 0o040000,
            FileMode::Regular(v) => v,
        }
    }

    /// Parse the octal text used in tree entries (`100644`, `40000`, ...).
    pub fn from_octal_slice(octal: &[u8]) -> Option<FileMode> {
        let octal = str::from_utf8(octal).ok()?;
        let value = u32::from_str_radix(octal, 8).ok()?;
        FileMode::from_value(value)
    }

    /// Render as octal text without leading zeros, as written in tree entries.
    pub fn to_octal_string(self) -> String {
        format!("{:o}", self.to_value())
    }

    /// Classify a working-tree file from its filesystem metadata.
    ///
    /// Anything that is neither a symbolic link nor carries an
    /// executable bit is recorded as a normal file.
    pub fn from_metadata(metadata: &Metadata) -> FileMode {
        if metadata.file_type().is_symlink() {
            return FileMode::SymbolicLink;
        }

        if has_exec_bit(metadata) {
            FileMode::Executable
        } else {
            FileMode::Normal
        }
    }

    /// Returns true if this mode names a subdirectory.
    pub fn is_tree(self) -> bool {
        self == FileMode::Tree
    }

    /// Returns true if a file with this mode should be checked out executable.
    pub fn is_executable(self) -> bool {
        match self {
            FileMode::Executable => true,
            FileMode::Regular(v) => v & 0o111 != 0,
            _ => false,
        }
    }
}

#[cfg(unix)]
fn has_exec_bit(metadata: &Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn has_exec_bit(_metadata: &Metadata) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_value() {
        assert_eq!(FileMode::from_value(0o100644).unwrap(), FileMode::Normal);
        assert_eq!(
            FileMode::from_value(0o100755).unwrap(),
            FileMode::Executable
        );
        assert_eq!(
            FileMode::from_value(0o120000).unwrap(),
            FileMode::SymbolicLink
        );
        assert_eq!(FileMode::from_value(0o040000).unwrap(), FileMode::Tree);
        assert!(FileMode::from_value(0o160000).is_none());
        assert!(FileMode::from_value(0o060644).is_none());
        assert!(FileMode::from_value(0).is_none());
    }

    #[test]
    fn unusual_regular_modes_are_kept() {
        for raw in &[0o100664, 0o100600, 0o100775, 0o100444] {
            let mode = FileMode::from_value(*raw).unwrap();
            assert_eq!(mode, FileMode::Regular(*raw));
            assert_eq!(mode.to_value(), *raw);
        }

        assert_eq!(
            FileMode::from_octal_slice(b"100664"),
            Some(FileMode::Regular(0o100664))
        );
        assert_eq!(FileMode::Regular(0o100664).to_octal_string(), "100664");

        assert!(!FileMode::Regular(0o100664).is_executable());
        assert!(FileMode::Regular(0o100775).is_executable());
        assert!(FileMode::Executable.is_executable());
        assert!(!FileMode::Normal.is_executable());
    }

    #[test]
    fn octal_text() {
        assert_eq!(FileMode::Tree.to_octal_string(), "40000");
        assert_eq!(FileMode::Normal.to_octal_string(), "100644");
        assert_eq!(FileMode::from_octal_slice(b"40000"), Some(FileMode::Tree));
        assert_eq!(
            FileMode::from_octal_slice(b"100755"),
            Some(FileMode::Executable)
        );
        assert_eq!(FileMode::from_octal_slice(b"100648"), None);
        assert_eq!(FileMode::from_octal_slice(b""), None);
    }

    #[cfg(unix)]
    #[test]
    fn from_metadata() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("script");
        fs::write(&path, "#!/bin/sh\n").unwrap();

        let m = fs::metadata(&path).unwrap();
        assert_eq!(FileMode::from_metadata(&m), FileMode::Normal);

        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        let m = fs::metadata(&path).unwrap();
        assert_eq!(FileMode::from_metadata(&m), FileMode::Executable);
    }
}
