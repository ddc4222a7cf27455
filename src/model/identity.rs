use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Error type for building a file identity
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("not an absolute path: {0}")]
    NotAbsolute(PathBuf),
    #[error("path has no file name: {0}")]
    NoFileName(PathBuf),
    #[error("could not resolve current directory: {0}")]
    CurrentDir(#[from] std::io::Error),
}

/// Absolute, lexically normalized path of a note on disk.
///
/// `.` components are dropped and `..` components are folded into their
/// parent, so two identities for the same file compare equal without
/// touching the filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileIdentity(PathBuf);

impl FileIdentity {
    /// Build an identity from an absolute path.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, IdentityError> {
        let path = path.as_ref();
        if !path.is_absolute() {
            return Err(IdentityError::NotAbsolute(path.to_path_buf()));
        }
        let normalized = normalize(path);
        if normalized.file_name().is_none() {
            return Err(IdentityError::NoFileName(path.to_path_buf()));
        }
        Ok(FileIdentity(normalized))
    }

    /// Build an identity from a possibly relative path, anchored at the
    /// process working directory.
    pub fn from_cwd(path: impl AsRef<Path>) -> Result<Self, IdentityError> {
        let path = path.as_ref();
        if path.is_absolute() {
            return Self::new(path);
        }
        let cwd = std::env::current_dir()?;
        Self::new(cwd.join(path))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Final path component as a string (lossy for non-UTF-8 names).
    pub fn file_name(&self) -> String {
        self.0
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Directory containing the note.
    pub fn dir(&self) -> &Path {
        self.0.parent().unwrap_or(Path::new("/"))
    }

    /// Sibling in the same directory with the given file name.
    pub fn with_file_name(&self, name: &str) -> FileIdentity {
        FileIdentity(normalize(&self.dir().join(name)))
    }
}

impl AsRef<Path> for FileIdentity {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for FileIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Lexically normalize an absolute path: drop `.`, fold `..`.
/// `..` at the root stays at the root.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(p) => out.push(p.as_os_str()),
            Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}
