use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// Error type for filesystem operations
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("could not read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("could not list {path}: {source}")]
    List { path: PathBuf, source: io::Error },
    #[error("could not rename {from} to {to}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
    #[error("could not delete {path}: {source}")]
    Delete { path: PathBuf, source: io::Error },
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

/// The file operations navigation needs. Implemented for the real disk by
/// [`OsFilesystem`]; the navigation engine never touches `std::fs` directly.
pub trait Filesystem {
    fn exists(&self, path: &Path) -> bool;
    fn read_text(&self, path: &Path) -> Result<String, FsError>;
    fn write_text(&self, path: &Path, text: &str) -> Result<(), FsError>;
    /// Create an empty file at `path` unless something is already there.
    /// Returns false, touching nothing, when the file exists.
    fn create_new(&self, path: &Path) -> Result<bool, FsError>;
    /// Entries of `path`, sorted by name so results are deterministic.
    fn list_directory(&self, path: &Path) -> Result<Vec<DirEntry>, FsError>;
    fn rename(&self, from: &Path, to: &Path) -> Result<(), FsError>;
    fn delete(&self, path: &Path) -> Result<(), FsError>;
}

/// [`Filesystem`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFilesystem;

impl Filesystem for OsFilesystem {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_text(&self, path: &Path) -> Result<String, FsError> {
        fs::read_to_string(path).map_err(|source| FsError::Read {
            path: path.to_path_buf(),
            source,
        })
    }

    fn write_text(&self, path: &Path, text: &str) -> Result<(), FsError> {
        atomic_write(path, text.as_bytes()).map_err(|source| FsError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    fn create_new(&self, path: &Path) -> Result<bool, FsError> {
        match fs::OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(source) => Err(FsError::Write {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn list_directory(&self, path: &Path) -> Result<Vec<DirEntry>, FsError> {
        let list_err = |source| FsError::List {
            path: path.to_path_buf(),
            source,
        };
        let mut entries = Vec::new();
        for entry in fs::read_dir(path).map_err(list_err)? {
            let entry = entry.map_err(list_err)?;
            // Follow symlinks so a linked folder is searched like a real one
            let is_dir = entry.path().is_dir();
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), FsError> {
        fs::rename(from, to).map_err(|source| FsError::Rename {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        })
    }

    fn delete(&self, path: &Path) -> Result<(), FsError> {
        fs::remove_file(path).map_err(|source| FsError::Delete {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_then_read() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("note.md");
        OsFilesystem.write_text(&path, "hello\n").unwrap();
        assert!(OsFilesystem.exists(&path));
        assert_eq!(OsFilesystem.read_text(&path).unwrap(), "hello\n");
    }

    #[test]
    fn create_new_never_replaces_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("note.md");
        assert!(OsFilesystem.create_new(&path).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "");

        fs::write(&path, "kept").unwrap();
        assert!(!OsFilesystem.create_new(&path).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "kept");

        assert!(OsFilesystem.create_new(&tmp.path().join("nope/new.md")).is_err());
    }

    #[test]
    fn exists_is_false_for_directories() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("sub.md")).unwrap();
        assert!(!OsFilesystem.exists(&tmp.path().join("sub.md")));
    }

    #[test]
    fn listing_is_sorted_and_flags_directories() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("b-dir")).unwrap();
        fs::write(tmp.path().join("c.md"), "").unwrap();
        fs::write(tmp.path().join("a.md"), "").unwrap();

        let entries = OsFilesystem.list_directory(tmp.path()).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.md", "b-dir", "c.md"]);
        assert!(entries[1].is_dir);
        assert!(!entries[0].is_dir);
    }

    #[test]
    fn read_missing_file_reports_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("missing.md");
        let err = OsFilesystem.read_text(&path).unwrap_err();
        assert!(err.to_string().contains("missing.md"));
    }

    #[test]
    fn rename_and_delete() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a.md");
        let b = tmp.path().join("b.md");
        fs::write(&a, "x").unwrap();
        OsFilesystem.rename(&a, &b).unwrap();
        assert!(!a.exists());
        assert!(b.exists());
        OsFilesystem.delete(&b).unwrap();
        assert!(!b.exists());
        assert!(OsFilesystem.delete(&b).is_err());
    }
}
