//! Renumbering of sequence notes (`card01.md`, `card02.md`, ...).
//!
//! Renames run in an order that never needs a name still in use: highest
//! number first when opening a gap, lowest first when closing one. A failed
//! rename stops the run; the error carries the renames already done so the
//! caller can report exactly what state the directory is in.

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Serialize;

use crate::io::fs::{FsError, Filesystem};
use crate::parse::convention::{format_sequence_name, is_sequence_prefix, parse_sequence_name};

/// Error type for renumbering
#[derive(Debug, thiserror::Error)]
pub enum RenumberError {
    #[error("not a sequence note name: {0}")]
    Format(String),
    #[error(transparent)]
    List(FsError),
    #[error("cannot rename {} to {}: target already exists", .from.display(), .to.display())]
    Collision {
        from: PathBuf,
        to: PathBuf,
        completed: Vec<Rename>,
    },
    #[error("renumbering stopped after {} rename(s): {source}", .completed.len())]
    Partial {
        completed: Vec<Rename>,
        #[source]
        source: FsError,
    },
}

/// One performed rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rename {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// What a renumbering run did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenumberReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed: Option<PathBuf>,
    pub renames: Vec<Rename>,
}

/// A member of a sequence group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    pub number: u32,
}

/// Files in `dir` named `<prefix><digits>.md`, ascending by numeric value.
pub fn sequence_group(
    fs: &dyn Filesystem,
    dir: &Path,
    prefix: &str,
) -> Result<Vec<Member>, RenumberError> {
    if !is_sequence_prefix(prefix) {
        return Err(RenumberError::Format(prefix.to_string()));
    }
    let re = Regex::new(&format!(r"^{}(\d+)\.md$", regex::escape(prefix)))
        .map_err(|_| RenumberError::Format(prefix.to_string()))?;

    let mut members: Vec<Member> = fs
        .list_directory(dir)
        .map_err(RenumberError::List)?
        .into_iter()
        .filter(|e| !e.is_dir)
        .filter_map(|e| {
            let number = re.captures(&e.name)?[1].parse().ok()?;
            Some(Member {
                name: e.name,
                number,
            })
        })
        .collect();
    members.sort_by(|a, b| a.number.cmp(&b.number).then_with(|| a.name.cmp(&b.name)));
    Ok(members)
}

/// Shift every note numbered `index` or higher up by one, leaving `index`
/// free for a new note. The caller creates the new note.
pub fn insert(
    fs: &dyn Filesystem,
    dir: &Path,
    prefix: &str,
    index: u32,
    width: usize,
) -> Result<RenumberReport, RenumberError> {
    let group = sequence_group(fs, dir, prefix)?;
    let mut completed = Vec::new();

    for member in group.iter().rev().filter(|m| m.number >= index) {
        let to_name = format_sequence_name(prefix, member.number + 1, width);
        rename_one(fs, dir, &member.name, &to_name, &mut completed)?;
    }

    tracing::debug!(dir = %dir.display(), prefix, index, renamed = completed.len(), "opened sequence slot");
    Ok(RenumberReport {
        removed: None,
        renames: completed,
    })
}

/// Delete the note numbered `index` (if present) and shift every higher
/// note down by one.
pub fn delete(
    fs: &dyn Filesystem,
    dir: &Path,
    prefix: &str,
    index: u32,
    width: usize,
) -> Result<RenumberReport, RenumberError> {
    let group = sequence_group(fs, dir, prefix)?;
    let mut completed = Vec::new();

    let preferred = format_sequence_name(prefix, index, width);
    let victim = group
        .iter()
        .find(|m| m.name == preferred)
        .or_else(|| group.iter().find(|m| m.number == index));

    let removed = match victim {
        Some(m) => {
            let path = dir.join(&m.name);
            fs.delete(&path).map_err(|source| RenumberError::Partial {
                completed: Vec::new(),
                source,
            })?;
            Some(path)
        }
        None => None,
    };

    for member in group.iter().filter(|m| m.number > index) {
        let to_name = format_sequence_name(prefix, member.number - 1, width);
        rename_one(fs, dir, &member.name, &to_name, &mut completed)?;
    }

    tracing::debug!(dir = %dir.display(), prefix, index, renamed = completed.len(), "closed sequence gap");
    Ok(RenumberReport {
        removed,
        renames: completed,
    })
}

/// Delete `note` itself and close the gap it leaves.
pub fn delete_note(
    fs: &dyn Filesystem,
    dir: &Path,
    note: &str,
) -> Result<RenumberReport, RenumberError> {
    let seq = parse_sequence_name(note).ok_or_else(|| RenumberError::Format(note.to_string()))?;
    delete(fs, dir, &seq.prefix, seq.number, seq.width())
}

fn rename_one(
    fs: &dyn Filesystem,
    dir: &Path,
    from_name: &str,
    to_name: &str,
    completed: &mut Vec<Rename>,
) -> Result<(), RenumberError> {
    let from = dir.join(from_name);
    let to = dir.join(to_name);
    if fs.exists(&to) {
        return Err(RenumberError::Collision {
            from,
            to,
            completed: std::mem::take(completed),
        });
    }
    if let Err(source) = fs.rename(&from, &to) {
        return Err(RenumberError::Partial {
            completed: std::mem::take(completed),
            source,
        });
    }
    completed.push(Rename { from, to });
    Ok(())
}
