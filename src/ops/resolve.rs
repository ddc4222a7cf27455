//! Target resolution: from the note a window shows and a navigation intent
//! to the note it should show next.
//!
//! Resolution only looks at the disk (existence checks, one directory
//! listing for link fallback); it never creates or renames anything.
//! `None` means "nothing to navigate to" and callers treat it as a silent
//! no-op.

use std::path::Path;

use crate::io::fs::Filesystem;
use crate::model::identity::FileIdentity;
use crate::model::intent::{NavigationIntent, ResolvedTarget, SlotInsert};
use crate::parse::convention::{
    INDEX_NOTE, child_name, format_sequence_name, parse_date_name, parse_sequence_name,
    shift_date_name, shift_sequence_name,
};

/// Maps a note name and a step count to a neighbouring note name.
type ShiftStrategy = fn(&str, i64) -> Option<String>;

/// Day steps try the date chain first and fall back to the sequence chain,
/// so callers never need to know which convention a note uses.
const DAY_STRATEGIES: &[ShiftStrategy] = &[shift_date_name, shift_sequence_name];

const SEQUENCE_STRATEGIES: &[ShiftStrategy] = &[shift_sequence_name];

/// Resolve `intent` relative to `current`.
pub fn resolve(
    fs: &dyn Filesystem,
    current: &FileIdentity,
    intent: &NavigationIntent,
) -> Option<ResolvedTarget> {
    match intent {
        NavigationIntent::ShiftByDays(n) => shift(fs, current, *n, DAY_STRATEGIES),
        NavigationIntent::ShiftBySequence(n) => shift(fs, current, *n, SEQUENCE_STRATEGIES),
        NavigationIntent::LevelUp => level_up(fs, current),
        NavigationIntent::LevelDown => Some(level_down(fs, current)),
        NavigationIntent::FollowLink(text) => follow_link(fs, current, text),
        NavigationIntent::InsertSequenceSlot(n) => insert_slot(current, *n),
    }
}

fn shift(
    fs: &dyn Filesystem,
    current: &FileIdentity,
    n: i64,
    strategies: &[ShiftStrategy],
) -> Option<ResolvedTarget> {
    let name = current.file_name();
    let next = strategies.iter().find_map(|strategy| strategy(&name, n))?;
    Some(existing_or_not(fs, current.with_file_name(&next)))
}

/// Month note first, then `index.md` beside the note, then `index.md` one
/// directory up.
fn level_up(fs: &dyn Filesystem, current: &FileIdentity) -> Option<ResolvedTarget> {
    let name = current.file_name();

    if let Some(date) = parse_date_name(&name) {
        let month = current.with_file_name(&date.month_note_name());
        if fs.exists(month.path()) {
            return Some(ResolvedTarget::new(month, true));
        }
    }

    // An index note goes up past itself
    let here = current.with_file_name(INDEX_NOTE);
    if here != *current && fs.exists(here.path()) {
        return Some(ResolvedTarget::new(here, true));
    }

    let parent_dir = current.dir().parent()?;
    let above = FileIdentity::new(parent_dir.join(INDEX_NOTE)).ok()?;
    if fs.exists(above.path()) {
        return Some(ResolvedTarget::new(above, true));
    }
    None
}

fn level_down(fs: &dyn Filesystem, current: &FileIdentity) -> ResolvedTarget {
    let child = current.with_file_name(&child_name(&current.file_name()));
    existing_or_not(fs, child)
}

/// Absolute targets are used as written; relative ones resolve beside the
/// current note, then in each immediate subdirectory in name order. When
/// nothing matches, the target beside the current note is offered for
/// creation.
fn follow_link(fs: &dyn Filesystem, current: &FileIdentity, text: &str) -> Option<ResolvedTarget> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let file = with_md_extension(text);

    if Path::new(text).is_absolute() {
        let target = FileIdentity::new(&file).ok()?;
        return Some(existing_or_not(fs, target));
    }

    let dir = current.dir();
    let primary = FileIdentity::new(dir.join(&file)).ok()?;
    if fs.exists(primary.path()) {
        return Some(ResolvedTarget::new(primary, true));
    }

    let entries = match fs.list_directory(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "link fallback search skipped");
            Vec::new()
        }
    };
    for entry in entries.iter().filter(|e| e.is_dir) {
        let candidate = dir.join(&entry.name).join(&file);
        if fs.exists(&candidate)
            && let Ok(found) = FileIdentity::new(&candidate)
        {
            return Some(ResolvedTarget::new(found, true));
        }
    }

    Some(ResolvedTarget::new(primary, false))
}

fn insert_slot(current: &FileIdentity, n: i64) -> Option<ResolvedTarget> {
    let seq = parse_sequence_name(&current.file_name())?;
    let index = seq.shifted(n)?;
    let width = seq.width();
    let path = current.with_file_name(&format_sequence_name(&seq.prefix, index, width));
    Some(ResolvedTarget {
        path,
        exists: false,
        insert: Some(SlotInsert {
            prefix: seq.prefix,
            index,
            width,
        }),
    })
}

fn existing_or_not(fs: &dyn Filesystem, path: FileIdentity) -> ResolvedTarget {
    let exists = fs.exists(path.path());
    ResolvedTarget::new(path, exists)
}

fn with_md_extension(text: &str) -> String {
    if text.ends_with(".md") {
        text.to_string()
    } else {
        format!("{}.md", text)
    }
}
