use std::fmt;

use serde::{Deserialize, Serialize};

use super::identity::FileIdentity;

/// A navigation request issued by a window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationIntent {
    /// Walk the date chain by `n` days (falls back to the sequence chain).
    ShiftByDays(i64),
    /// Walk the sequence chain by `n` steps.
    ShiftBySequence(i64),
    /// Go to the month note or the nearest `index.md`.
    LevelUp,
    /// Go to the `_<name>` child note.
    LevelDown,
    /// Follow an internal `[[link]]` target.
    FollowLink(String),
    /// Open a slot at `current + n` in the sequence, shifting later notes up.
    InsertSequenceSlot(i64),
}

impl NavigationIntent {
    /// True for intents whose resolution must never create a duplicate
    /// window for the same target.
    pub fn is_level_down(&self) -> bool {
        matches!(self, NavigationIntent::LevelDown)
    }
}

impl fmt::Display for NavigationIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationIntent::ShiftByDays(n) => write!(f, "shift by {} day(s)", n),
            NavigationIntent::ShiftBySequence(n) => write!(f, "shift by {} step(s)", n),
            NavigationIntent::LevelUp => write!(f, "level up"),
            NavigationIntent::LevelDown => write!(f, "level down"),
            NavigationIntent::FollowLink(text) => write!(f, "follow link [[{}]]", text),
            NavigationIntent::InsertSequenceSlot(n) => write!(f, "insert slot at {:+}", n),
        }
    }
}

/// Renumbering work that must happen before a sequence slot is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotInsert {
    pub prefix: String,
    pub index: u32,
    pub width: usize,
}

/// Output of the resolver, consumed by the existence policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTarget {
    pub path: FileIdentity,
    pub exists: bool,
    /// Present only for `InsertSequenceSlot`; forces creation with renumbering.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert: Option<SlotInsert>,
}

impl ResolvedTarget {
    pub fn new(path: FileIdentity, exists: bool) -> Self {
        ResolvedTarget {
            path,
            exists,
            insert: None,
        }
    }
}

/// Cursor and scroll offsets of a window's editor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub cursor: usize,
    pub scroll: usize,
}

/// Snapshot of where a window was, for back/forward navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub path: FileIdentity,
    pub cursor_offset: usize,
    pub scroll_offset: usize,
}

impl HistoryEntry {
    pub fn new(path: FileIdentity, viewport: Viewport) -> Self {
        HistoryEntry {
            path,
            cursor_offset: viewport.cursor,
            scroll_offset: viewport.scroll,
        }
    }

    pub fn viewport(&self) -> Viewport {
        Viewport {
            cursor: self.cursor_offset,
            scroll: self.scroll_offset,
        }
    }
}
