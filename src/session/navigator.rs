//! Window-level navigation: resolve a target, apply the existence policy,
//! load the note, move the watch subscription and record history.
//!
//! Every operation takes `&mut self`, so navigations on a window are
//! strictly serialized and a rebind always completes (release, then
//! subscribe) before the next navigation starts.

use crate::io::fs::{Filesystem, FsError};
use crate::io::lock::{DirLock, LockError};
use crate::io::recent::RecentFiles;
use crate::io::watcher::{ChangeWatcher, WatchError};
use crate::model::identity::FileIdentity;
use crate::model::intent::{HistoryEntry, NavigationIntent, ResolvedTarget, Viewport};
use crate::ops::policy::{self, Action, CloseChoice, Confirmation, PolicyError, UserPrompt};
use crate::ops::renumber::{self, RenumberError, RenumberReport};
use crate::ops::resolve::resolve;
use crate::parse::convention::{format_sequence_name, parse_sequence_name};

use super::registry::WindowRegistry;
use super::window::{DisplaySurface, UNTITLED, WindowId, WindowState};

/// Error type for navigation
#[derive(Debug, thiserror::Error)]
pub enum NavError {
    #[error("{0} is not open")]
    UnknownWindow(WindowId),
    #[error("{0} has no file")]
    NoFile(WindowId),
    #[error(transparent)]
    Fs(#[from] FsError),
    #[error(transparent)]
    Policy(#[from] PolicyError),
    #[error(transparent)]
    Renumber(#[from] RenumberError),
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error(transparent)]
    Watch(#[from] WatchError),
}

/// Where a confirmed target will be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Replace the window's note, recording where it was.
    SameWindow(Viewport),
    /// Open a separate window (child notes).
    NewWindow,
}

/// A creation waiting for the user's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCreate {
    pub origin: WindowId,
    pub target: ResolvedTarget,
    pub placement: Placement,
}

/// Result of a navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavOutcome {
    Loaded { window: WindowId, path: FileIdentity },
    /// Nothing to navigate to; not an error.
    NoTarget,
    /// The child note was already open elsewhere; that window was closed.
    ToggledClosed(WindowId),
    /// The child note is open elsewhere with unsaved edits. Nothing was
    /// closed; settle it with [`Navigator::resolve_close`].
    CloseRequested(WindowId),
    /// The file was already open; its window was focused instead.
    Focused(WindowId),
    NeedsConfirmation(PendingCreate),
    Aborted,
}

/// Result of asking to close a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    Closed(WindowId),
    /// Unsaved edits; answer with [`Navigator::resolve_close`].
    NeedsDecision(WindowId),
    Kept(WindowId),
}

/// Opens new display surfaces for windows the engine creates itself.
pub type SurfaceFactory = Box<dyn FnMut() -> Box<dyn DisplaySurface>>;

/// Host-owned navigation engine for all windows of one process.
pub struct Navigator<F: Filesystem, W: ChangeWatcher> {
    fs: F,
    watcher: W,
    registry: WindowRegistry,
    recent: Option<RecentFiles>,
    new_surface: SurfaceFactory,
}

impl<F: Filesystem, W: ChangeWatcher> Navigator<F, W> {
    pub fn new(fs: F, watcher: W, new_surface: SurfaceFactory) -> Self {
        Navigator {
            fs,
            watcher,
            registry: WindowRegistry::new(),
            recent: None,
            new_surface,
        }
    }

    /// Record opened notes in a recent-files list.
    pub fn with_recent(mut self, recent: RecentFiles) -> Self {
        self.recent = Some(recent);
        self
    }

    pub fn registry(&self) -> &WindowRegistry {
        &self.registry
    }

    pub fn watcher(&self) -> &W {
        &self.watcher
    }

    pub fn watcher_mut(&mut self) -> &mut W {
        &mut self.watcher
    }

    /// Open an empty window.
    pub fn new_window(&mut self) -> WindowId {
        let surface = (self.new_surface)();
        self.registry.create(surface)
    }

    /// Open `path` in its own window, or focus the window already showing it.
    pub fn open_window(&mut self, path: &FileIdentity) -> Result<NavOutcome, NavError> {
        if let Some(id) = self.registry.focus(path) {
            return Ok(NavOutcome::Focused(id));
        }
        self.load(None, path.clone(), Placement::NewWindow)
    }

    /// Show `path` in an existing window as a plain navigation.
    pub fn open_in(
        &mut self,
        window: WindowId,
        path: &FileIdentity,
        viewport: Viewport,
    ) -> Result<NavOutcome, NavError> {
        self.require(window)?;
        self.load(Some(window), path.clone(), Placement::SameWindow(viewport))
    }

    /// First phase of a navigation. Missing targets come back as
    /// `NeedsConfirmation`; pass the answer to [`Navigator::confirm`].
    pub fn navigate(
        &mut self,
        window: WindowId,
        intent: &NavigationIntent,
        viewport: Viewport,
    ) -> Result<NavOutcome, NavError> {
        let current = match &self.require(window)?.current {
            Some(path) => path.clone(),
            None => return Ok(NavOutcome::NoTarget),
        };

        let Some(target) = resolve(&self.fs, &current, intent) else {
            tracing::debug!(window = window.0, %intent, path = %current, "no navigation target");
            return Ok(NavOutcome::NoTarget);
        };

        let placement = if intent.is_level_down() {
            if let Some(other) = self.registry.find_by_identity(&target.path) {
                return Ok(match self.request_close(other)? {
                    CloseOutcome::Closed(id) => NavOutcome::ToggledClosed(id),
                    _ => NavOutcome::CloseRequested(other),
                });
            }
            Placement::NewWindow
        } else {
            Placement::SameWindow(viewport)
        };

        match policy::decide(target) {
            Action::LoadExisting(path) => self.load(Some(window), path, placement),
            Action::OfferCreate(target) => Ok(NavOutcome::NeedsConfirmation(PendingCreate {
                origin: window,
                target,
                placement,
            })),
            Action::Abort => Ok(NavOutcome::Aborted),
        }
    }

    /// Second phase: act on the user's answer. A window closed while the
    /// question was open makes this a no-op.
    pub fn confirm(
        &mut self,
        pending: PendingCreate,
        answer: Confirmation,
    ) -> Result<NavOutcome, NavError> {
        if !self.registry.contains(pending.origin) {
            tracing::debug!(window = pending.origin.0, "confirmation for closed window ignored");
            return Ok(NavOutcome::Aborted);
        }
        let Some(created) = policy::settle(&self.fs, &pending.target, answer)? else {
            return Ok(NavOutcome::Aborted);
        };
        if let Some(report) = &created.renumbered {
            self.follow_renumbering(report);
        }
        if pending.placement == Placement::NewWindow
            && let Some(id) = self.registry.focus(&created.path)
        {
            return Ok(NavOutcome::Focused(id));
        }
        self.load(Some(pending.origin), created.path, pending.placement)
    }

    /// Both phases, asking `prompt` when a target is missing.
    pub fn navigate_with(
        &mut self,
        window: WindowId,
        intent: &NavigationIntent,
        viewport: Viewport,
        prompt: &mut dyn UserPrompt,
    ) -> Result<NavOutcome, NavError> {
        match self.navigate(window, intent, viewport)? {
            NavOutcome::NeedsConfirmation(pending) => {
                let answer = prompt.confirm_create(&pending.target.path.file_name());
                self.confirm(pending, answer)
            }
            NavOutcome::CloseRequested(other) => match self.close_with(other, prompt)? {
                CloseOutcome::Closed(id) => Ok(NavOutcome::ToggledClosed(id)),
                _ => Ok(NavOutcome::Aborted),
            },
            other => Ok(other),
        }
    }

    pub fn back(&mut self, window: WindowId, viewport: Viewport) -> Result<NavOutcome, NavError> {
        self.step(window, viewport, true)
    }

    pub fn forward(&mut self, window: WindowId, viewport: Viewport) -> Result<NavOutcome, NavError> {
        self.step(window, viewport, false)
    }

    fn step(
        &mut self,
        window: WindowId,
        viewport: Viewport,
        backwards: bool,
    ) -> Result<NavOutcome, NavError> {
        let w = self.require_mut(window)?;
        let Some(current) = w.current.clone() else {
            return Ok(NavOutcome::NoTarget);
        };
        let here = HistoryEntry::new(current, viewport);
        let entry = if backwards {
            w.history.back(here)
        } else {
            w.history.forward(here)
        };
        let Some(entry) = entry else {
            return Ok(NavOutcome::NoTarget);
        };

        let w = self
            .registry
            .get_mut(window)
            .ok_or(NavError::UnknownWindow(window))?;
        let loaded = match self.fs.read_text(entry.path.path()) {
            Ok(text) => w
                .bind(&mut self.watcher, &entry.path)
                .map(|()| text)
                .map_err(NavError::from),
            Err(e) => Err(e.into()),
        };
        let text = match loaded {
            Ok(text) => text,
            Err(e) => {
                // Put the stacks back the way they were
                if backwards {
                    w.history.forward(entry);
                } else {
                    w.history.back(entry);
                }
                return Err(e);
            }
        };

        w.show(entry.path.clone(), text);
        w.surface().restore_cursor(entry.cursor_offset);
        w.surface().restore_scroll(entry.scroll_offset);
        Ok(NavOutcome::Loaded {
            window,
            path: entry.path,
        })
    }

    /// Write the window's text to its file. Zero-width spaces are dropped.
    pub fn save(&mut self, window: WindowId, text: &str) -> Result<FileIdentity, NavError> {
        let path = self
            .require(window)?
            .current
            .clone()
            .ok_or(NavError::NoFile(window))?;
        let cleaned = text.replace('\u{200B}', "");
        self.fs.write_text(path.path(), &cleaned)?;
        self.require_mut(window)?.mark_synced(cleaned);
        self.remember(&path);
        Ok(path)
    }

    pub fn mark_dirty(&mut self, window: WindowId) -> Result<(), NavError> {
        self.require_mut(window)?.dirty = true;
        Ok(())
    }

    /// First phase of closing. A clean window closes at once; one with
    /// unsaved edits stays open and comes back as `NeedsDecision`.
    pub fn request_close(&mut self, window: WindowId) -> Result<CloseOutcome, NavError> {
        if self.require(window)?.dirty {
            tracing::debug!(window = window.0, "close waits for a decision");
            return Ok(CloseOutcome::NeedsDecision(window));
        }
        self.registry.close(window, &mut self.watcher);
        Ok(CloseOutcome::Closed(window))
    }

    /// Second phase of closing a dirty window. `Save` writes the surface's
    /// current text first; a window already gone counts as closed.
    pub fn resolve_close(
        &mut self,
        window: WindowId,
        choice: CloseChoice,
    ) -> Result<CloseOutcome, NavError> {
        let Some(w) = self.registry.get(window) else {
            return Ok(CloseOutcome::Closed(window));
        };
        match choice {
            CloseChoice::Cancel => return Ok(CloseOutcome::Kept(window)),
            CloseChoice::Save => {
                let Some(text) = w.edited_text() else {
                    tracing::warn!(window = window.0, "surface has no text to save, window kept");
                    return Ok(CloseOutcome::Kept(window));
                };
                self.save(window, &text)?;
            }
            CloseChoice::Discard => {
                tracing::debug!(window = window.0, "unsaved edits discarded");
            }
        }
        self.registry.close(window, &mut self.watcher);
        Ok(CloseOutcome::Closed(window))
    }

    /// Both phases, asking `prompt` when the window has unsaved edits.
    pub fn close_with(
        &mut self,
        window: WindowId,
        prompt: &mut dyn UserPrompt,
    ) -> Result<CloseOutcome, NavError> {
        match self.request_close(window)? {
            CloseOutcome::NeedsDecision(id) => {
                let name = self
                    .require(id)?
                    .current
                    .as_ref()
                    .map_or_else(|| UNTITLED.to_string(), FileIdentity::file_name);
                let choice = prompt.confirm_close(&name);
                self.resolve_close(id, choice)
            }
            other => Ok(other),
        }
    }

    /// Drain settled change events and hand fresh content to the affected
    /// windows. Returns the windows that were notified.
    pub fn process_changes(&mut self) -> Vec<WindowId> {
        let mut notified = Vec::new();
        for event in self.watcher.poll() {
            let Some(id) = self.registry.window_for_subscription(event.subscription) else {
                continue;
            };
            let text = match self.fs.read_text(&event.path) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(window = id.0, error = %e, "changed file could not be re-read");
                    continue;
                }
            };
            let Some(w) = self.registry.get_mut(id) else {
                continue;
            };
            if !w.differs_from_synced(&text) {
                continue;
            }
            let Some(path) = w.current.clone() else {
                continue;
            };
            let dirty = w.dirty;
            w.surface().notify_external_change(&path, &text, dirty);
            w.note_disk_text(text);
            notified.push(id);
        }
        notified
    }

    /// Delete the window's sequence note, close the gap, and show the note
    /// that now sits just before it (or in its place).
    pub fn remove_sequence_note(
        &mut self,
        window: WindowId,
        prompt: &mut dyn UserPrompt,
    ) -> Result<NavOutcome, NavError> {
        let Some(current) = self.require(window)?.current.clone() else {
            return Ok(NavOutcome::NoTarget);
        };
        let name = current.file_name();
        let Some(seq) = parse_sequence_name(&name) else {
            return Ok(NavOutcome::NoTarget);
        };
        if prompt.confirm_delete(&name) == Confirmation::Declined {
            return Ok(NavOutcome::Aborted);
        }

        let dir = current.dir().to_path_buf();
        let report = {
            let _lock = DirLock::acquire_default(&dir)?;
            renumber::delete_note(&self.fs, &dir, &name)?
        };

        let candidates = [seq.number.checked_sub(1), Some(seq.number)];
        let next = candidates.into_iter().flatten().find_map(|n| {
            let path = current.with_file_name(&format_sequence_name(&seq.prefix, n, seq.width()));
            self.fs.exists(path.path()).then_some(path)
        });

        let w = self
            .registry
            .get_mut(window)
            .ok_or(NavError::UnknownWindow(window))?;
        w.release(&mut self.watcher);
        w.current = None;
        self.follow_renumbering(&report);
        match next {
            Some(path) => self.load(Some(window), path, Placement::SameWindow(Viewport::default())),
            None => Ok(NavOutcome::NoTarget),
        }
    }

    fn load(
        &mut self,
        window: Option<WindowId>,
        path: FileIdentity,
        placement: Placement,
    ) -> Result<NavOutcome, NavError> {
        let text = self.fs.read_text(path.path())?;

        let (id, viewport) = match (placement, window) {
            (Placement::SameWindow(viewport), Some(id)) => {
                self.require(id)?;
                (id, Some(viewport))
            }
            _ => (self.new_window(), None),
        };

        let w = self
            .registry
            .get_mut(id)
            .ok_or(NavError::UnknownWindow(id))?;
        if let Err(e) = w.bind(&mut self.watcher, &path) {
            if viewport.is_none() {
                self.registry.close(id, &mut self.watcher);
            }
            return Err(e.into());
        }
        if let Some(viewport) = viewport
            && let Some(previous) = w.current.clone()
        {
            w.history.visit(HistoryEntry::new(previous, viewport));
        }
        w.show(path.clone(), text);
        self.remember(&path);
        tracing::debug!(window = id.0, path = %path, "loaded");
        Ok(NavOutcome::Loaded { window: id, path })
    }

    /// Point history entries and open windows at the names their notes
    /// carry after a renumbering. Entries for a deleted note are dropped.
    fn follow_renumbering(&mut self, report: &RenumberReport) {
        for id in self.registry.ids() {
            let Some(w) = self.registry.get_mut(id) else {
                continue;
            };
            w.history.remap(|entry| {
                let path = renumbered_path(&entry.path, report)?;
                Some(HistoryEntry { path, ..entry })
            });
            let Some(current) = w.current.clone() else {
                continue;
            };
            if let Some(moved) = renumbered_path(&current, report)
                && moved != current
            {
                tracing::debug!(window = id.0, from = %current, to = %moved, "window follows renamed note");
                w.current = Some(moved.clone());
                if let Err(e) = w.bind(&mut self.watcher, &moved) {
                    tracing::warn!(window = id.0, path = %moved, error = %e, "could not watch renamed note");
                }
            }
        }
    }

    fn remember(&self, path: &FileIdentity) {
        if let Some(recent) = &self.recent
            && let Err(e) = recent.add(path.path(), &path.file_name())
        {
            tracing::warn!(path = %path, error = %e, "could not update recent files");
        }
    }

    fn require(&self, id: WindowId) -> Result<&WindowState, NavError> {
        self.registry.get(id).ok_or(NavError::UnknownWindow(id))
    }

    fn require_mut(&mut self, id: WindowId) -> Result<&mut WindowState, NavError> {
        self.registry.get_mut(id).ok_or(NavError::UnknownWindow(id))
    }
}

/// Where the note at `path` lives after `report`; `None` if it was deleted.
fn renumbered_path(path: &FileIdentity, report: &RenumberReport) -> Option<FileIdentity> {
    if report.removed.as_deref() == Some(path.path()) {
        return None;
    }
    match report.renames.iter().find(|r| r.from == path.path()) {
        Some(rename) => {
            let name = rename.to.file_name()?.to_string_lossy();
            Some(path.with_file_name(&name))
        }
        None => Some(path.clone()),
    }
}
