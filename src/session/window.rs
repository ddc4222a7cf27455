use std::fmt;

use crate::io::watcher::{ChangeWatcher, SubscriptionId, WatchError};
use crate::model::identity::FileIdentity;

use super::history::NavigationHistory;

/// Title shown for a window with no file.
pub const UNTITLED: &str = "Bext Editor";

/// Host-assigned window identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window {}", self.0)
    }
}

/// Where a window shows text. Owned by the window, driven by the navigator.
pub trait DisplaySurface {
    fn load_content(&mut self, path: &FileIdentity, text: &str);
    /// The file changed on disk. `local_dirty` says whether the window has
    /// unsaved edits; resolving that conflict is the surface's job.
    fn notify_external_change(&mut self, path: &FileIdentity, new_text: &str, local_dirty: bool);
    fn restore_cursor(&mut self, offset: usize);
    fn restore_scroll(&mut self, offset: usize);
    /// The text as currently edited, for saving before a close. `None` when
    /// the surface keeps no editable buffer.
    fn current_text(&self) -> Option<String>;
}

/// The single live change subscription of a window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchBinding {
    pub path: FileIdentity,
    pub subscription: SubscriptionId,
}

/// Everything the engine tracks for one open window.
pub struct WindowState {
    pub id: WindowId,
    pub current: Option<FileIdentity>,
    pub history: NavigationHistory,
    pub dirty: bool,
    binding: Option<WatchBinding>,
    /// Last text loaded from or written to disk, to tell our own saves
    /// apart from external edits.
    last_synced: Option<String>,
    surface: Box<dyn DisplaySurface>,
}

impl WindowState {
    pub fn new(id: WindowId, surface: Box<dyn DisplaySurface>) -> Self {
        WindowState {
            id,
            current: None,
            history: NavigationHistory::new(),
            dirty: false,
            binding: None,
            last_synced: None,
            surface,
        }
    }

    pub fn binding(&self) -> Option<&WatchBinding> {
        self.binding.as_ref()
    }

    pub fn surface(&mut self) -> &mut dyn DisplaySurface {
        self.surface.as_mut()
    }

    /// Point the window's subscription at `path`. The old subscription is
    /// released before the new one is made, so the window never holds two.
    /// If subscribing fails the old path is watched again.
    pub fn bind(
        &mut self,
        watcher: &mut dyn ChangeWatcher,
        path: &FileIdentity,
    ) -> Result<(), WatchError> {
        let previous = self.binding.take();
        if let Some(old) = &previous {
            watcher.unsubscribe(old.subscription);
        }
        match watcher.subscribe(path.path()) {
            Ok(subscription) => {
                tracing::debug!(window = self.id.0, path = %path, "watch bound");
                self.binding = Some(WatchBinding {
                    path: path.clone(),
                    subscription,
                });
                Ok(())
            }
            Err(e) => {
                if let Some(old) = previous {
                    match watcher.subscribe(old.path.path()) {
                        Ok(subscription) => {
                            self.binding = Some(WatchBinding {
                                path: old.path,
                                subscription,
                            });
                        }
                        Err(again) => {
                            tracing::warn!(window = self.id.0, path = %old.path, error = %again, "watch lost");
                        }
                    }
                }
                Err(e)
            }
        }
    }

    pub fn release(&mut self, watcher: &mut dyn ChangeWatcher) {
        if let Some(old) = self.binding.take() {
            watcher.unsubscribe(old.subscription);
        }
    }

    /// Show `text` as the window's file content and forget local edits.
    pub fn show(&mut self, path: FileIdentity, text: String) {
        self.surface.load_content(&path, &text);
        self.current = Some(path);
        self.dirty = false;
        self.last_synced = Some(text);
    }

    pub fn edited_text(&self) -> Option<String> {
        self.surface.current_text()
    }

    pub fn mark_synced(&mut self, text: String) {
        self.dirty = false;
        self.last_synced = Some(text);
    }

    /// Remember disk content handed to the surface without touching the
    /// dirty flag; the surface decides whether to adopt it.
    pub fn note_disk_text(&mut self, text: String) {
        self.last_synced = Some(text);
    }

    /// True when `text` on disk differs from what this window last
    /// loaded or wrote.
    pub fn differs_from_synced(&self, text: &str) -> bool {
        self.last_synced.as_deref() != Some(text)
    }

    pub fn title(&self) -> String {
        window_title(self.current.as_ref(), self.dirty)
    }
}

/// File name of the window's note, `*`-prefixed when there are unsaved edits.
pub fn window_title(path: Option<&FileIdentity>, dirty: bool) -> String {
    let base = match path {
        Some(p) => p.file_name(),
        None => UNTITLED.to_string(),
    };
    if dirty { format!("*{}", base) } else { base }
}
