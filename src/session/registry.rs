use std::collections::{BTreeMap, BTreeSet};

use crate::io::watcher::{ChangeWatcher, SubscriptionId};
use crate::model::identity::FileIdentity;

use super::window::{DisplaySurface, WindowId, WindowState};

/// The process-wide set of open windows, owned by the host.
///
/// Windows never reach each other except through this registry, and the
/// only cross-window question the engine asks is "which window shows this
/// file".
#[derive(Default)]
pub struct WindowRegistry {
    windows: BTreeMap<WindowId, WindowState>,
    next_id: u64,
    focused: Option<WindowId>,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an empty window and focus it.
    pub fn create(&mut self, surface: Box<dyn DisplaySurface>) -> WindowId {
        self.next_id += 1;
        let id = WindowId(self.next_id);
        self.windows.insert(id, WindowState::new(id, surface));
        self.focused = Some(id);
        id
    }

    pub fn get(&self, id: WindowId) -> Option<&WindowState> {
        self.windows.get(&id)
    }

    pub fn get_mut(&mut self, id: WindowId) -> Option<&mut WindowState> {
        self.windows.get_mut(&id)
    }

    pub fn contains(&self, id: WindowId) -> bool {
        self.windows.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn ids(&self) -> Vec<WindowId> {
        self.windows.keys().copied().collect()
    }

    pub fn all_open_file_identities(&self) -> BTreeSet<FileIdentity> {
        self.windows
            .values()
            .filter_map(|w| w.current.clone())
            .collect()
    }

    /// Lowest-numbered window showing `identity`.
    pub fn find_by_identity(&self, identity: &FileIdentity) -> Option<WindowId> {
        self.windows
            .values()
            .find(|w| w.current.as_ref() == Some(identity))
            .map(|w| w.id)
    }

    pub fn window_for_subscription(&self, subscription: SubscriptionId) -> Option<WindowId> {
        self.windows
            .values()
            .find(|w| w.binding().is_some_and(|b| b.subscription == subscription))
            .map(|w| w.id)
    }

    /// Focus the window showing `identity`, if any.
    pub fn focus(&mut self, identity: &FileIdentity) -> Option<WindowId> {
        let id = self.find_by_identity(identity)?;
        self.focused = Some(id);
        Some(id)
    }

    pub fn focused(&self) -> Option<WindowId> {
        self.focused
    }

    /// Close a window, tearing down its subscription. Returns false when
    /// the window was already gone.
    pub fn close(&mut self, id: WindowId, watcher: &mut dyn ChangeWatcher) -> bool {
        let Some(mut window) = self.windows.remove(&id) else {
            return false;
        };
        window.release(watcher);
        if self.focused == Some(id) {
            self.focused = self.windows.keys().next_back().copied();
        }
        tracing::debug!(window = id.0, "window closed");
        true
    }
}
