//! Fakes for the host-side collaborators, shared by session tests.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::io::watcher::{ChangeEvent, ChangeWatcher, SubscriptionId, WatchError};
use crate::model::identity::FileIdentity;
use crate::ops::policy::{CloseChoice, Confirmation, UserPrompt};

use super::window::DisplaySurface;

/// In-memory watcher: events are injected with `fire`.
#[derive(Default)]
pub struct FakeWatcher {
    live: BTreeMap<SubscriptionId, PathBuf>,
    queued: Vec<ChangeEvent>,
    next_id: u64,
    max_live: usize,
    fail_next: bool,
}

impl FakeWatcher {
    pub fn live_paths(&self) -> Vec<PathBuf> {
        self.live.values().cloned().collect()
    }

    pub fn max_live(&self) -> usize {
        self.max_live
    }

    pub fn fail_next_subscribe(&mut self) {
        self.fail_next = true;
    }

    /// Simulate a settled change to `path`.
    pub fn fire(&mut self, path: &Path) {
        for (id, p) in &self.live {
            if p == path {
                self.queued.push(ChangeEvent {
                    subscription: *id,
                    path: p.clone(),
                });
            }
        }
    }
}

impl ChangeWatcher for FakeWatcher {
    fn subscribe(&mut self, path: &Path) -> Result<SubscriptionId, WatchError> {
        if std::mem::take(&mut self.fail_next) {
            return Err(WatchError::NoParent {
                path: path.to_path_buf(),
            });
        }
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.live.insert(id, path.to_path_buf());
        self.max_live = self.max_live.max(self.live.len());
        Ok(id)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.live.remove(&id);
    }

    fn poll(&mut self) -> Vec<ChangeEvent> {
        std::mem::take(&mut self.queued)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCall {
    Load(FileIdentity, String),
    External(FileIdentity, String, bool),
    Cursor(usize),
    Scroll(usize),
}

/// Editable text held by a [`RecordingSurface`]; tests type into it.
pub type Buffer = Rc<RefCell<Option<String>>>;

/// Surface that logs every call into a shared vector.
pub struct RecordingSurface {
    log: Rc<RefCell<Vec<SurfaceCall>>>,
    buffer: Buffer,
}

impl RecordingSurface {
    pub fn new() -> (Self, Rc<RefCell<Vec<SurfaceCall>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let surface = RecordingSurface {
            log: log.clone(),
            buffer: Buffer::default(),
        };
        (surface, log)
    }

    pub fn buffer(&self) -> Buffer {
        self.buffer.clone()
    }
}

impl DisplaySurface for RecordingSurface {
    fn load_content(&mut self, path: &FileIdentity, text: &str) {
        self.log
            .borrow_mut()
            .push(SurfaceCall::Load(path.clone(), text.to_string()));
        *self.buffer.borrow_mut() = Some(text.to_string());
    }

    fn notify_external_change(&mut self, path: &FileIdentity, new_text: &str, local_dirty: bool) {
        self.log.borrow_mut().push(SurfaceCall::External(
            path.clone(),
            new_text.to_string(),
            local_dirty,
        ));
    }

    fn restore_cursor(&mut self, offset: usize) {
        self.log.borrow_mut().push(SurfaceCall::Cursor(offset));
    }

    fn restore_scroll(&mut self, offset: usize) {
        self.log.borrow_mut().push(SurfaceCall::Scroll(offset));
    }

    fn current_text(&self) -> Option<String> {
        self.buffer.borrow().clone()
    }
}

/// Prompt answering from a script; records every question asked.
/// Unscripted close questions are cancelled.
#[derive(Default)]
pub struct ScriptedPrompt {
    pub answers: VecDeque<Confirmation>,
    pub close_answers: VecDeque<CloseChoice>,
    pub asked: Vec<String>,
}

impl ScriptedPrompt {
    pub fn answering(answers: &[Confirmation]) -> Self {
        ScriptedPrompt {
            answers: answers.iter().copied().collect(),
            ..Default::default()
        }
    }

    pub fn closing(choices: &[CloseChoice]) -> Self {
        ScriptedPrompt {
            close_answers: choices.iter().copied().collect(),
            ..Default::default()
        }
    }

    fn next(&mut self, name: &str) -> Confirmation {
        self.asked.push(name.to_string());
        self.answers.pop_front().unwrap_or(Confirmation::Declined)
    }
}

impl UserPrompt for ScriptedPrompt {
    fn confirm_create(&mut self, target_name: &str) -> Confirmation {
        self.next(target_name)
    }

    fn confirm_delete(&mut self, target_name: &str) -> Confirmation {
        self.next(target_name)
    }

    fn confirm_close(&mut self, target_name: &str) -> CloseChoice {
        self.asked.push(target_name.to_string());
        self.close_answers.pop_front().unwrap_or(CloseChoice::Cancel)
    }
}
