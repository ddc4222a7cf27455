use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// Default quiet period before a burst of writes is reported.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Error type for watch operations
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("cannot watch {path}: no parent directory")]
    NoParent { path: PathBuf },
    #[error("watch error: {0}")]
    Notify(#[from] notify::Error),
}

/// Handle for one live subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

/// A settled change to a subscribed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub subscription: SubscriptionId,
    pub path: PathBuf,
}

/// Change notifications for individual files.
///
/// Events are queued and handed out by `poll()`; the host calls it from its
/// event loop. Implementations must coalesce rapid successive writes into a
/// single event.
pub trait ChangeWatcher {
    fn subscribe(&mut self, path: &Path) -> Result<SubscriptionId, WatchError>;
    /// Stop a subscription. Unknown handles are ignored.
    fn unsubscribe(&mut self, id: SubscriptionId);
    /// Non-blocking: return all settled events.
    fn poll(&mut self) -> Vec<ChangeEvent>;
}

/// Coalesces raw change signals per path until they have been quiet for
/// the stability window.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    pending: HashMap<PathBuf, Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Debouncer {
            window,
            pending: HashMap::new(),
        }
    }

    /// Note a raw change; restarts the quiet period for `path`.
    pub fn record(&mut self, path: PathBuf, at: Instant) {
        self.pending.insert(path, at);
    }

    /// Remove and return paths quiet for at least the window, sorted.
    pub fn settled(&mut self, now: Instant) -> Vec<PathBuf> {
        let window = self.window;
        let mut ready: Vec<PathBuf> = self
            .pending
            .iter()
            .filter(|(_, last)| now.saturating_duration_since(**last) >= window)
            .map(|(p, _)| p.clone())
            .collect();
        for p in &ready {
            self.pending.remove(p);
        }
        ready.sort();
        ready
    }

    pub fn forget(&mut self, path: &Path) {
        self.pending.remove(path);
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }
}

struct Subscription {
    path: PathBuf,
    key: PathBuf,
    dir: PathBuf,
}

/// [`ChangeWatcher`] on top of `notify`.
///
/// Watches the parent directory of each subscribed file (non-recursive) so
/// editors that save by writing a temp file and renaming it over the note
/// are still seen. Directories are reference counted across subscriptions.
pub struct NotifyWatcher {
    watcher: RecommendedWatcher,
    rx: mpsc::Receiver<PathBuf>,
    subs: HashMap<SubscriptionId, Subscription>,
    dirs: HashMap<PathBuf, usize>,
    debouncer: Debouncer,
    next_id: u64,
}

impl NotifyWatcher {
    pub fn new(debounce: Duration) -> Result<Self, WatchError> {
        let (tx, rx) = mpsc::channel();
        let watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let event = match result {
                    Ok(e) => e,
                    Err(_) => return,
                };

                match event.kind {
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {}
                    _ => return,
                }

                for path in event.paths {
                    let is_md = path.extension().and_then(|e| e.to_str()) == Some("md");
                    if is_md {
                        let _ = tx.send(path);
                    }
                }
            },
            Config::default(),
        )?;

        Ok(NotifyWatcher {
            watcher,
            rx,
            subs: HashMap::new(),
            dirs: HashMap::new(),
            debouncer: Debouncer::new(debounce),
            next_id: 1,
        })
    }

    /// Number of live subscriptions.
    pub fn active_count(&self) -> usize {
        self.subs.len()
    }

    fn drain_raw(&mut self) {
        let now = Instant::now();
        while let Ok(path) = self.rx.try_recv() {
            let key = match_key(&path);
            if self.subs.values().any(|s| s.key == key) {
                self.debouncer.record(key, now);
            }
        }
    }
}

impl ChangeWatcher for NotifyWatcher {
    fn subscribe(&mut self, path: &Path) -> Result<SubscriptionId, WatchError> {
        let dir = path
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .ok_or_else(|| WatchError::NoParent {
                path: path.to_path_buf(),
            })?
            .to_path_buf();

        let count = self.dirs.get(&dir).copied().unwrap_or(0);
        if count == 0 {
            self.watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        }
        self.dirs.insert(dir.clone(), count + 1);

        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subs.insert(
            id,
            Subscription {
                path: path.to_path_buf(),
                key: match_key(path),
                dir,
            },
        );
        tracing::debug!(subscription = id.0, path = %path.display(), "watch subscribed");
        Ok(id)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        let Some(sub) = self.subs.remove(&id) else {
            return;
        };
        if !self.subs.values().any(|s| s.key == sub.key) {
            self.debouncer.forget(&sub.key);
        }
        match self.dirs.get(&sub.dir).copied() {
            Some(n) if n > 1 => {
                self.dirs.insert(sub.dir, n - 1);
            }
            Some(_) => {
                self.dirs.remove(&sub.dir);
                if let Err(e) = self.watcher.unwatch(&sub.dir) {
                    tracing::warn!(dir = %sub.dir.display(), error = %e, "unwatch failed");
                }
            }
            None => {}
        }
        tracing::debug!(subscription = id.0, path = %sub.path.display(), "watch released");
    }

    fn poll(&mut self) -> Vec<ChangeEvent> {
        self.drain_raw();
        let settled = self.debouncer.settled(Instant::now());
        let mut events = Vec::new();
        for key in settled {
            let mut ids: Vec<(&SubscriptionId, &Subscription)> =
                self.subs.iter().filter(|(_, s)| s.key == key).collect();
            ids.sort_by_key(|(id, _)| **id);
            for (id, sub) in ids {
                events.push(ChangeEvent {
                    subscription: *id,
                    path: sub.path.clone(),
                });
            }
        }
        events
    }
}

/// Comparable form of a file path: the parent directory is canonicalized
/// when possible so symlinked temp dirs match the paths notify reports.
fn match_key(path: &Path) -> PathBuf {
    match (path.parent(), path.file_name()) {
        (Some(dir), Some(name)) => dir
            .canonicalize()
            .map(|d| d.join(name))
            .unwrap_or_else(|_| path.to_path_buf()),
        _ => path.to_path_buf(),
    }
}
