use serde::Serialize;

use crate::io::fs::{Filesystem, FsError};
use crate::io::lock::{DirLock, LockError};
use crate::model::identity::FileIdentity;
use crate::model::intent::ResolvedTarget;
use crate::ops::renumber::{self, RenumberError, RenumberReport};

/// Error type for creating a missing target
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error(transparent)]
    Fs(#[from] FsError),
    #[error(transparent)]
    Renumber(#[from] RenumberError),
    #[error(transparent)]
    Lock(#[from] LockError),
}

/// The user's answer to a create/delete question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confirmation {
    Accepted,
    Declined,
}

/// The user's answer when a window with unsaved edits is about to close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CloseChoice {
    Save,
    Discard,
    Cancel,
}

/// Asks the user questions. Answers may take arbitrarily long.
pub trait UserPrompt {
    fn confirm_create(&mut self, target_name: &str) -> Confirmation;
    fn confirm_delete(&mut self, target_name: &str) -> Confirmation;
    fn confirm_close(&mut self, target_name: &str) -> CloseChoice;
}

/// What to do with a resolved target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    LoadExisting(FileIdentity),
    /// The target is missing; ask before creating it.
    OfferCreate(ResolvedTarget),
    Abort,
}

/// Outcome of a confirmed creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Created {
    pub path: FileIdentity,
    /// False when a note appeared at `path` while the question was open;
    /// it was left as is.
    pub created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renumbered: Option<RenumberReport>,
}

/// Existing targets load; everything else, whatever intent produced it,
/// is offered for creation and never created silently.
pub fn decide(target: ResolvedTarget) -> Action {
    if target.exists && target.insert.is_none() {
        Action::LoadExisting(target.path)
    } else {
        Action::OfferCreate(target)
    }
}

/// Apply the user's answer to an `OfferCreate`.
///
/// On acceptance an insert slot is opened first (renumbering under the
/// directory lock), then the empty note is created. An existing file is
/// never replaced. On decline nothing happens.
pub fn settle(
    fs: &dyn Filesystem,
    target: &ResolvedTarget,
    answer: Confirmation,
) -> Result<Option<Created>, PolicyError> {
    if answer == Confirmation::Declined {
        return Ok(None);
    }

    let dir = target.path.dir();
    let renumbered = match &target.insert {
        Some(slot) => {
            let _lock = DirLock::acquire_default(dir)?;
            Some(renumber::insert(
                fs,
                dir,
                &slot.prefix,
                slot.index,
                slot.width,
            )?)
        }
        None => None,
    };

    let created = fs.create_new(target.path.path())?;
    if created {
        tracing::debug!(path = %target.path, "created note");
    } else {
        tracing::debug!(path = %target.path, "note appeared before confirmation, keeping it");
    }
    Ok(Some(Created {
        path: target.path.clone(),
        created,
        renumbered,
    }))
}

/// Both phases at once, for hosts that can block on the prompt.
pub fn open(
    fs: &dyn Filesystem,
    prompt: &mut dyn UserPrompt,
    target: ResolvedTarget,
) -> Result<Action, PolicyError> {
    match decide(target) {
        Action::OfferCreate(target) => {
            let answer = prompt.confirm_create(&target.path.file_name());
            match settle(fs, &target, answer)? {
                Some(created) => Ok(Action::LoadExisting(created.path)),
                None => Ok(Action::Abort),
            }
        }
        other => Ok(other),
    }
}
