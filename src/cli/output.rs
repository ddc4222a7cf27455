use serde::Serialize;

use crate::io::recent::RecentEntry;
use crate::model::intent::ResolvedTarget;
use crate::parse::wiki_link::WikiLink;
use crate::session::navigator::NavOutcome;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct OutcomeJson {
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Serialize)]
pub struct LinkJson {
    pub target: String,
    pub start: usize,
    pub end: usize,
}

#[derive(Serialize)]
pub struct ChangeJson {
    pub path: String,
    pub dirty: bool,
    pub bytes: usize,
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

pub fn outcome_to_json(outcome: &NavOutcome) -> OutcomeJson {
    let (outcome, path) = match outcome {
        NavOutcome::Loaded { path, .. } => ("loaded", Some(path.to_string())),
        NavOutcome::NoTarget => ("none", None),
        NavOutcome::ToggledClosed(_) => ("closed", None),
        NavOutcome::CloseRequested(_) => ("unsaved", None),
        NavOutcome::Focused(_) => ("focused", None),
        NavOutcome::NeedsConfirmation(pending) => {
            ("pending", Some(pending.target.path.to_string()))
        }
        NavOutcome::Aborted => ("aborted", None),
    };
    OutcomeJson { outcome, path }
}

pub fn link_to_json(link: &WikiLink) -> LinkJson {
    LinkJson {
        target: link.target.clone(),
        start: link.span.start,
        end: link.span.end,
    }
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

/// One line per outcome: the note path, or what happened instead.
pub fn format_outcome(outcome: &NavOutcome) -> String {
    match outcome {
        NavOutcome::Loaded { path, .. } => path.to_string(),
        NavOutcome::NoTarget => "no target".to_string(),
        NavOutcome::ToggledClosed(id) => format!("closed {}", id),
        NavOutcome::CloseRequested(id) => format!("{} has unsaved edits", id),
        NavOutcome::Focused(id) => format!("focused {}", id),
        NavOutcome::NeedsConfirmation(pending) => format!("{} (missing)", pending.target.path),
        NavOutcome::Aborted => "aborted".to_string(),
    }
}

pub fn format_target(target: &ResolvedTarget) -> String {
    let mut line = target.path.to_string();
    if let Some(slot) = &target.insert {
        line.push_str(&format!(" (insert {}{} width {})", slot.prefix, slot.index, slot.width));
    } else if !target.exists {
        line.push_str(" (missing)");
    }
    line
}

pub fn format_recent(entry: &RecentEntry) -> String {
    format!(
        "{}  {}",
        entry.opened_at.format("%Y-%m-%d %H:%M"),
        entry.file_path
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::identity::FileIdentity;
    use crate::session::window::WindowId;
    use pretty_assertions::assert_eq;

    #[test]
    fn outcome_json_shapes() {
        let path = FileIdentity::new("/n/a.md").unwrap();
        let json = serde_json::to_string(&outcome_to_json(&NavOutcome::Loaded {
            window: WindowId(1),
            path,
        }))
        .unwrap();
        assert_eq!(json, r#"{"outcome":"loaded","path":"/n/a.md"}"#);

        let json = serde_json::to_string(&outcome_to_json(&NavOutcome::NoTarget)).unwrap();
        assert_eq!(json, r#"{"outcome":"none"}"#);

        let unsaved = NavOutcome::CloseRequested(WindowId(2));
        let json = serde_json::to_string(&outcome_to_json(&unsaved)).unwrap();
        assert_eq!(json, r#"{"outcome":"unsaved"}"#);
        assert_eq!(format_outcome(&unsaved), "window 2 has unsaved edits");
    }

    #[test]
    fn target_lines() {
        let path = FileIdentity::new("/n/card02.md").unwrap();
        let mut target = ResolvedTarget::new(path, false);
        assert_eq!(format_target(&target), "/n/card02.md (missing)");
        target.exists = true;
        assert_eq!(format_target(&target), "/n/card02.md");
    }
}
