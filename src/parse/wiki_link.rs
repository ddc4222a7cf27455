use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\[\]\n]+)\]\]").expect("link pattern"));

/// An internal `[[target]]` reference in note text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiLink {
    /// Note name to resolve, with any `|alias` or `#heading` removed.
    pub target: String,
    /// Byte span of the whole `[[...]]` in the source text.
    pub span: Range<usize>,
}

/// Find every internal link in `text`, in document order.
/// Links with an empty target (`[[ ]]`, `[[#heading]]`) are skipped.
pub fn find_links(text: &str) -> Vec<WikiLink> {
    LINK_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let target = link_target(&caps[1]);
            if target.is_empty() {
                return None;
            }
            Some(WikiLink {
                target,
                span: whole.range(),
            })
        })
        .collect()
}

/// The link under a cursor byte offset. Both brackets count as inside.
pub fn link_at(text: &str, offset: usize) -> Option<WikiLink> {
    find_links(text)
        .into_iter()
        .find(|l| l.span.start <= offset && offset <= l.span.end)
}

fn link_target(inner: &str) -> String {
    let end = inner.find(['|', '#']).unwrap_or(inner.len());
    inner[..end].trim().to_string()
}
