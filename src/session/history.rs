use crate::model::intent::HistoryEntry;

/// Per-window back/forward stacks.
///
/// A new visit clears the forward stack. There is no cap; the stacks live
/// exactly as long as the window.
#[derive(Debug, Clone, Default)]
pub struct NavigationHistory {
    back_stack: Vec<HistoryEntry>,
    forward_stack: Vec<HistoryEntry>,
}

impl NavigationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the place being left.
    pub fn visit(&mut self, entry: HistoryEntry) {
        self.back_stack.push(entry);
        self.forward_stack.clear();
    }

    /// Step back: `current` goes on the forward stack and the most recent
    /// back entry is returned.
    pub fn back(&mut self, current: HistoryEntry) -> Option<HistoryEntry> {
        let target = self.back_stack.pop()?;
        self.forward_stack.push(current);
        Some(target)
    }

    /// Step forward: `current` goes on the back stack and the most recent
    /// forward entry is returned.
    pub fn forward(&mut self, current: HistoryEntry) -> Option<HistoryEntry> {
        let target = self.forward_stack.pop()?;
        self.back_stack.push(current);
        Some(target)
    }

    /// Rewrite every entry in both stacks through `f`; entries mapped to
    /// `None` are dropped. Used when notes are renamed or deleted on disk.
    pub fn remap(&mut self, mut f: impl FnMut(HistoryEntry) -> Option<HistoryEntry>) {
        for stack in [&mut self.back_stack, &mut self.forward_stack] {
            *stack = std::mem::take(stack).into_iter().filter_map(&mut f).collect();
        }
    }

    #[cfg(test)]
    pub(crate) fn stacks(&self) -> (&[HistoryEntry], &[HistoryEntry]) {
        (&self.back_stack, &self.forward_stack)
    }
}
