//! Fenced code tracking for the block scanner.
//!
//! Lines inside a fenced code block are opaque: block triggers (`:::`,
//! `[details`, `=== "`) and closers must not fire there.

/// Tracks whether the lines pushed so far leave a code fence open.
///
/// Fences use three or more backticks or tildes. A closing fence uses the
/// same character, is at least as long as the opener and carries nothing but
/// trailing whitespace.
#[derive(Debug, Default, Clone)]
pub(crate) struct FenceTracker {
    open: Option<(char, usize)>,
}

impl FenceTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn in_fence(&self) -> bool {
        self.open.is_some()
    }

    /// Feed the next line. Returns `true` when the line opened or closed a fence.
    pub(crate) fn update(&mut self, line: &str) -> bool {
        let trimmed = line.trim_start();

        match self.open {
            Some((marker, len)) => {
                if closes_fence(trimmed, marker, len) {
                    self.open = None;
                    return true;
                }
                false
            }
            None => match opening_fence(trimmed) {
                Some(fence) => {
                    self.open = Some(fence);
                    true
                }
                None => false,
            },
        }
    }

    pub(crate) fn reset(&mut self) {
        self.open = None;
    }
}

fn marker_run(trimmed: &str, marker: char) -> usize {
    trimmed.chars().take_while(|&c| c == marker).count()
}

fn opening_fence(trimmed: &str) -> Option<(char, usize)> {
    let marker = trimmed.chars().next().filter(|&c| c == '`' || c == '~')?;
    let len = marker_run(trimmed, marker);
    if len < 3 {
        return None;
    }
    // A backtick info string may not contain backticks.
    if marker == '`' && trimmed[len..].contains('`') {
        return None;
    }
    Some((marker, len))
}

fn closes_fence(trimmed: &str, marker: char, min_len: usize) -> bool {
    let len = marker_run(trimmed, marker);
    len >= min_len && trimmed[len..].trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_outside_fence() {
        assert!(!FenceTracker::new().in_fence());
    }

    #[test]
    fn test_backtick_fence_with_info() {
        let mut tracker = FenceTracker::new();
        assert!(tracker.update("```js app.js"));
        assert!(tracker.in_fence());
        assert!(!tracker.update(":::"));
        assert!(tracker.in_fence());
        assert!(tracker.update("```"));
        assert!(!tracker.in_fence());
    }

    #[test]
    fn test_tilde_fence() {
        let mut tracker = FenceTracker::new();
        assert!(tracker.update("~~~"));
        assert!(!tracker.update("]"));
        assert!(tracker.update("~~~~"));
        assert!(!tracker.in_fence());
    }

    #[test]
    fn test_closing_fence_must_be_long_enough() {
        let mut tracker = FenceTracker::new();
        tracker.update("````");
        assert!(!tracker.update("```"));
        assert!(tracker.in_fence());
        assert!(tracker.update("````"));
    }

    #[test]
    fn test_closing_fence_must_match_marker() {
        let mut tracker = FenceTracker::new();
        tracker.update("```");
        assert!(!tracker.update("~~~"));
        assert!(tracker.in_fence());
    }

    #[test]
    fn test_closing_fence_rejects_info() {
        let mut tracker = FenceTracker::new();
        tracker.update("```");
        assert!(!tracker.update("``` rust"));
        assert!(tracker.in_fence());
    }

    #[test]
    fn test_indented_fence_in_list_item() {
        let mut tracker = FenceTracker::new();
        assert!(tracker.update("   ```bash"));
        assert!(tracker.update("   ```"));
        assert!(!tracker.in_fence());
    }

    #[test]
    fn test_inline_code_is_not_a_fence() {
        let mut tracker = FenceTracker::new();
        assert!(!tracker.update("``code``"));
        assert!(!tracker.update("```inline``` span"));
        assert!(!tracker.in_fence());
    }

    #[test]
    fn test_reset() {
        let mut tracker = FenceTracker::new();
        tracker.update("```");
        tracker.reset();
        assert!(!tracker.in_fence());
    }
}
