//! Line views over the source and pending markdown runs.

use std::ops::Range;

use super::fence::FenceTracker;

/// One input line as seen by a nesting level.
///
/// `text` excludes the line terminator. `start` is the source offset of
/// `text`, `end` the offset just past the terminator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Line<'a> {
    pub(crate) number: usize,
    pub(crate) text: &'a str,
    pub(crate) start: usize,
    pub(crate) end: usize,
}

impl<'a> Line<'a> {
    /// Drop `n` leading bytes, as a container does with its indentation.
    pub(crate) fn strip(self, n: usize) -> Line<'a> {
        let n = n.min(self.text.len());
        Line {
            text: &self.text[n..],
            start: self.start + n,
            ..self
        }
    }
}

/// Split `source[range]` into lines, tolerating `\r\n` terminators.
pub(crate) fn lines(source: &str, range: Range<usize>) -> impl Iterator<Item = Line<'_>> {
    let base = range.start;
    let body = &source[range];
    let mut offset = 0;
    let mut number = 0;

    std::iter::from_fn(move || {
        if offset >= body.len() {
            return None;
        }
        let rest = &body[offset..];
        let (content, consumed) = match rest.find('\n') {
            Some(pos) => (&rest[..pos], pos + 1),
            None => (rest, rest.len()),
        };
        let text = content.strip_suffix('\r').unwrap_or(content);
        number += 1;

        let line = Line {
            number,
            text,
            start: base + offset,
            end: base + offset + consumed,
        };
        offset += consumed;
        Some(line)
    })
}

/// Consecutive plain markdown lines waiting to be handed to the parser.
///
/// Lines may come from non-contiguous parts of the source (container
/// indentation is stripped), so each line records where it starts in the
/// buffer and in the source.
#[derive(Debug, Default)]
pub(crate) struct Run {
    buffer: String,
    segments: Vec<(usize, usize)>,
    fence: FenceTracker,
}

impl Run {
    pub(crate) fn push(&mut self, line: Line<'_>) {
        self.segments.push((self.buffer.len(), line.start));
        self.buffer.push_str(line.text);
        self.buffer.push('\n');
        self.fence.update(line.text);
    }

    pub(crate) fn buffer(&self) -> &str {
        &self.buffer
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub(crate) fn in_fence(&self) -> bool {
        self.fence.in_fence()
    }

    pub(crate) fn clear(&mut self) {
        self.buffer.clear();
        self.segments.clear();
        self.fence.reset();
    }

    fn to_source(&self, offset: usize) -> usize {
        let index = self
            .segments
            .partition_point(|&(buffer_start, _)| buffer_start <= offset)
            .saturating_sub(1);
        let (buffer_start, source_start) = self.segments[index];
        source_start + (offset - buffer_start)
    }

    /// Map a buffer range back to source offsets, clamped to `limit`.
    pub(crate) fn source_range(&self, range: Range<usize>, limit: usize) -> Range<usize> {
        let start = self.to_source(range.start).min(limit);
        let end = if range.end > range.start {
            (self.to_source(range.end - 1) + 1).min(limit)
        } else {
            start
        };
        start..end.max(start)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_lines_handle_crlf_and_missing_newline() {
        let source = "a\r\nbb\nccc";
        let collected: Vec<_> = lines(source, 0..source.len())
            .map(|l| (l.number, l.text, l.start, l.end))
            .collect();
        assert_eq!(
            collected,
            vec![(1, "a", 0, 3), (2, "bb", 3, 6), (3, "ccc", 6, 9)]
        );
    }

    #[test]
    fn test_lines_respect_range() {
        let source = "---\nx: 1\n---\nbody\n";
        let collected: Vec<_> = lines(source, 13..source.len()).collect();
        assert_eq!(collected.len(), 1);
        assert_eq!(collected[0].text, "body");
        assert_eq!(collected[0].start, 13);
    }

    #[test]
    fn test_strip_moves_start() {
        let line = lines("    indented", 0..12).next().unwrap();
        let stripped = line.strip(2);
        assert_eq!(stripped.text, "  indented");
        assert_eq!(stripped.start, 2);
        assert_eq!(stripped.end, 12);
    }

    #[test]
    fn test_run_maps_offsets_across_stripped_lines() {
        let source = "=== \"A\"\n  one\n  two\n";
        let mut run = Run::default();
        for line in lines(source, 0..source.len()).skip(1) {
            run.push(line.strip(2));
        }
        assert_eq!(run.buffer(), "one\ntwo\n");
        // "two" starts at buffer offset 4, source offset 16
        assert_eq!(run.source_range(4..7, source.len()), 16..19);
        assert_eq!(run.source_range(0..8, source.len()), 10..20);
    }

    #[test]
    fn test_run_tracks_fences() {
        let mut run = Run::default();
        for line in lines("```\ncode\n", 0..9) {
            run.push(line);
        }
        assert!(run.in_fence());
        run.clear();
        assert!(run.is_empty());
        assert!(!run.in_fence());
    }
}
