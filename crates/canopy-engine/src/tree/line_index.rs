//! Newline index: byte offsets to (row, column) points.
//!
//! Built once per from-scratch parse, then spliced, never rebuilt, across
//! edits: offsets in replaced spans are dropped, offsets after them shift
//! by the length delta, and only the edited spans are rescanned against the
//! new text.

use canopy_core::Point;

use crate::source::TextSource;
use crate::tree::edit::Edit;

#[derive(Debug, Clone, Default)]
pub(crate) struct LineIndex {
    /// Byte offset of each line start. Always begins with 0; entry `i + 1`
    /// records the offset just past the `i`-th newline.
    line_starts: Vec<u32>,
}

impl LineIndex {
    /// Scan a whole source.
    pub fn build(source: &dyn TextSource) -> Self {
        let mut line_starts = vec![0u32];
        let mut offset = 0usize;
        loop {
            let chunk = source.chunk_at(offset);
            if chunk.is_empty() {
                break;
            }
            for (i, &byte) in chunk.iter().enumerate() {
                if byte == b'\n' {
                    line_starts.push((offset + i + 1) as u32);
                }
            }
            offset += chunk.len();
        }
        Self { line_starts }
    }

    /// The point for a byte offset.
    pub fn point_of(&self, offset: u32) -> Point {
        let row = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        Point::new(row as u32, offset - self.line_starts[row])
    }

    /// The byte offset of a point, if the row exists.
    pub fn offset_of(&self, point: Point) -> Option<u32> {
        self.line_starts
            .get(point.row as usize)
            .map(|&start| start + point.column)
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Drop newlines inside replaced spans and shift the rest, leaving the
    /// edited spans to be rescanned against the new text at parse time.
    pub fn with_edits(&self, edits: &[Edit]) -> Self {
        let mut line_starts = vec![0u32];
        for &start in self.line_starts.iter().skip(1) {
            let newline = start - 1;
            let mut delta = 0i64;
            let mut dropped = false;
            for edit in edits {
                let (edit_start, old_end, new_end) = (
                    edit.start_byte as u32,
                    edit.old_end_byte as u32,
                    edit.new_end_byte as u32,
                );
                if newline >= old_end {
                    delta += i64::from(new_end) - i64::from(old_end);
                } else if newline >= edit_start {
                    dropped = true;
                    break;
                }
            }
            if !dropped {
                line_starts.push((i64::from(start) + delta) as u32);
            }
        }
        Self { line_starts }
    }

    /// Insert newlines found in the given (post-edit) ranges of the new
    /// source.
    pub fn rescan(&self, source: &dyn TextSource, dirty: &[(u32, u32)]) -> Self {
        let mut line_starts = self.line_starts.clone();
        for &(range_start, range_end) in dirty {
            let mut offset = range_start as usize;
            while offset < range_end as usize {
                let chunk = source.chunk_at(offset);
                if chunk.is_empty() {
                    break;
                }
                let take = chunk.len().min(range_end as usize - offset);
                for (i, &byte) in chunk[..take].iter().enumerate() {
                    if byte == b'\n' {
                        line_starts.push((offset + i + 1) as u32);
                    }
                }
                offset += take;
            }
        }
        line_starts.sort_unstable();
        line_starts.dedup();
        Self { line_starts }
    }
}
