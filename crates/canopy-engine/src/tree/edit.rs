//! Text edits and their application to trees.

use canopy_core::Point;

use crate::error::EditError;

/// A single text replacement: bytes `[start_byte, old_end_byte)` were
/// replaced by `new_end_byte - start_byte` new bytes. Point coordinates
/// describe the same three positions for hosts that track rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edit {
    pub start_byte: usize,
    pub old_end_byte: usize,
    pub new_end_byte: usize,
    pub start_point: Point,
    pub old_end_point: Point,
    pub new_end_point: Point,
}

impl Edit {
    /// An insertion of `len` bytes at `start`.
    pub fn insertion(start: usize, len: usize, start_point: Point, new_end_point: Point) -> Self {
        Self {
            start_byte: start,
            old_end_byte: start,
            new_end_byte: start + len,
            start_point,
            old_end_point: start_point,
            new_end_point,
        }
    }

    #[inline]
    pub(crate) fn delta(&self) -> i64 {
        self.new_end_byte as i64 - self.old_end_byte as i64
    }
}

/// Edit lists must be sorted by start and non-overlapping in the replaced
/// ranges; anything else is caller error, not a parse condition.
pub(crate) fn validate_edits(edits: &[Edit]) -> Result<(), EditError> {
    for (index, edit) in edits.iter().enumerate() {
        if edit.old_end_byte < edit.start_byte {
            return Err(EditError::Inverted { index });
        }
        if index > 0 {
            let previous = &edits[index - 1];
            if edit.start_byte < previous.start_byte {
                return Err(EditError::Unsorted { index });
            }
            if edit.start_byte < previous.old_end_byte {
                return Err(EditError::Overlapping { index });
            }
        }
    }
    Ok(())
}

/// Translate a pre-edit offset into post-edit coordinates. Offsets inside
/// a replaced span clamp to the span's new end. Affinity matters at a pure
/// insertion point: a range *start* there shifts right with the inserted
/// text, a range *end* there stays put.
pub(crate) fn translate_offset(offset: u32, edits: &[Edit], is_start: bool) -> u32 {
    let mut delta = 0i64;
    for edit in edits {
        let start = edit.start_byte as u32;
        let old_end = edit.old_end_byte as u32;
        let before = if is_start {
            offset < start
        } else {
            offset <= start
        };
        if before {
            break;
        }
        if offset < old_end {
            return (edit.new_end_byte as i64 + delta) as u32;
        }
        delta += edit.delta();
    }
    (i64::from(offset) + delta) as u32
}

/// Whether an old-coordinate range is touched by the replaced span of any
/// edit. Pure insertions only invalidate ranges they fall strictly inside.
pub(crate) fn range_intersects_edits(start: u32, end: u32, edits: &[Edit]) -> bool {
    edits.iter().any(|edit| {
        let edit_start = edit.start_byte as u32;
        let old_end = edit.old_end_byte as u32;
        if edit_start == old_end {
            start < edit_start && end > edit_start
        } else {
            start < old_end && end > edit_start
        }
    })
}

/// The post-edit spans of new text introduced by each edit.
pub(crate) fn dirty_ranges(edits: &[Edit]) -> Vec<(u32, u32)> {
    let mut delta = 0i64;
    let mut ranges = Vec::with_capacity(edits.len());
    for edit in edits {
        let start = (edit.start_byte as i64 + delta) as u32;
        let end = (edit.new_end_byte as i64 + delta) as u32;
        // A pure deletion still dirties one byte at its seam so boundary
        // tokens get re-checked against the bytes that moved in.
        ranges.push((start, end.max(start + 1)));
        delta += edit.delta();
    }
    ranges
}

/// Merge overlapping or touching ranges. Input need not be sorted.
pub(crate) fn merge_ranges(mut ranges: Vec<(u32, u32)>) -> Vec<(u32, u32)> {
    ranges.sort_unstable();
    let mut merged: Vec<(u32, u32)> = Vec::with_capacity(ranges.len());
    for (start, end) in ranges {
        match merged.last_mut() {
            Some((_, last_end)) if start <= *last_end => *last_end = (*last_end).max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}
