use canopy_core::Point;

use super::edit::Edit;
use super::line_index::LineIndex;

fn index(text: &str) -> LineIndex {
    LineIndex::build(&text)
}

#[test]
fn points_for_single_line() {
    let lines = index("hello");
    assert_eq!(lines.point_of(0), Point::new(0, 0));
    assert_eq!(lines.point_of(4), Point::new(0, 4));
    assert_eq!(lines.line_count(), 1);
}

#[test]
fn points_across_newlines() {
    let lines = index("ab\ncd\n\nx");
    assert_eq!(lines.point_of(0), Point::new(0, 0));
    assert_eq!(lines.point_of(2), Point::new(0, 2));
    assert_eq!(lines.point_of(3), Point::new(1, 0));
    assert_eq!(lines.point_of(5), Point::new(1, 2));
    assert_eq!(lines.point_of(6), Point::new(2, 0));
    assert_eq!(lines.point_of(7), Point::new(3, 0));
    assert_eq!(lines.line_count(), 4);
}

#[test]
fn offset_of_inverts_point_of() {
    let lines = index("ab\ncd");
    assert_eq!(lines.offset_of(Point::new(1, 1)), Some(4));
    assert_eq!(lines.offset_of(Point::new(9, 0)), None);
}

#[test]
fn splice_drops_replaced_newlines_and_shifts_the_rest() {
    // "a\nb\nc" -> delete the middle "\nb" -> "a\nc" (before rescan, the
    // surviving newline shifts left by two).
    let lines = index("a\nb\nc");
    let edit = Edit {
        start_byte: 1,
        old_end_byte: 3,
        new_end_byte: 1,
        start_point: Point::new(0, 1),
        old_end_point: Point::new(1, 1),
        new_end_point: Point::new(0, 1),
    };

    let spliced = lines.with_edits(&[edit]);
    let rescanned = spliced.rescan(&"a\nc", &[(1, 2)]);
    assert_eq!(rescanned.point_of(2), Point::new(1, 0));
    assert_eq!(rescanned.line_count(), 2);
}

#[test]
fn rescan_picks_up_inserted_newlines() {
    let lines = index("abcd");
    // Insert "\nxy" after "ab": "ab\nxycd".
    let edit = Edit {
        start_byte: 2,
        old_end_byte: 2,
        new_end_byte: 5,
        start_point: Point::new(0, 2),
        old_end_point: Point::new(0, 2),
        new_end_point: Point::new(1, 2),
    };

    let spliced = lines.with_edits(&[edit]);
    let rescanned = spliced.rescan(&"ab\nxycd", &[(2, 5)]);

    assert_eq!(rescanned.line_count(), 2);
    assert_eq!(rescanned.point_of(3), Point::new(1, 0));
    assert_eq!(rescanned.point_of(6), Point::new(1, 3));
}

#[test]
fn matches_a_fresh_build_after_splice_and_rescan() {
    let lines = index("one\ntwo\nthree");
    // Replace "two" with "2\n2": "one\n2\n2\nthree".
    let edit = Edit {
        start_byte: 4,
        old_end_byte: 7,
        new_end_byte: 7,
        start_point: Point::new(1, 0),
        old_end_point: Point::new(1, 3),
        new_end_point: Point::new(2, 1),
    };
    let new_text = "one\n2\n2\nthree";

    let incremental = lines.with_edits(&[edit]).rescan(&new_text, &[(4, 7)]);
    let fresh = LineIndex::build(&new_text);

    for offset in 0..new_text.len() as u32 {
        assert_eq!(
            incremental.point_of(offset),
            fresh.point_of(offset),
            "offset {offset}"
        );
    }
}
