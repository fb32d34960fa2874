use canopy_core::Point;

use crate::parser::Parser;
use crate::test_support::{arith, arith_ws, assert_same_structure};
use crate::trace::Tracer;
use crate::tree::Edit;

/// Tracer that records which byte ranges were served from the old tree.
#[derive(Default)]
struct ReuseLog {
    reused: Vec<(usize, usize)>,
}

impl Tracer for ReuseLog {
    fn trace_shift(&mut self, _symbol: u16, _start: usize, _end: usize) {}
    fn trace_reduce(&mut self, _production: u32, _child_count: usize) {}
    fn trace_fork(&mut self, _state: u32, _fan_out: usize) {}
    fn trace_merge(&mut self, _state: u32) {}
    fn trace_reuse(&mut self, _symbol: u16, start: usize, end: usize) {
        self.reused.push((start, end));
    }
    fn trace_missing(&mut self, _symbol: u16, _offset: usize) {}
    fn trace_error_node(&mut self, _start: usize, _end: usize) {}
    fn trace_accept(&mut self, _error_cost: u32) {}
}

fn insertion(at: usize, len: usize) -> Edit {
    Edit::insertion(at, len, Point::new(0, at as u32), Point::new(0, (at + len) as u32))
}

#[test]
fn noop_edit_reparse_matches_scratch_parse() {
    let parser = Parser::new(arith());
    let source = "1+2+3";
    let original = parser.parse(source, None).unwrap();

    let edited = original.with_edits(&[]).unwrap();
    let reparsed = parser.parse(source, Some(&edited)).unwrap();
    let scratch = parser.parse(source, None).unwrap();

    assert_same_structure(&reparsed, &scratch);
    assert_same_structure(&reparsed, &original);
}

#[test]
fn unedited_reparse_reuses_the_whole_root() {
    let parser = Parser::new(arith());
    let original = parser.parse("1+2+3", None).unwrap();

    let mut log = ReuseLog::default();
    let reparsed = parser
        .parse_with_options(
            "1+2+3",
            Some(&original),
            &crate::parser::ParseOptions::new(),
            None,
            &mut log,
        )
        .unwrap();

    assert_same_structure(&reparsed, &original);
    assert_eq!(log.reused, vec![(0, 5)]);
}

#[test]
fn appended_text_reuses_unaffected_leaves() {
    let parser = Parser::new(arith());
    let original = parser.parse("1+2", None).unwrap();

    // Insert "+4" at offset 3: new text is "1+2+4".
    let edited = original.with_edits(&[insertion(3, 2)]).unwrap();
    assert!(edited.has_pending_edits());

    let mut log = ReuseLog::default();
    let reparsed = parser
        .parse_with_options(
            "1+2+4",
            Some(&edited),
            &crate::parser::ParseOptions::new(),
            None,
            &mut log,
        )
        .unwrap();

    // The original number, plus, and number come from the old tree; only
    // the appended "+4" is newly parsed.
    assert_eq!(log.reused, vec![(0, 1), (1, 2), (2, 3)]);

    let scratch = parser.parse("1+2+4", None).unwrap();
    assert_same_structure(&reparsed, &scratch);
    assert_eq!(
        reparsed.root().to_sexp(),
        r#"(expr (number) "+" (number) "+" (number))"#
    );
}

#[test]
fn insertion_that_merges_a_token_is_not_reused() {
    let parser = Parser::new(arith());
    let original = parser.parse("1+2", None).unwrap();

    // Insert "3" right after the "2": the old number token must re-lex as
    // the longer "23", not be reused.
    let edited = original.with_edits(&[insertion(3, 1)]).unwrap();
    let reparsed = parser.parse("1+23", Some(&edited)).unwrap();
    let scratch = parser.parse("1+23", None).unwrap();

    assert_same_structure(&reparsed, &scratch);
    let last = reparsed.root().child(2).unwrap();
    assert_eq!(last.byte_range(), 2..4);
}

#[test]
fn edit_in_the_middle_shifts_following_ranges() {
    let parser = Parser::new(arith());
    let original = parser.parse("1+2+3", None).unwrap();

    // Replace "2" with "222": "1+222+3".
    let edit = Edit {
        start_byte: 2,
        old_end_byte: 3,
        new_end_byte: 5,
        start_point: Point::new(0, 2),
        old_end_point: Point::new(0, 3),
        new_end_point: Point::new(0, 5),
    };
    let edited = original.with_edits(&[edit]).unwrap();
    let reparsed = parser.parse("1+222+3", Some(&edited)).unwrap();
    let scratch = parser.parse("1+222+3", None).unwrap();

    assert_same_structure(&reparsed, &scratch);
    assert_eq!(reparsed.root().byte_range(), 0..7);
}

#[test]
fn reuse_skips_trees_from_other_grammars() {
    let arith_parser = Parser::new(arith());
    let ws_parser = Parser::new(arith_ws());

    let foreign = ws_parser.parse("1+2", None).unwrap();
    // A previous tree from a different grammar version is ignored, not
    // trusted.
    let tree = arith_parser.parse("1+2", Some(&foreign)).unwrap();
    assert_eq!(
        tree.root().to_sexp(),
        r#"(expr (number) "+" (number))"#
    );
}

#[test]
fn incremental_equivalence_across_several_edits() {
    let parser = Parser::new(arith_ws());
    let mut source = "1 + 2".to_string();
    let mut tree = parser.parse(source.as_str(), None).unwrap();

    let steps: Vec<(usize, &str)> = vec![(5, " + 34"), (0, "9+"), (7, "8")];
    for (at, text) in steps {
        source.insert_str(at, text);
        let edited = tree.with_edits(&[insertion(at, text.len())]).unwrap();
        tree = parser.parse(source.as_str(), Some(&edited)).unwrap();

        let scratch = parser.parse(source.as_str(), None).unwrap();
        assert_same_structure(&tree, &scratch);
    }
}
