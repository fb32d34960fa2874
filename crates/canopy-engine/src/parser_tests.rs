use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use indoc::indoc;

use crate::parser::{ParseOptions, Parser};
use crate::test_support::{arith, arith_ws, assert_same_structure, compile, leaf_spans};

#[test]
fn parses_flat_expression() {
    let parser = Parser::new(arith());
    let tree = parser.parse("1+2+3", None).unwrap();

    let root = tree.root();
    assert_eq!(root.kind_name(), "expr");
    assert_eq!(root.byte_range(), 0..5);
    assert_eq!(root.child_count(), 5);
    assert_eq!(
        root.to_sexp(),
        r#"(expr (number) "+" (number) "+" (number))"#
    );
    assert!(!root.has_error());
}

#[test]
fn single_number_parses() {
    let parser = Parser::new(arith());
    let tree = parser.parse("42", None).unwrap();

    assert_eq!(tree.root().to_sexp(), "(expr (number))");
    assert_eq!(tree.root().byte_range(), 0..2);
}

#[test]
fn repeated_parses_are_identical() {
    let parser = Parser::new(arith());
    let a = parser.parse("1+2+3", None).unwrap();
    let b = parser.parse("1+2+3", None).unwrap();

    assert_same_structure(&a, &b);
}

#[test]
fn leaves_reconstruct_the_source() {
    let parser = Parser::new(arith_ws());
    let source = "1 + 2+ 30";
    let tree = parser.parse(source, None).unwrap();

    let spans = leaf_spans(&tree);
    let mut pos = 0;
    for (start, end) in spans {
        assert_eq!(start, pos, "gap before {start}");
        pos = end;
    }
    assert_eq!(pos, source.len());
}

#[test]
fn whitespace_rides_along_as_extras() {
    let parser = Parser::new(arith_ws());
    let tree = parser.parse("1 + 2", None).unwrap();

    let root = tree.root();
    assert_eq!(root.kind_name(), "expr");
    assert!(!root.has_error());
    // number, ws, "+", ws, number
    assert_eq!(root.child_count(), 5);
    let extras: Vec<bool> = root.children().map(|c| c.is_extra()).collect();
    assert_eq!(extras, vec![false, true, false, true, false]);
}

#[test]
fn navigation_and_ranges() {
    let parser = Parser::new(arith());
    let tree = parser.parse("1+22", None).unwrap();

    let root = tree.root();
    let first = root.child(0).unwrap();
    assert_eq!(first.kind_name(), "number");
    assert_eq!(first.parent().unwrap().kind_name(), "expr");

    let plus = first.next_sibling().unwrap();
    assert_eq!(plus.kind_name(), "+");
    assert_eq!(plus.prev_sibling().unwrap().byte_range(), 0..1);

    let last = root.child_containing_byte(3).unwrap();
    assert_eq!(last.byte_range(), 2..4);

    let descendant = root.descendant_for_byte_range(2, 4);
    assert_eq!(descendant.kind_name(), "number");
}

#[test]
fn point_ranges_follow_newlines() {
    let grammar = compile(indoc! {r#"
        {
            "name": "lines",
            "rules": {
                "file": { "type": "REPEAT1", "content": { "type": "SYMBOL", "name": "word" } },
                "word": { "type": "PATTERN", "value": "[a-z]+" }
            }
        }
    "#});
    let parser = Parser::new(grammar);
    let tree = parser.parse("ab\ncd", None).unwrap();

    let root = tree.root();
    let (start, end) = root.point_range();
    assert_eq!((start.row, start.column), (0, 0));
    assert_eq!((end.row, end.column), (1, 2));

    let second = root.child(2).unwrap();
    assert_eq!(second.kind_name(), "word");
    let (start, _) = second.point_range();
    assert_eq!((start.row, start.column), (1, 0));
}

#[test]
fn cursor_walks_depth_first() {
    let parser = Parser::new(arith());
    let tree = parser.parse("1+2", None).unwrap();

    let mut cursor = tree.walk();
    assert_eq!(cursor.node().kind_name(), "expr");
    assert!(cursor.goto_first_child());
    assert_eq!(cursor.node().kind_name(), "number");
    assert!(cursor.goto_next_sibling());
    assert_eq!(cursor.node().kind_name(), "+");
    assert!(cursor.goto_parent());
    assert_eq!(cursor.node().kind_name(), "expr");
    assert!(!cursor.goto_parent());
}

#[test]
fn cancellation_returns_error_and_no_tree() {
    let parser = Parser::new(arith());
    let flag = Arc::new(AtomicBool::new(true));
    let options = ParseOptions::new().cancellation(Arc::clone(&flag));

    let result = parser.parse_with_options(
        "1+2+3",
        None,
        &options,
        None,
        &mut crate::trace::NoopTracer,
    );
    assert!(matches!(result, Err(crate::ParseError::Cancelled)));

    // Lowering the flag lets the same parser finish normally.
    flag.store(false, Ordering::SeqCst);
    let tree = parser
        .parse_with_options("1+2+3", None, &options, None, &mut crate::trace::NoopTracer)
        .unwrap();
    assert_eq!(tree.root().kind_name(), "expr");
}

#[test]
fn ambiguous_grammar_parses_with_declared_conflict() {
    let grammar = compile(indoc! {r#"
        {
            "name": "amb",
            "rules": {
                "expr": {
                    "type": "CHOICE",
                    "members": [
                        {
                            "type": "SEQ",
                            "members": [
                                { "type": "SYMBOL", "name": "expr" },
                                { "type": "STRING", "value": "+" },
                                { "type": "SYMBOL", "name": "expr" }
                            ]
                        },
                        { "type": "SYMBOL", "name": "number" }
                    ]
                },
                "number": { "type": "PATTERN", "value": "[0-9]+" }
            },
            "conflicts": [["expr"]],
            "extras": []
        }
    "#});
    let parser = Parser::new(grammar);
    let tree = parser.parse("1+2+3", None).unwrap();

    // Generalized parsing commits to one interpretation; the tree is
    // complete and error-free, with nested binary expressions.
    let root = tree.root();
    assert_eq!(root.kind_name(), "expr");
    assert_eq!(root.byte_range(), 0..5);
    assert!(!root.has_error());
    assert_eq!(root.child_count(), 3);

    let spans = leaf_spans(&tree);
    assert_eq!(spans.len(), 5);
    assert_eq!(spans.first(), Some(&(0, 1)));
    assert_eq!(spans.last(), Some(&(4, 5)));
}

#[test]
fn chunked_sources_parse_like_contiguous_ones() {
    let parser = Parser::new(arith());
    let chunked = crate::source::ChunkedSource::new(vec![
        b"1+".to_vec(),
        b"2".to_vec(),
        b"+3".to_vec(),
    ]);

    let from_chunks = parser.parse(&chunked, None).unwrap();
    let from_str = parser.parse("1+2+3", None).unwrap();
    assert_same_structure(&from_chunks, &from_str);
}

#[test]
fn grammar_fingerprint_is_attached() {
    let table = arith();
    let parser = Parser::new(Arc::clone(&table));
    let tree = parser.parse("1", None).unwrap();
    assert_eq!(tree.grammar_fingerprint(), table.fingerprint);
}
