use crate::parser::Parser;
use crate::test_support::{arith, arith_ws, leaf_spans};

#[test]
fn missing_token_is_synthesized_at_end_of_input() {
    let parser = Parser::new(arith());
    let tree = parser.parse("1+", None).unwrap();

    let root = tree.root();
    assert_eq!(root.kind_name(), "expr");
    assert_eq!(root.byte_range(), 0..2);
    assert_eq!(root.to_sexp(), r#"(expr (number) "+" (MISSING number))"#);

    let missing = root.child(2).unwrap();
    assert!(missing.is_missing());
    assert_eq!(missing.byte_range(), 2..2);
    assert!(root.has_error());
    assert!(!root.is_error());
}

#[test]
fn empty_input_still_produces_a_tree() {
    let parser = Parser::new(arith());
    let tree = parser.parse("", None).unwrap();

    let root = tree.root();
    assert_eq!(root.byte_range(), 0..0);
    assert!(root.has_error());
    // The start rule materializes with its number missing.
    assert_eq!(root.to_sexp(), "(expr (MISSING number))");
}

#[test]
fn garbage_bytes_are_wrapped_not_fatal() {
    let parser = Parser::new(arith());
    let tree = parser.parse("\x01\x02", None).unwrap();

    let root = tree.root();
    assert!(root.has_error());
    // Every input byte is still present in the tree.
    let spans = leaf_spans(&tree);
    let covered: usize = spans.iter().map(|(s, e)| e - s).sum();
    assert_eq!(covered, 2);
}

#[test]
fn unexpected_token_becomes_error_node_and_parse_resumes() {
    let parser = Parser::new(arith_ws());
    // The stray '?' interrupts an otherwise fine expression.
    let tree = parser.parse("1+?2", None).unwrap();

    let root = tree.root();
    assert!(root.has_error());

    let spans = leaf_spans(&tree);
    let mut pos = 0;
    for (start, end) in spans {
        assert_eq!(start, pos);
        pos = end;
    }
    assert_eq!(pos, 4);

    // The numbers survive as real number nodes.
    let mut found = Vec::new();
    collect_kinds(tree.root(), &mut found);
    assert!(found.iter().filter(|k| *k == "number").count() >= 2);
    assert!(found.iter().any(|k| k == "ERROR"));
}

#[test]
fn error_recovery_never_panics_on_fuzzed_inputs() {
    let parser = Parser::new(arith_ws());
    let inputs = [
        "+",
        "++",
        "1++",
        "+1",
        "1 2",
        "1 + + 2",
        "?",
        "1+2+",
        " ",
        "12 34 +",
        "+++++++",
    ];
    for input in inputs {
        let tree = parser.parse(input, None).unwrap();
        let spans = leaf_spans(&tree);
        let mut pos = 0;
        for (start, end) in spans {
            assert_eq!(start, pos, "gap in {input:?}");
            pos = end;
        }
        assert_eq!(pos, input.len(), "lost bytes in {input:?}");
    }
}

fn collect_kinds(node: crate::tree::Node<'_>, out: &mut Vec<String>) {
    out.push(node.kind_name().to_string());
    for child in node.children() {
        collect_kinds(child, out);
    }
}
