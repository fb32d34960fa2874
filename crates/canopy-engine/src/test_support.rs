//! Shared fixtures for engine tests.

use std::sync::Arc;

use canopy_core::Grammar;
use canopy_tables::CompiledGrammar;
use indoc::indoc;

use crate::tree::Tree;

pub(crate) fn compile(json: &str) -> Arc<CompiledGrammar> {
    Arc::new(canopy_compiler::compile(&Grammar::from_json(json).unwrap()).unwrap())
}

/// `expr := number ("+" number)*`, no extras.
pub(crate) fn arith() -> Arc<CompiledGrammar> {
    compile(indoc! {r#"
        {
            "name": "arith",
            "rules": {
                "expr": {
                    "type": "SEQ",
                    "members": [
                        { "type": "SYMBOL", "name": "number" },
                        { "type": "REPEAT", "content": {
                            "type": "SEQ",
                            "members": [
                                { "type": "STRING", "value": "+" },
                                { "type": "SYMBOL", "name": "number" }
                            ]
                        }}
                    ]
                },
                "number": { "type": "PATTERN", "value": "[0-9]+" }
            },
            "extras": []
        }
    "#})
}

/// Same language with whitespace extras.
pub(crate) fn arith_ws() -> Arc<CompiledGrammar> {
    compile(indoc! {r#"
        {
            "name": "arith",
            "rules": {
                "expr": {
                    "type": "SEQ",
                    "members": [
                        { "type": "SYMBOL", "name": "number" },
                        { "type": "REPEAT", "content": {
                            "type": "SEQ",
                            "members": [
                                { "type": "STRING", "value": "+" },
                                { "type": "SYMBOL", "name": "number" }
                            ]
                        }}
                    ]
                },
                "number": { "type": "PATTERN", "value": "[0-9]+" }
            }
        }
    "#})
}

/// Leaf spans in order, for byte round-trip checks.
pub(crate) fn leaf_spans(tree: &Tree) -> Vec<(usize, usize)> {
    fn walk(node: crate::tree::Node<'_>, out: &mut Vec<(usize, usize)>) {
        if node.child_count() == 0 {
            out.push((node.start_byte(), node.end_byte()));
            return;
        }
        for child in node.children() {
            walk(child, out);
        }
    }
    let mut out = Vec::new();
    walk(tree.root(), &mut out);
    out
}

/// Structural equality: kinds, ranges, and flags, recursively.
pub(crate) fn assert_same_structure(a: &Tree, b: &Tree) {
    fn walk(a: crate::tree::Node<'_>, b: crate::tree::Node<'_>) {
        assert_eq!(a.kind_name(), b.kind_name());
        assert_eq!(a.byte_range(), b.byte_range());
        assert_eq!(a.is_error(), b.is_error());
        assert_eq!(a.is_missing(), b.is_missing());
        assert_eq!(a.child_count(), b.child_count(), "under {}", a.kind_name());
        for (ca, cb) in a.children().zip(b.children()) {
            walk(ca, cb);
        }
    }
    walk(a.root(), b.root());
}
