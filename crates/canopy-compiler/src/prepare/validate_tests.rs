use canopy_core::Grammar;
use indoc::indoc;

use super::flatten::flatten;
use super::validate::validate;
use crate::error::GrammarError;

fn prepare(json: &str) -> Result<(), GrammarError> {
    let grammar = Grammar::from_json(json).unwrap();
    let flat = flatten(&grammar)?;
    validate(&flat)
}

#[test]
fn reachable_grammar_passes() {
    prepare(indoc! {r#"
        {
            "name": "t",
            "rules": {
                "root": { "type": "SEQ", "members": [{ "type": "SYMBOL", "name": "item" }] },
                "item": { "type": "SEQ", "members": [{ "type": "STRING", "value": "x" }] }
            },
            "extras": []
        }
    "#})
    .unwrap();
}

#[test]
fn unreachable_rule_is_an_error() {
    let err = prepare(indoc! {r#"
        {
            "name": "t",
            "rules": {
                "root": { "type": "SEQ", "members": [{ "type": "STRING", "value": "x" }] },
                "orphan": { "type": "SEQ", "members": [{ "type": "STRING", "value": "y" }] }
            },
            "extras": []
        }
    "#})
    .unwrap_err();

    let GrammarError::Unreachable { rule, start } = err else {
        panic!("expected Unreachable, got {err:?}");
    };
    assert_eq!(rule, "orphan");
    assert_eq!(start, "root");
}

#[test]
fn direct_cycle_is_an_error() {
    let err = prepare(indoc! {r#"
        {
            "name": "t",
            "rules": {
                "root": { "type": "SYMBOL", "name": "root" }
            },
            "extras": []
        }
    "#})
    .unwrap_err();

    assert!(matches!(err, GrammarError::CyclicRule { rule } if rule == "root"));
}

#[test]
fn cycle_through_nullable_prefix_is_an_error() {
    // a can derive itself because the repetition before it can be empty.
    let err = prepare(indoc! {r#"
        {
            "name": "t",
            "rules": {
                "a": {
                    "type": "SEQ",
                    "members": [
                        { "type": "REPEAT", "content": { "type": "STRING", "value": "x" } },
                        { "type": "SYMBOL", "name": "a" }
                    ]
                }
            },
            "extras": []
        }
    "#})
    .unwrap_err();

    assert!(matches!(err, GrammarError::CyclicRule { .. }));
}

#[test]
fn consuming_recursion_is_fine() {
    prepare(indoc! {r#"
        {
            "name": "t",
            "rules": {
                "list": {
                    "type": "CHOICE",
                    "members": [
                        {
                            "type": "SEQ",
                            "members": [
                                { "type": "STRING", "value": "(" },
                                { "type": "SYMBOL", "name": "list" },
                                { "type": "STRING", "value": ")" }
                            ]
                        },
                        { "type": "STRING", "value": "()" }
                    ]
                }
            },
            "extras": []
        }
    "#})
    .unwrap();
}
