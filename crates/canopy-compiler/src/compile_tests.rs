use canopy_core::Grammar;
use canopy_tables::{Action, CompiledGrammar, END_SYMBOL};
use indoc::indoc;

use crate::{GrammarError, compile, registry};

const ARITH: &str = indoc! {r#"
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
"#};

fn compile_arith() -> CompiledGrammar {
    compile(&Grammar::from_json(ARITH).unwrap()).unwrap()
}

#[test]
fn arith_compiles_deterministically() {
    let a = compile_arith();
    let b = compile_arith();

    assert_eq!(a.to_artifact_bytes(), b.to_artifact_bytes());
}

#[test]
fn arith_table_shape() {
    let compiled = compile_arith();

    assert_eq!(compiled.name, "arith");
    // end, number, "+"
    assert_eq!(compiled.terminal_count, 3);
    let number = compiled.symbol_named("number").unwrap();
    let expr = compiled.symbol_named("expr").unwrap();
    assert!(compiled.is_terminal(number));
    assert!(!compiled.is_terminal(expr));
    assert!(compiled.symbols[expr as usize].visible);

    // The start state shifts on number and has a goto for expr.
    let state0 = compiled.state(0);
    assert!(matches!(
        state0.action(number).unwrap().single(),
        Some(Action::Shift { .. })
    ));
    assert!(state0.goto(expr).is_some());

    // The accept state accepts on end-of-input.
    let accept_state = state0.goto(expr).unwrap();
    assert_eq!(
        compiled.state(accept_state).action(END_SYMBOL).unwrap().single(),
        Some(Action::Accept)
    );
}

#[test]
fn every_cell_is_deterministic_without_declared_conflicts() {
    let compiled = compile_arith();
    for state in &compiled.parse.states {
        assert!(!state.has_conflicts());
    }
}

#[test]
fn ambiguous_grammar_without_declaration_is_an_error() {
    let json = indoc! {r#"
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
            "extras": []
        }
    "#};

    let err = compile(&Grammar::from_json(json).unwrap()).unwrap_err();
    assert!(matches!(err, GrammarError::Conflict { .. }));
}

#[test]
fn associativity_resolves_the_same_grammar() {
    let json = indoc! {r#"
        {
            "name": "amb",
            "rules": {
                "expr": {
                    "type": "CHOICE",
                    "members": [
                        {
                            "type": "PREC_LEFT",
                            "value": 1,
                            "content": {
                                "type": "SEQ",
                                "members": [
                                    { "type": "SYMBOL", "name": "expr" },
                                    { "type": "STRING", "value": "+" },
                                    { "type": "SYMBOL", "name": "expr" }
                                ]
                            }
                        },
                        { "type": "SYMBOL", "name": "number" }
                    ]
                },
                "number": { "type": "PATTERN", "value": "[0-9]+" }
            },
            "extras": []
        }
    "#};

    let compiled = compile(&Grammar::from_json(json).unwrap()).unwrap();
    for state in &compiled.parse.states {
        assert!(!state.has_conflicts());
    }
}

#[test]
fn declared_conflict_keeps_multi_action_cell() {
    let json = indoc! {r#"
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
    "#};

    let compiled = compile(&Grammar::from_json(json).unwrap()).unwrap();
    let conflicted = compiled.parse.states.iter().any(|s| s.has_conflicts());
    assert!(conflicted);
}

#[test]
fn invalid_pattern_names_the_rule() {
    let json = indoc! {r#"
        {
            "name": "t",
            "rules": {
                "root": { "type": "SEQ", "members": [{ "type": "SYMBOL", "name": "broken" }] },
                "broken": { "type": "PATTERN", "value": "[unclosed" }
            },
            "extras": []
        }
    "#};

    let err = compile(&Grammar::from_json(json).unwrap()).unwrap_err();
    let GrammarError::InvalidPattern { rule, .. } = err else {
        panic!("expected InvalidPattern, got {err:?}");
    };
    assert_eq!(rule, "broken");
}

#[test]
fn keywords_come_from_word_rule() {
    let json = indoc! {r#"
        {
            "name": "kw",
            "rules": {
                "root": {
                    "type": "SEQ",
                    "members": [
                        { "type": "STRING", "value": "if" },
                        { "type": "SYMBOL", "name": "identifier" }
                    ]
                },
                "identifier": { "type": "PATTERN", "value": "[a-z]+" }
            },
            "word": "identifier",
            "extras": []
        }
    "#};

    let compiled = compile(&Grammar::from_json(json).unwrap()).unwrap();
    let if_symbol = compiled.symbol_named("if").unwrap();
    assert_eq!(compiled.lex.keyword("if"), Some(if_symbol));
    assert_eq!(compiled.lex.keyword("while"), None);
    assert_eq!(compiled.lex.word, compiled.symbol_named("identifier"));
}

#[test]
fn artifact_roundtrip_preserves_tables() {
    let compiled = compile_arith();
    let bytes = compiled.to_artifact_bytes();
    let decoded = CompiledGrammar::from_artifact_bytes(&bytes).unwrap();

    assert_eq!(decoded.fingerprint, compiled.fingerprint);
    assert_eq!(decoded.parse.states.len(), compiled.parse.states.len());
    assert_eq!(decoded.to_artifact_bytes(), bytes);
}

#[test]
fn registry_reuses_compiled_tables() {
    registry::reset();
    let grammar = Grammar::from_json(ARITH).unwrap();

    let a = registry::compile_cached(&grammar).unwrap();
    let b = registry::compile_cached(&grammar).unwrap();
    assert!(std::sync::Arc::ptr_eq(&a, &b));

    assert!(registry::lookup(a.fingerprint).is_some());
    registry::reset();
    assert!(registry::lookup(a.fingerprint).is_none());
    // The handle outlives the registry entry.
    assert_eq!(a.name, "arith");
}
