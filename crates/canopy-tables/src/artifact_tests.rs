use super::*;

/// A hand-built grammar for `root := "x"`, just enough structure to pass
/// validation.
fn tiny_grammar() -> CompiledGrammar {
    CompiledGrammar {
        name: "tiny".to_string(),
        fingerprint: 0x5eed,
        symbols: vec![
            SymbolInfo {
                name: "end".to_string(),
                named: false,
                visible: false,
                extra: false,
                external: false,
            },
            SymbolInfo {
                name: "x".to_string(),
                named: false,
                visible: true,
                extra: false,
                external: false,
            },
            SymbolInfo {
                name: "root".to_string(),
                named: true,
                visible: true,
                extra: false,
                external: false,
            },
        ],
        terminal_count: 2,
        start_symbol: 2,
        productions: vec![Production {
            lhs: 2,
            rhs: vec![1],
            prec: 0,
            assoc: Assoc::None,
            dynamic_prec: 0,
        }],
        parse: ParseTable {
            states: vec![
                ParseState {
                    actions: vec![(1, ActionSet::new(vec![Action::Shift { state: 1 }]))],
                    gotos: vec![(2, 2)],
                },
                ParseState {
                    actions: vec![(0, ActionSet::new(vec![Action::Reduce { production: 0 }]))],
                    gotos: vec![],
                },
                ParseState {
                    actions: vec![(0, ActionSet::new(vec![Action::Accept]))],
                    gotos: vec![],
                },
            ],
        },
        lex: LexTable {
            matchers: vec![TokenMatcher::End, TokenMatcher::Literal("x".to_string())],
            extras: vec![],
            keywords: vec![],
            word: None,
            externals: vec![],
        },
    }
}

#[test]
fn artifact_roundtrip() {
    let grammar = tiny_grammar();
    let bytes = grammar.to_artifact_bytes();
    let decoded = CompiledGrammar::from_artifact_bytes(&bytes).unwrap();

    assert_eq!(decoded.name, "tiny");
    assert_eq!(decoded.fingerprint, 0x5eed);
    assert_eq!(decoded.symbols.len(), 3);
    assert_eq!(decoded.parse.states.len(), 3);
}

#[test]
fn artifact_rejects_bad_magic() {
    let mut bytes = tiny_grammar().to_artifact_bytes();
    bytes[0] = b'X';
    assert!(matches!(
        CompiledGrammar::from_artifact_bytes(&bytes),
        Err(ArtifactError::Magic)
    ));
}

#[test]
fn artifact_rejects_future_version() {
    let mut bytes = tiny_grammar().to_artifact_bytes();
    bytes[4] = 0xfe;
    bytes[5] = 0xff;
    assert!(matches!(
        CompiledGrammar::from_artifact_bytes(&bytes),
        Err(ArtifactError::Version { .. })
    ));
}

#[test]
fn artifact_rejects_corrupted_payload() {
    let mut bytes = tiny_grammar().to_artifact_bytes();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x40;
    assert!(matches!(
        CompiledGrammar::from_artifact_bytes(&bytes),
        Err(ArtifactError::Checksum)
    ));
}

#[test]
fn artifact_rejects_truncation() {
    let bytes = tiny_grammar().to_artifact_bytes();
    assert!(CompiledGrammar::from_artifact_bytes(&bytes[..6]).is_err());
}

#[test]
fn validate_catches_dangling_shift() {
    let mut grammar = tiny_grammar();
    grammar.parse.states[0].actions[0].1 = ActionSet::new(vec![Action::Shift { state: 99 }]);
    assert!(matches!(
        grammar.validate(),
        Err(ArtifactError::Malformed(_))
    ));
}

#[test]
fn symbol_name_resolution() {
    let grammar = tiny_grammar();
    assert_eq!(grammar.symbol_name(2), "root");
    assert_eq!(grammar.symbol_name(ERROR_SYMBOL), "ERROR");
    assert_eq!(grammar.symbol_named("root"), Some(2));
    assert!(grammar.is_terminal(1));
    assert!(!grammar.is_terminal(2));
}
