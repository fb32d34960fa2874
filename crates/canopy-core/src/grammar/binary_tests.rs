use super::*;

fn sample_grammar() -> Grammar {
    Grammar::from_json(
        r#"{
        "name": "arith",
        "rules": {
            "expression": {
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
    }"#,
    )
    .unwrap()
}

#[test]
fn binary_roundtrip_preserves_structure() {
    let grammar = sample_grammar();
    let bytes = grammar.to_binary();
    let decoded = Grammar::from_binary(&bytes).unwrap();

    assert_eq!(decoded.name, grammar.name);
    assert_eq!(decoded.rules.len(), grammar.rules.len());
    assert_eq!(decoded.rules[0].0, "expression");
    assert!(matches!(decoded.rules[1].1, Rule::Pattern { .. }));
}

#[test]
fn binary_decode_rejects_garbage() {
    let err = Grammar::from_binary(&[0xff; 3]).unwrap_err();
    assert!(matches!(err, DecodeError::Binary(_)));
}
