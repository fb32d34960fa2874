//! Lexical table construction.
//!
//! Pattern terminals are validated with regex-syntax, built as anchored
//! dense DFAs, then converted to sparse form for storage, since sparse DFAs
//! deserialize from unaligned bytes, which keeps the artifact format free
//! of alignment games. The keyword table is derived by running the `word`
//! rule's DFA over every literal terminal.

use regex_automata::dfa::dense;
use regex_automata::dfa::{Automaton, StartKind};
use regex_automata::util::syntax;
use regex_automata::{Anchored, Input};

use canopy_tables::{LexTable, SymbolId, TokenMatcher};

use crate::error::GrammarError;
use crate::prepare::{FlatGrammar, FlatMatcher};

pub(crate) fn build_lex_table(flat: &FlatGrammar) -> Result<LexTable, GrammarError> {
    let mut matchers = Vec::with_capacity(flat.terminals.len());
    let mut word_dfa: Option<dense::DFA<Vec<u32>>> = None;

    for (index, terminal) in flat.terminals.iter().enumerate() {
        let matcher = match &terminal.matcher {
            FlatMatcher::End => TokenMatcher::End,
            FlatMatcher::Literal(text) => TokenMatcher::Literal(text.clone()),
            FlatMatcher::Pattern(pattern) => {
                let dfa = build_pattern_dfa(&terminal.name, pattern)?;
                if flat.word == Some(index) {
                    word_dfa = Some(dfa.clone());
                }
                let sparse = dfa.to_sparse().map_err(|e| GrammarError::InvalidPattern {
                    rule: terminal.name.clone(),
                    message: e.to_string(),
                })?;
                TokenMatcher::Pattern {
                    dfa: sparse.to_bytes_little_endian(),
                }
            }
            FlatMatcher::External(ext) => TokenMatcher::External { index: *ext },
        };
        matchers.push(matcher);
    }

    let extras: Vec<SymbolId> = flat
        .terminals
        .iter()
        .enumerate()
        .filter(|(_, t)| t.extra)
        .map(|(i, _)| i as SymbolId)
        .collect();

    // External terminals in scanner declaration order.
    let mut externals_with_index: Vec<(u16, SymbolId)> = flat
        .terminals
        .iter()
        .enumerate()
        .filter_map(|(i, t)| match t.matcher {
            FlatMatcher::External(ext) => Some((ext, i as SymbolId)),
            _ => None,
        })
        .collect();
    externals_with_index.sort_unstable();
    let externals = externals_with_index.into_iter().map(|(_, s)| s).collect();

    // Keyword table: literal terminals fully matched by the word rule.
    let mut keywords: Vec<(String, SymbolId)> = Vec::new();
    if let Some(word_dfa) = &word_dfa {
        for (index, terminal) in flat.terminals.iter().enumerate() {
            if let FlatMatcher::Literal(text) = &terminal.matcher {
                if full_match(word_dfa, text.as_bytes()) {
                    keywords.push((text.clone(), index as SymbolId));
                }
            }
        }
        keywords.sort_by(|(a, _), (b, _)| a.cmp(b));
    }

    Ok(LexTable {
        matchers,
        extras,
        keywords,
        word: flat.word.map(|w| w as SymbolId),
        externals,
    })
}

/// Build an anchored byte-level DFA for one pattern terminal.
fn build_pattern_dfa(rule: &str, pattern: &str) -> Result<dense::DFA<Vec<u32>>, GrammarError> {
    // Parse first for a better error than the DFA builder produces.
    regex_syntax::ParserBuilder::new()
        .unicode(false)
        .utf8(false)
        .build()
        .parse(pattern)
        .map_err(|e| GrammarError::InvalidPattern {
            rule: rule.to_string(),
            message: e.to_string(),
        })?;

    dense::DFA::builder()
        .configure(
            dense::DFA::config()
                .start_kind(StartKind::Anchored)
                .minimize(true),
        )
        .syntax(syntax::Config::new().unicode(false).utf8(false))
        .build(pattern)
        .map_err(|e| GrammarError::InvalidPattern {
            rule: rule.to_string(),
            message: e.to_string(),
        })
}

/// Whether the DFA matches the whole of `bytes` and nothing less.
fn full_match(dfa: &dense::DFA<Vec<u32>>, bytes: &[u8]) -> bool {
    let input = Input::new(bytes).anchored(Anchored::Yes);
    let Ok(mut state) = dfa.start_state_forward(&input) else {
        return false;
    };
    for &byte in bytes {
        state = dfa.next_state(state, byte);
        if dfa.is_dead_state(state) {
            return false;
        }
    }
    state = dfa.next_eoi_state(state);
    dfa.is_match_state(state)
}
