//! State-sensitive, table-driven lexing.
//!
//! The valid-token set comes from the current parse state's action row, so
//! the same bytes can lex differently in different contexts. Longest match
//! wins; equal lengths prefer literals and keywords over patterns. Every
//! token records how many bytes past its end were examined; incremental
//! re-parse uses that window to decide whether a token can be reused
//! without re-lexing.

use canopy_tables::{
    CompiledGrammar, END_SYMBOL, ERROR_SYMBOL, ParseState, StateId, SymbolId, TokenMatcher,
    deserialize_dfa,
};
use regex_automata::dfa::Automaton;
use regex_automata::dfa::sparse::DFA;
use regex_automata::{Anchored, Input};

use crate::error::LexError;
use crate::source::{ByteReader, TextSource};

/// One scanned token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub symbol: SymbolId,
    pub start: usize,
    pub end: usize,
    /// Bytes past `end` the lexer examined while deciding this token.
    pub lookahead: u32,
    /// Extra token attached outside the grammar's productions.
    pub is_extra: bool,
    /// Unrecognizable byte; becomes part of an ERROR node.
    pub is_error: bool,
}

impl Token {
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.symbol == END_SYMBOL && !self.is_error
    }
}

/// Byte access handed to external scanners. Reads are pull-based and may
/// look arbitrarily far ahead; the scanner reports how much it consumed.
pub struct ExternalInput<'a, 's> {
    reader: &'a mut ByteReader<'s>,
    start: usize,
}

impl ExternalInput<'_, '_> {
    /// Byte at `offset` past the scan start, or None at end of input.
    #[inline]
    pub fn byte(&mut self, offset: usize) -> Option<u8> {
        self.reader.byte_at(self.start + offset)
    }

    /// Absolute byte offset where the scan starts.
    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Bytes remaining from the scan start to end of input.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.reader.len().saturating_sub(self.start)
    }
}

/// Hook for tokens the lexical rules cannot express (delimited strings,
/// indentation). Return the recognized symbol and the bytes consumed; the
/// result is treated opaquely. Consuming zero bytes is a fatal error.
pub trait ExternalScanner {
    fn scan(
        &mut self,
        input: &mut ExternalInput<'_, '_>,
        valid: &[SymbolId],
    ) -> Option<(SymbolId, usize)>;
}

/// Candidate preference on equal match length.
const RANK_PATTERN: u8 = 0;
const RANK_LITERAL: u8 = 1;

pub(crate) struct Lexer<'t> {
    table: &'t CompiledGrammar,
    reader: ByteReader<'t>,
    /// Deserialized pattern DFAs, indexed by terminal.
    dfas: Vec<Option<DFA<&'t [u8]>>>,
    /// Single-entry memo: identical (position, state) requests repeat when
    /// multiple stacks sit at the same boundary.
    memo: Option<(usize, StateId, Token)>,
}

impl<'t> Lexer<'t> {
    pub fn new(table: &'t CompiledGrammar, source: &'t dyn TextSource) -> Result<Self, LexError> {
        let mut dfas = Vec::with_capacity(table.lex.matchers.len());
        for matcher in &table.lex.matchers {
            match matcher {
                TokenMatcher::Pattern { dfa } => {
                    dfas.push(Some(deserialize_dfa(dfa).map_err(LexError::Table)?));
                }
                _ => dfas.push(None),
            }
        }
        Ok(Self {
            table,
            reader: ByteReader::new(source),
            dfas,
            memo: None,
        })
    }

    /// Lex one token at `pos` for a parse state, consulting the external
    /// scanner first when any external terminal is valid there.
    pub fn next_token(
        &mut self,
        pos: usize,
        state_id: StateId,
        scanner: &mut Option<&mut dyn ExternalScanner>,
    ) -> Result<Token, LexError> {
        if scanner.is_none() {
            if let Some((memo_pos, memo_state, token)) = self.memo {
                if memo_pos == pos && memo_state == state_id {
                    return Ok(token);
                }
            }
        }

        let state = self.table.state(state_id);

        if let Some(scanner) = scanner.as_deref_mut() {
            if let Some(token) = self.scan_external(pos, state, scanner)? {
                return Ok(token);
            }
        }

        let token = self.scan_table(pos, Some(state))?;
        if scanner.is_none() {
            self.memo = Some((pos, state_id, token));
        }
        Ok(token)
    }

    /// Lex with every terminal valid. Recovery uses this to look ahead for
    /// synchronization tokens without committing to a parse state.
    pub fn next_token_any(&mut self, pos: usize) -> Result<Token, LexError> {
        self.scan_table(pos, None)
    }

    fn scan_external(
        &mut self,
        pos: usize,
        state: &ParseState,
        scanner: &mut dyn ExternalScanner,
    ) -> Result<Option<Token>, LexError> {
        let valid: Vec<SymbolId> = state
            .valid_terminals()
            .filter(|&symbol| {
                matches!(
                    self.table.lex.matchers.get(symbol as usize),
                    Some(TokenMatcher::External { .. })
                )
            })
            .collect();
        if valid.is_empty() {
            return Ok(None);
        }

        let mut input = ExternalInput {
            reader: &mut self.reader,
            start: pos,
        };
        let Some((symbol, consumed)) = scanner.scan(&mut input, &valid) else {
            return Ok(None);
        };
        if consumed == 0 {
            return Err(LexError::ZeroWidthExternal {
                symbol: self.table.symbol_name(symbol).to_string(),
                offset: pos,
            });
        }
        Ok(Some(Token {
            symbol,
            start: pos,
            end: pos + consumed,
            lookahead: 0,
            is_extra: false,
            is_error: false,
        }))
    }

    /// Longest-match scan over the valid terminals (or all terminals when
    /// no state is given) plus the extras.
    fn scan_table(&mut self, pos: usize, state: Option<&ParseState>) -> Result<Token, LexError> {
        let len = self.reader.len();
        if pos >= len {
            return Ok(Token {
                symbol: END_SYMBOL,
                start: pos,
                end: pos,
                lookahead: 1,
                is_extra: false,
                is_error: false,
            });
        }

        let table = self.table;
        let mut best: Option<(usize, u8, SymbolId)> = None; // (len, rank, symbol)
        let mut examined: usize = 1;

        let candidates: Vec<SymbolId> = match state {
            Some(state) => {
                let mut list: Vec<SymbolId> = state.valid_terminals().collect();
                for &extra in &table.lex.extras {
                    if !list.contains(&extra) {
                        list.push(extra);
                    }
                }
                list
            }
            None => (0..table.terminal_count).collect(),
        };

        for &symbol in &candidates {
            match &table.lex.matchers[symbol as usize] {
                TokenMatcher::End | TokenMatcher::External { .. } => {}
                TokenMatcher::Literal(text) => {
                    let (matched, looked) = self.match_literal(pos, text.as_bytes());
                    examined = examined.max(looked);
                    if matched {
                        consider(&mut best, text.len(), RANK_LITERAL, symbol);
                    }
                }
                TokenMatcher::Pattern { .. } => {
                    let (match_len, looked) = self.match_dfa(pos, symbol)?;
                    examined = examined.max(looked);
                    if let Some(match_len) = match_len {
                        let rank = if self.is_keyword_capture(symbol, pos, match_len) {
                            // Re-typed below; counts as a literal match.
                            RANK_LITERAL
                        } else {
                            RANK_PATTERN
                        };
                        consider(&mut best, match_len, rank, symbol);
                    }
                }
            }
        }

        let Some((mut match_len, _, mut symbol)) = best else {
            // Unrecognizable byte: consume one, mark it, let recovery
            // absorb it. Never fatal.
            return Ok(Token {
                symbol: ERROR_SYMBOL,
                start: pos,
                end: pos + 1,
                lookahead: examined.saturating_sub(1) as u32,
                is_extra: false,
                is_error: true,
            });
        };

        // A keyword literal must not match inside a longer word: `iffy` is
        // an identifier, never the keyword `if`, even in states where the
        // word rule itself is not valid.
        if let Some(word) = table.lex.word {
            if symbol != word
                && self.dfas.get(word as usize).is_some_and(|d| d.is_some())
                && table.lex.keywords.iter().any(|(_, s)| *s == symbol)
            {
                let (word_len, looked) = self.match_dfa(pos, word)?;
                examined = examined.max(looked);
                if let Some(word_len) = word_len {
                    if word_len > match_len {
                        symbol = word;
                        match_len = word_len;
                    }
                }
            }
        }

        // Keyword extraction: a word-rule match whose lexeme is a known
        // keyword valid in this state becomes that keyword terminal.
        if Some(symbol) == table.lex.word {
            let lexeme = self.reader.slice(pos, pos + match_len);
            if let Ok(text) = std::str::from_utf8(&lexeme) {
                if let Some(keyword) = table.lex.keyword(text) {
                    let keyword_valid = match state {
                        Some(state) => state.action(keyword).is_some(),
                        None => true,
                    };
                    if keyword_valid {
                        symbol = keyword;
                    }
                }
            }
        }

        let is_extra =
            table.lex.is_extra(symbol) && state.is_none_or(|s| s.action(symbol).is_none());

        Ok(Token {
            symbol,
            start: pos,
            end: pos + match_len,
            lookahead: examined.saturating_sub(match_len) as u32,
            is_extra,
            is_error: false,
        })
    }

    /// Whether a pattern match re-types to a keyword (used only for rank).
    fn is_keyword_capture(&mut self, symbol: SymbolId, pos: usize, match_len: usize) -> bool {
        if Some(symbol) != self.table.lex.word || self.table.lex.keywords.is_empty() {
            return false;
        }
        let lexeme = self.reader.slice(pos, pos + match_len);
        std::str::from_utf8(&lexeme)
            .ok()
            .and_then(|text| self.table.lex.keyword(text))
            .is_some()
    }

    /// Byte-compare a literal. Returns (matched, bytes examined).
    fn match_literal(&mut self, pos: usize, text: &[u8]) -> (bool, usize) {
        for (i, &expected) in text.iter().enumerate() {
            match self.reader.byte_at(pos + i) {
                Some(byte) if byte == expected => {}
                _ => return (false, i + 1),
            }
        }
        (true, text.len())
    }

    /// Walk a pattern DFA for its longest match. Match signals arrive one
    /// byte late in regex-automata's low-level API, so the end offset is
    /// the index of the byte being fed; end-of-input is probed explicitly.
    fn match_dfa(&mut self, pos: usize, symbol: SymbolId) -> Result<(Option<usize>, usize), LexError> {
        let dfa = self.dfas[symbol as usize]
            .as_ref()
            .expect("pattern terminals have a DFA");
        let empty: &[u8] = &[];
        let mut state = dfa
            .start_state_forward(&Input::new(empty).anchored(Anchored::Yes))
            .map_err(|e| LexError::Table(e.to_string()))?;

        let mut match_len: Option<usize> = None;
        let mut i = 0usize;
        loop {
            match self.reader.byte_at(pos + i) {
                Some(byte) => {
                    state = dfa.next_state(state, byte);
                    if dfa.is_match_state(state) {
                        match_len = Some(i);
                    } else if dfa.is_dead_state(state) || dfa.is_quit_state(state) {
                        i += 1;
                        break;
                    }
                    i += 1;
                }
                None => {
                    state = dfa.next_eoi_state(state);
                    if dfa.is_match_state(state) {
                        match_len = Some(i);
                    }
                    i += 1;
                    break;
                }
            }
        }

        // Zero-length pattern matches would loop the parser; refuse them.
        if match_len == Some(0) {
            match_len = None;
        }
        Ok((match_len, i))
    }
}

fn consider(best: &mut Option<(usize, u8, SymbolId)>, len: usize, rank: u8, symbol: SymbolId) {
    let better = match best {
        None => true,
        Some((best_len, best_rank, best_symbol)) => {
            (len, rank, std::cmp::Reverse(symbol))
                > (*best_len, *best_rank, std::cmp::Reverse(*best_symbol))
        }
    };
    if better {
        *best = Some((len, rank, symbol));
    }
}
