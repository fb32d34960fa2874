//! Error recovery, embedded in the engine.
//!
//! On a token with no action anywhere: (1) when exactly one terminal
//! insertion would let the canonical path resume on the actual token, a
//! zero-width MISSING leaf is synthesized; (2) otherwise an ERROR node
//! absorbs the offending token(s), popping the smallest stack depth whose
//! exposed state accepts a nearby upcoming token; (3) at end of input with
//! no synchronization point, everything left wraps in a trailing ERROR
//! node. A tree comes out of every parse, including empty and entirely
//! invalid input.

use canopy_tables::{Action, END_SYMBOL, ERROR_SYMBOL, SymbolId};

use crate::error::ParseError;
use crate::lexer::Token;
use crate::parser::{
    ERROR_COST_PER_POPPED, ERROR_COST_PER_SKIPPED_TOKEN, LeafSpec, RecoverOutcome, Session,
};
use crate::stack::{ParseStack, StackEntry};
use crate::tree::NodeFlags;

/// MISSING insertions allowed per parse path before recovery falls back
/// to ERROR wrapping.
const MAX_MISSING: u32 = 8;

impl Session<'_, '_> {
    /// Entry point: called when every live stack failed on `token`.
    pub(crate) fn recover(
        &mut self,
        stack: ParseStack,
        token: Token,
    ) -> Result<RecoverOutcome, ParseError> {
        if stack.missing_count < MAX_MISSING {
            if let Some(symbol) = self.unique_missing_insertion(&stack, token) {
                return Ok(self.commit_missing(stack, symbol));
            }
        }
        if token.is_eof() {
            return Ok(RecoverOutcome::Finished(self.wrap_everything(stack)));
        }
        self.absorb_error(stack, token)
            .map(RecoverOutcome::Continue)
    }

    /// The single terminal whose zero-width insertion resumes the
    /// canonical path on the actual token, if exactly one exists.
    fn unique_missing_insertion(&mut self, stack: &ParseStack, token: Token) -> Option<SymbolId> {
        let candidates: Vec<SymbolId> = self
            .table
            .state(stack.top_state())
            .valid_terminals()
            .filter(|&symbol| symbol != END_SYMBOL && symbol != token.symbol)
            .collect();

        let mut found = None;
        for symbol in candidates {
            if self.insertion_resumes(stack, symbol, token) {
                if found.is_some() {
                    return None;
                }
                found = Some(symbol);
            }
        }
        found
    }

    /// Simulate inserting `symbol` at the stack position: follow reduces
    /// to its shift, then check the actual token has an action afterward.
    /// Ambiguous cells disqualify the candidate.
    fn insertion_resumes(&mut self, stack: &ParseStack, symbol: SymbolId, token: Token) -> bool {
        let mut sim = stack.clone();
        let inserted = Token {
            symbol,
            start: stack.pos,
            end: stack.pos,
            lookahead: 0,
            is_extra: false,
            is_error: false,
        };

        loop {
            let Some(set) = self.table.state(sim.top_state()).action(symbol) else {
                return false;
            };
            let Some(action) = set.single() else {
                return false;
            };
            match action {
                Action::Shift { state } => {
                    let node = self.builder.push_leaf(
                        symbol,
                        sim.pos as u32,
                        sim.pos as u32,
                        NodeFlags {
                            missing: true,
                            ..NodeFlags::default()
                        },
                        0,
                    );
                    sim.push(state, node, symbol);
                    break;
                }
                Action::Reduce { production } => {
                    if !self.apply_reduce(&mut sim, production, inserted, false, false) {
                        return false;
                    }
                }
                Action::Accept => return false,
            }
        }

        self.table
            .state(sim.top_state())
            .action(token.symbol)
            .is_some()
    }

    /// Push the MISSING leaf for real. The actual token is left for the
    /// next round.
    fn commit_missing(&mut self, stack: ParseStack, symbol: SymbolId) -> RecoverOutcome {
        self.tracer.trace_missing(symbol, stack.pos);
        let inserted = Token {
            symbol,
            start: stack.pos,
            end: stack.pos,
            lookahead: 0,
            is_extra: false,
            is_error: false,
        };

        let mut next = Vec::new();
        let mut accepted = Vec::new();
        let mut failed = Vec::new();
        self.advance(
            stack,
            inserted,
            LeafSpec::Missing,
            false,
            &mut next,
            &mut accepted,
            &mut failed,
        );

        match next.pop() {
            Some(stack) => RecoverOutcome::Continue(stack),
            // The simulation said this cannot happen; wrap defensively
            // rather than lose the parse.
            None => {
                let stack = failed
                    .pop()
                    .map(|(stack, _)| stack)
                    .unwrap_or_else(ParseStack::new);
                RecoverOutcome::Finished(self.wrap_everything(stack))
            }
        }
    }

    /// End of input, nothing else worked: everything on the stack becomes
    /// a trailing ERROR node, which serves as the root.
    fn wrap_everything(&mut self, mut stack: ParseStack) -> ParseStack {
        let entries = std::mem::take(&mut stack.entries);
        stack.states.truncate(1);

        let children = self.splice(entries);
        let node = self.builder.push_internal(
            ERROR_SYMBOL,
            children,
            NodeFlags {
                error: true,
                ..NodeFlags::default()
            },
            1,
            stack.pos as u32,
        );
        let data_start = self.builder.data(node).start as usize;
        let data_end = self.builder.data(node).end as usize;
        self.tracer.trace_error_node(data_start, data_end);

        stack.error_cost += ERROR_COST_PER_SKIPPED_TOKEN;
        stack.entries = vec![StackEntry {
            node,
            symbol: ERROR_SYMBOL,
            extra: false,
        }];
        stack
    }

    /// Open an ERROR node over the offending token(s): look ahead a
    /// bounded number of tokens for the earliest one some ancestor state
    /// accepts, preferring the shallowest pop; absorb what was skipped and
    /// popped as the ERROR node's children.
    fn absorb_error(&mut self, mut stack: ParseStack, token: Token) -> Result<ParseStack, ParseError> {
        let window = self.options.recovery_window_or_default();

        let mut upcoming = vec![token];
        let mut scan_pos = token.end;
        for _ in 0..window {
            let next = self.lexer.next_token_any(scan_pos)?;
            if next.is_eof() {
                break;
            }
            scan_pos = next.end;
            upcoming.push(next);
        }

        let depth = stack.states.len() - 1;
        let mut sync: Option<(usize, usize)> = None;
        'search: for (j, resume) in upcoming.iter().enumerate() {
            if resume.is_error || resume.is_extra {
                continue;
            }
            for d in 0..=depth {
                if j == 0 && d == 0 {
                    continue; // that's the failure itself
                }
                let state_id = stack.states[stack.states.len() - 1 - d];
                if self.table.state(state_id).action(resume.symbol).is_some() {
                    sync = Some((j, d));
                    break 'search;
                }
            }
        }

        let (skip_count, pop_depth, resume_pos) = match sync {
            Some((j, d)) => (j, d, upcoming[j].start),
            // No synchronization point in the window: absorb it all and
            // try again further on (or at end of input).
            None => (upcoming.len(), 0, scan_pos),
        };

        let popped = stack.pop_for_reduce(pop_depth);
        let mut children = self.splice(popped);
        for skipped in &upcoming[..skip_count] {
            let node = self.builder.push_leaf(
                skipped.symbol,
                skipped.start as u32,
                skipped.end as u32,
                NodeFlags {
                    error: skipped.is_error,
                    extra: skipped.is_extra,
                    ..NodeFlags::default()
                },
                skipped.lookahead,
            );
            children.push(node);
        }

        let node = self.builder.push_internal(
            ERROR_SYMBOL,
            children,
            NodeFlags {
                error: true,
                ..NodeFlags::default()
            },
            1,
            token.start as u32,
        );
        let start = self.builder.data(node).start as usize;
        let end = self.builder.data(node).end as usize;
        self.tracer.trace_error_node(start, end);

        stack.entries.push(StackEntry {
            node,
            symbol: ERROR_SYMBOL,
            extra: true,
        });
        stack.pos = resume_pos;
        stack.error_cost += skip_count as u32 * ERROR_COST_PER_SKIPPED_TOKEN
            + pop_depth as u32 * ERROR_COST_PER_POPPED;

        Ok(stack)
    }
}
