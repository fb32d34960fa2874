//! The parser engine: one generic action loop driven by the compiled
//! tables.
//!
//! Per token: look up `(state, lookahead)`; Shift pushes a leaf and a
//! state, Reduce builds an internal node from the popped children and
//! follows the goto, Accept finalizes. Multi-action cells fork the stack;
//! stacks step in lockstep and merge at token boundaries. A token with no
//! action anywhere hands control to recovery (never aborting the parse).
//! With a previous tree attached, unedited subtrees are pushed wholesale
//! instead of being re-lexed and re-reduced.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use canopy_tables::{Action, CompiledGrammar, ERROR_SYMBOL, SymbolId};

use crate::error::ParseError;
use crate::lexer::{ExternalScanner, Lexer, Token};
use crate::reuse::{Candidate, ReuseCursor};
use crate::source::TextSource;
use crate::stack::{ParseStack, StackEntry, merge_and_prune};
use crate::trace::{NoopTracer, Tracer};
use crate::tree::{NodeFlags, NodeId, Tree, TreeBuilder};

pub(crate) const ERROR_COST_PER_MISSING: u32 = 110;
pub(crate) const ERROR_COST_PER_SKIPPED_TOKEN: u32 = 120;
pub(crate) const ERROR_COST_PER_POPPED: u32 = 100;

/// Per-call knobs, builder-style.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    pub(crate) cancellation: Option<Arc<AtomicBool>>,
    pub(crate) max_stacks: Option<usize>,
    pub(crate) recovery_window: Option<usize>,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cooperative cancellation: raise the flag from any thread and the
    /// parse returns [`ParseError::Cancelled`] at the next token boundary.
    pub fn cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancellation = Some(flag);
        self
    }

    /// Cap on simultaneously live stacks during generalized parsing
    /// (default 10).
    pub fn max_stacks(mut self, max: usize) -> Self {
        self.max_stacks = Some(max.max(1));
        self
    }

    /// How many tokens ahead recovery searches for a synchronization
    /// point (default 16).
    pub fn recovery_window(mut self, window: usize) -> Self {
        self.recovery_window = Some(window.max(1));
        self
    }

    pub(crate) fn max_stacks_or_default(&self) -> usize {
        self.max_stacks.unwrap_or(10)
    }

    pub(crate) fn recovery_window_or_default(&self) -> usize {
        self.recovery_window.unwrap_or(16)
    }
}

/// A parser for one compiled grammar. Cheap to clone; carries no parse
/// state of its own, so one parser can serve many threads.
#[derive(Clone)]
pub struct Parser {
    table: Arc<CompiledGrammar>,
}

impl Parser {
    pub fn new(table: Arc<CompiledGrammar>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &Arc<CompiledGrammar> {
        &self.table
    }

    /// Parse `source`, reusing unaffected subtrees of `previous` when one
    /// is given. Always produces a tree for any input; the only error
    /// conditions are cancellation and external-scanner misuse.
    pub fn parse<S: TextSource + ?Sized>(
        &self,
        source: &S,
        previous: Option<&Tree>,
    ) -> Result<Tree, ParseError> {
        self.parse_with_options(
            source,
            previous,
            &ParseOptions::default(),
            None,
            &mut NoopTracer,
        )
    }

    pub fn parse_with_options<'ext, S: TextSource + ?Sized>(
        &self,
        source: &S,
        previous: Option<&Tree>,
        options: &'ext ParseOptions,
        scanner: Option<&'ext mut dyn ExternalScanner>,
        tracer: &'ext mut dyn Tracer,
    ) -> Result<Tree, ParseError> {
        let text_len = source.len();
        let adapter = SourceAdapter(source);
        let source: &dyn TextSource = &adapter;

        let reuse = previous.and_then(|tree| ReuseCursor::new(tree, self.table.fingerprint));
        let session = Session {
            table: self.table.as_ref(),
            lexer: Lexer::new(&self.table, source)?,
            builder: TreeBuilder::new(),
            options,
            scanner,
            tracer,
            reuse,
        };
        let (builder, root) = session.run()?;

        let lines = match previous {
            Some(prev) if prev.grammar_fingerprint() == self.table.fingerprint => {
                prev.lines.rescan(source, &prev.dirty)
            }
            _ => crate::tree::LineIndex::build(source),
        };

        Ok(builder.finish(root, Arc::clone(&self.table), text_len as u32, lines))
    }
}

/// Wraps a sized source so the session can hold one `&dyn` reference.
struct SourceAdapter<'a, S: TextSource + ?Sized>(&'a S);

impl<S: TextSource + ?Sized> TextSource for SourceAdapter<'_, S> {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn chunk_at(&self, offset: usize) -> &[u8] {
        self.0.chunk_at(offset)
    }
}

/// How the next leaf comes into being.
pub(crate) enum LeafSpec {
    Fresh,
    Reused(NodeId),
    Missing,
}

pub(crate) struct Session<'s, 'ext> {
    pub(crate) table: &'s CompiledGrammar,
    pub(crate) lexer: Lexer<'s>,
    pub(crate) builder: TreeBuilder,
    pub(crate) options: &'ext ParseOptions,
    pub(crate) scanner: Option<&'ext mut dyn ExternalScanner>,
    pub(crate) tracer: &'ext mut dyn Tracer,
    pub(crate) reuse: Option<ReuseCursor<'s>>,
}

enum ReuseStep {
    /// A whole subtree or extra was pushed; the stack moved forward.
    Done,
    /// A leaf from the old tree serves as the next token.
    Token(Token, LeafSpec),
    /// Nothing reusable here.
    Nothing,
}

impl<'s, 'ext> Session<'s, 'ext> {
    fn cancelled(&self) -> bool {
        self.options
            .cancellation
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    fn run(mut self) -> Result<(TreeBuilder, NodeId), ParseError> {
        let mut stacks = vec![ParseStack::new()];
        let mut accepted: Vec<ParseStack> = Vec::new();

        while !stacks.is_empty() {
            // Cooperative cancellation, checked between token steps. All
            // partial allocation is dropped with the session.
            if self.cancelled() {
                return Err(ParseError::Cancelled);
            }

            merge_and_prune(&mut stacks, self.options.max_stacks_or_default(), self.tracer);

            let deterministic = stacks.len() == 1;
            let mut next: Vec<ParseStack> = Vec::new();
            let mut failed: Vec<(ParseStack, Token)> = Vec::new();

            for mut stack in std::mem::take(&mut stacks) {
                let forked = !deterministic;

                if deterministic {
                    match self.try_reuse(&mut stack)? {
                        ReuseStep::Done => {
                            next.push(stack);
                            continue;
                        }
                        ReuseStep::Token(token, leaf) => {
                            self.advance(
                                stack, token, leaf, forked, &mut next, &mut accepted, &mut failed,
                            );
                            continue;
                        }
                        ReuseStep::Nothing => {}
                    }
                }

                let token =
                    self.lexer
                        .next_token(stack.pos, stack.top_state(), &mut self.scanner)?;

                if token.is_extra {
                    let node = self.builder.push_leaf(
                        token.symbol,
                        token.start as u32,
                        token.end as u32,
                        NodeFlags {
                            extra: true,
                            ..NodeFlags::default()
                        },
                        token.lookahead,
                    );
                    stack.push_extra(node, token.symbol);
                    stack.pos = token.end;
                    next.push(stack);
                    continue;
                }

                self.advance(
                    stack,
                    token,
                    LeafSpec::Fresh,
                    forked,
                    &mut next,
                    &mut accepted,
                    &mut failed,
                );
            }

            // Recovery runs only when nothing progressed anywhere; it
            // never aborts the parse.
            if next.is_empty() && accepted.is_empty() && !failed.is_empty() {
                let (stack, token) = take_best_failure(failed);
                match self.recover(stack, token)? {
                    RecoverOutcome::Continue(stack) => next.push(stack),
                    RecoverOutcome::Finished(stack) => accepted.push(stack),
                }
            }

            stacks = next;
        }

        let best = accepted
            .into_iter()
            .min_by_key(|stack| (stack.error_cost, -stack.dynamic_prec))
            .expect("recovery guarantees an accepted stack");
        self.tracer.trace_accept(best.error_cost);

        let root = self.assemble_root(best);
        Ok((self.builder, root))
    }

    /// Process one (stack, token) pair to its shift/accept outcomes,
    /// forking on multi-action cells and re-examining the token after each
    /// reduce.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn advance(
        &mut self,
        stack: ParseStack,
        token: Token,
        leaf: LeafSpec,
        forked: bool,
        out_next: &mut Vec<ParseStack>,
        out_accepted: &mut Vec<ParseStack>,
        out_failed: &mut Vec<(ParseStack, Token)>,
    ) {
        // The leaf node is shared by all forks shifting this token.
        let leaf_node = match leaf {
            LeafSpec::Reused(node) => Some(node),
            _ => None,
        };
        let missing = matches!(leaf, LeafSpec::Missing);

        let mut pending = vec![stack];
        let mut progressed = false;
        let mut leaf_cache: Option<NodeId> = leaf_node;

        while let Some(mut current) = pending.pop() {
            let state = self.table.state(current.top_state());
            let Some(actions) = state.action(token.symbol) else {
                if !progressed && pending.is_empty() {
                    out_failed.push((current, token));
                } // else: this fork dies, others carry on
                continue;
            };

            let fan_out = actions.len();
            if fan_out > 1 {
                self.tracer.trace_fork(current.top_state(), fan_out);
            }

            let actions: Vec<Action> = actions.iter().copied().collect();
            for (index, action) in actions.iter().enumerate() {
                let mut branch = if index + 1 == actions.len() {
                    std::mem::replace(&mut current, ParseStack::new())
                } else {
                    current.clone()
                };

                match *action {
                    Action::Shift { state: target } => {
                        let node = *leaf_cache.get_or_insert_with(|| {
                            self.builder.push_leaf(
                                token.symbol,
                                token.start as u32,
                                token.end as u32,
                                NodeFlags {
                                    missing,
                                    error: token.is_error,
                                    ..NodeFlags::default()
                                },
                                token.lookahead,
                            )
                        });
                        branch.push(target, node, token.symbol);
                        branch.pos = token.end;
                        if missing {
                            branch.error_cost += ERROR_COST_PER_MISSING;
                            branch.missing_count += 1;
                        }
                        self.tracer.trace_shift(token.symbol, token.start, token.end);
                        out_next.push(branch);
                        progressed = true;
                    }
                    Action::Reduce { production } => {
                        if self.apply_reduce(
                            &mut branch,
                            production,
                            token,
                            forked || fan_out > 1,
                            true,
                        ) {
                            pending.push(branch);
                        }
                    }
                    Action::Accept => {
                        out_accepted.push(branch);
                        progressed = true;
                    }
                }
            }
        }
    }

    /// Pop the production's children, splice hidden ones, build the node,
    /// follow the goto. Returns false if the goto is absent (dead branch).
    pub(crate) fn apply_reduce(
        &mut self,
        stack: &mut ParseStack,
        production_id: u32,
        lookahead: Token,
        fragile: bool,
        trace: bool,
    ) -> bool {
        let production = self.table.production(production_id);
        let popped = stack.pop_for_reduce(production.rhs_len());
        let children = self.splice(popped);

        let Some(goto) = self
            .table
            .state(stack.top_state())
            .goto(production.lhs)
        else {
            return false;
        };

        let node = self.builder.push_internal(
            production.lhs,
            children,
            NodeFlags {
                fragile,
                ..NodeFlags::default()
            },
            0,
            stack.pos as u32,
        );
        // The closing decision saw the lookahead token (and whatever the
        // lexer peeked past it); an edit inside that window invalidates
        // the node for reuse.
        let node_end = self.builder.data(node).end;
        let window_end = lookahead.end as u32 + lookahead.lookahead;
        let la = window_end.saturating_sub(node_end).max(1);
        self.builder.set_lookahead(node, la);

        stack.push(goto, node, production.lhs);
        stack.dynamic_prec += i64::from(production.dynamic_prec);
        if trace {
            self.tracer
                .trace_reduce(production_id, self.builder.data(node).children.len());
        }
        true
    }

    /// Replace hidden nodes by their children, recursively already flat.
    pub(crate) fn splice(&self, entries: Vec<StackEntry>) -> Vec<NodeId> {
        let mut children = Vec::with_capacity(entries.len());
        for entry in entries {
            if self.is_hidden(entry.symbol) {
                children.extend_from_slice(&self.builder.data(entry.node).children);
            } else {
                children.push(entry.node);
            }
        }
        children
    }

    fn is_hidden(&self, symbol: SymbolId) -> bool {
        symbol != ERROR_SYMBOL
            && self
                .table
                .symbols
                .get(symbol as usize)
                .is_some_and(|info| !info.visible)
    }

    /// Try to serve the next step from the previous tree.
    fn try_reuse(&mut self, stack: &mut ParseStack) -> Result<ReuseStep, ParseError> {
        let Some(cursor) = &self.reuse else {
            return Ok(ReuseStep::Nothing);
        };

        for candidate in cursor.candidates_at(stack.pos) {
            match candidate {
                Candidate::Internal(id) => {
                    let data = cursor.tree().data(id);
                    let (kind, start, end) = (data.kind, data.start as usize, data.end as usize);
                    let state = self.table.state(stack.top_state());
                    let Some(goto) = state.goto(kind) else {
                        continue;
                    };
                    // Safe only when the parser would shift straight into
                    // this subtree: a pending reduce on its first token
                    // would give the scratch parse a different shape.
                    let Some(first_kind) = cursor.first_leaf_kind(id) else {
                        continue;
                    };
                    let shifts_in = state.action(first_kind).and_then(|set| set.single());
                    if !matches!(shifts_in, Some(Action::Shift { .. })) {
                        continue;
                    }

                    let node = self.builder.copy_subtree(cursor.tree(), id);
                    stack.push(goto, node, kind);
                    stack.pos = end;
                    self.tracer.trace_reuse(kind, start, end);
                    return Ok(ReuseStep::Done);
                }
                Candidate::Leaf(id) => {
                    let data = cursor.tree().data(id);
                    let (kind, start, end) = (data.kind, data.start as usize, data.end as usize);
                    if data.flags.extra {
                        let node = self.builder.copy_subtree(cursor.tree(), id);
                        stack.push_extra(node, kind);
                        stack.pos = end;
                        self.tracer.trace_reuse(kind, start, end);
                        return Ok(ReuseStep::Done);
                    }
                    let token = Token {
                        symbol: kind,
                        start,
                        end,
                        lookahead: data.lookahead,
                        is_extra: false,
                        is_error: false,
                    };
                    let node = self.builder.copy_subtree(cursor.tree(), id);
                    self.tracer.trace_reuse(kind, start, end);
                    return Ok(ReuseStep::Token(token, LeafSpec::Reused(node)));
                }
                Candidate::LeafNeedsVerify(id) => {
                    let data = cursor.tree().data(id);
                    let (kind, start, end) = (data.kind, data.start as usize, data.end as usize);
                    let token =
                        self.lexer
                            .next_token(stack.pos, stack.top_state(), &mut self.scanner)?;
                    if token.symbol == kind
                        && token.start == start
                        && token.end == end
                        && !token.is_extra
                        && !token.is_error
                    {
                        let cursor = self.reuse.as_ref().expect("checked above");
                        let node = self.builder.copy_subtree(cursor.tree(), id);
                        self.builder.set_lookahead(node, token.lookahead);
                        self.tracer.trace_reuse(kind, start, end);
                        return Ok(ReuseStep::Token(token, LeafSpec::Reused(node)));
                    }
                    // The boundary changed; use the freshly lexed token.
                    return Ok(ReuseStep::Token(token, LeafSpec::Fresh));
                }
            }
        }
        Ok(ReuseStep::Nothing)
    }

    /// Turn the accepted stack's entries into the root node. Boundary
    /// extras and recovery debris attach to the start-symbol node.
    fn assemble_root(&mut self, stack: ParseStack) -> NodeId {
        let pos = stack.pos as u32;
        let children = self.splice(stack.entries);
        if children.len() == 1 {
            return children[0];
        }
        self.builder.push_internal(
            self.table.start_symbol,
            children,
            NodeFlags::default(),
            1,
            pos,
        )
    }
}

fn take_best_failure(mut failed: Vec<(ParseStack, Token)>) -> (ParseStack, Token) {
    let best_index = failed
        .iter()
        .enumerate()
        .min_by_key(|(_, (stack, _))| (stack.error_cost, -stack.dynamic_prec))
        .map(|(index, _)| index)
        .unwrap_or(0);
    failed.swap_remove(best_index)
}

/// Outcome of a recovery step.
pub(crate) enum RecoverOutcome {
    Continue(ParseStack),
    Finished(ParseStack),
}
