//! Parse stacks for generalized parsing.
//!
//! One stack in the deterministic case; a breadth-first work-list of
//! snapshots when a multi-action state forks. Stacks at the same token
//! boundary with identical state vectors merge, keeping the survivor with
//! the lower error cost (then the higher accumulated dynamic precedence),
//! which bounds ambiguity fan-out.

use canopy_tables::{StateId, SymbolId};

use crate::tree::NodeId;

/// One pushed node. Extras ride along without a state of their own and are
/// skipped when counting reduction children.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StackEntry {
    pub node: NodeId,
    pub symbol: SymbolId,
    pub extra: bool,
}

/// A single parse stack snapshot. Cloning is O(depth), acceptable because
/// forks are local and merges collapse them within a few tokens.
#[derive(Debug, Clone)]
pub(crate) struct ParseStack {
    /// Automaton states; one more than the non-extra entries.
    pub states: Vec<StateId>,
    pub entries: Vec<StackEntry>,
    /// Next byte offset this stack will consume.
    pub pos: usize,
    /// Accumulated cost of skipped/missing/error content.
    pub error_cost: u32,
    /// Accumulated dynamic precedence of reduced productions.
    pub dynamic_prec: i64,
    /// MISSING tokens synthesized so far; recovery stops inserting past a
    /// fixed cap.
    pub missing_count: u32,
}

impl ParseStack {
    pub fn new() -> Self {
        Self {
            states: vec![0],
            entries: Vec::new(),
            pos: 0,
            error_cost: 0,
            dynamic_prec: 0,
            missing_count: 0,
        }
    }

    #[inline]
    pub fn top_state(&self) -> StateId {
        *self.states.last().expect("stack always has a state")
    }

    /// Push a shifted or reused non-extra node.
    pub fn push(&mut self, state: StateId, node: NodeId, symbol: SymbolId) {
        self.states.push(state);
        self.entries.push(StackEntry {
            node,
            symbol,
            extra: false,
        });
    }

    /// Push an extra node; no state change.
    pub fn push_extra(&mut self, node: NodeId, symbol: SymbolId) {
        self.entries.push(StackEntry {
            node,
            symbol,
            extra: true,
        });
    }

    /// Pop entries until `count` non-extras have come off, returning them
    /// in source order. Extras between them come along.
    pub fn pop_for_reduce(&mut self, count: usize) -> Vec<StackEntry> {
        let mut popped = Vec::new();
        let mut non_extra = 0;
        while non_extra < count {
            let entry = self
                .entries
                .pop()
                .expect("reduce pops at most the pushed entries");
            if !entry.extra {
                non_extra += 1;
                self.states.pop();
            }
            popped.push(entry);
        }
        popped.reverse();
        popped
    }

    /// Merge preference: lower error cost, then higher dynamic precedence.
    pub fn is_better_than(&self, other: &ParseStack) -> bool {
        (self.error_cost, -self.dynamic_prec) < (other.error_cost, -other.dynamic_prec)
    }

    /// Merge key: position and the whole state vector. Entries may differ
    /// (that is the ambiguity being collapsed).
    pub fn merge_key(&self) -> (usize, &[StateId]) {
        (self.pos, &self.states)
    }
}

/// Keep the live set bounded: merge equal keys, then prune the worst
/// stacks beyond `max_stacks`.
pub(crate) fn merge_and_prune(
    stacks: &mut Vec<ParseStack>,
    max_stacks: usize,
    tracer: &mut dyn crate::trace::Tracer,
) {
    let mut merged: Vec<ParseStack> = Vec::with_capacity(stacks.len());
    for stack in stacks.drain(..) {
        match merged
            .iter_mut()
            .find(|existing| existing.merge_key() == stack.merge_key())
        {
            Some(existing) => {
                tracer.trace_merge(existing.top_state());
                if stack.is_better_than(existing) {
                    *existing = stack;
                }
            }
            None => merged.push(stack),
        }
    }

    if merged.len() > max_stacks {
        merged.sort_by(|a, b| {
            (a.error_cost, -a.dynamic_prec).cmp(&(b.error_cost, -b.dynamic_prec))
        });
        merged.truncate(max_stacks);
    }

    *stacks = merged;
}
