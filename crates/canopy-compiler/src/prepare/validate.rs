//! Post-flattening validation.
//!
//! Undefined references surface during flattening; this pass checks the
//! properties that need the whole production set: reachability from the
//! entry rule and zero-consumption derivation cycles.

use std::collections::HashSet;

use crate::error::GrammarError;
use crate::prepare::{FlatGrammar, SymRef};

pub(crate) fn validate(flat: &FlatGrammar) -> Result<(), GrammarError> {
    check_reachability(flat)?;
    check_cycles(flat)?;
    Ok(())
}

/// Every user-defined nonterminal must be derivable from the entry rule.
/// Auxiliary rules are generated from reachable bodies, so only named
/// rules are reported.
fn check_reachability(flat: &FlatGrammar) -> Result<(), GrammarError> {
    let mut reachable = HashSet::from([flat.start]);
    let mut work = vec![flat.start];

    while let Some(nt) = work.pop() {
        for production in flat.productions.iter().filter(|p| p.lhs == nt) {
            for sym in &production.rhs {
                if let SymRef::N(target) = sym {
                    if reachable.insert(*target) {
                        work.push(*target);
                    }
                }
            }
        }
    }

    for (index, spec) in flat.nonterminals.iter().enumerate() {
        let generated = spec.conflict_name != spec.name || spec.name == "_start";
        if !generated && !reachable.contains(&index) {
            return Err(GrammarError::Unreachable {
                rule: spec.name.clone(),
                start: flat.nonterminals[flat.start].name.clone(),
            });
        }
    }
    Ok(())
}

/// Detect `A =>+ A` derivations that consume no input. Such a cycle makes
/// the number of parses of a single span unbounded, so it is rejected
/// rather than bounded at runtime.
fn check_cycles(flat: &FlatGrammar) -> Result<(), GrammarError> {
    let nullable = nullable_set(flat);

    // Unit-derivation edges: A -> B where every other rhs symbol is nullable.
    let nt_count = flat.nonterminals.len();
    let mut edges: Vec<Vec<usize>> = vec![Vec::new(); nt_count];
    for production in &flat.productions {
        for (i, sym) in production.rhs.iter().enumerate() {
            let SymRef::N(target) = sym else { continue };
            let rest_nullable = production
                .rhs
                .iter()
                .enumerate()
                .all(|(j, other)| i == j || is_nullable(other, &nullable));
            if rest_nullable {
                edges[production.lhs].push(*target);
            }
        }
    }

    // Colored DFS for a cycle through the unit-derivation graph.
    const WHITE: u8 = 0;
    const GRAY: u8 = 1;
    const BLACK: u8 = 2;
    let mut color = vec![WHITE; nt_count];

    fn visit(nt: usize, edges: &[Vec<usize>], color: &mut [u8]) -> Option<usize> {
        color[nt] = GRAY;
        for &next in &edges[nt] {
            match color[next] {
                GRAY => return Some(next),
                WHITE => {
                    if let Some(cycle) = visit(next, edges, color) {
                        return Some(cycle);
                    }
                }
                _ => {}
            }
        }
        color[nt] = BLACK;
        None
    }

    for nt in 0..nt_count {
        if color[nt] == WHITE {
            if let Some(offender) = visit(nt, &edges, &mut color) {
                return Err(GrammarError::CyclicRule {
                    rule: flat.nonterminals[offender].name.clone(),
                });
            }
        }
    }
    Ok(())
}

fn is_nullable(sym: &SymRef, nullable: &HashSet<usize>) -> bool {
    match sym {
        SymRef::T(_) => false,
        SymRef::N(nt) => nullable.contains(nt),
    }
}

/// Fixed-point nullable computation over the production set.
pub(crate) fn nullable_set(flat: &FlatGrammar) -> HashSet<usize> {
    let mut nullable = HashSet::new();
    loop {
        let mut changed = false;
        for production in &flat.productions {
            if nullable.contains(&production.lhs) {
                continue;
            }
            if production
                .rhs
                .iter()
                .all(|sym| is_nullable(sym, &nullable))
            {
                nullable.insert(production.lhs);
                changed = true;
            }
        }
        if !changed {
            return nullable;
        }
    }
}
