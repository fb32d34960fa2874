//! Action-table fill and conflict resolution.
//!
//! Shifts come from terminal transitions, reduces from completed items on
//! the FOLLOW of their left-hand side, Accept from the completed augmented
//! item on end-of-input. Cells with more than one candidate are resolved by
//! declared precedence and associativity; what survives unresolved must be
//! covered by a declared conflict set, becoming a bounded multi-action cell
//! for the generalized engine.

use std::collections::BTreeMap;

use canopy_tables::{
    Action, ActionSet, Assoc, END_SYMBOL, MAX_ACTIONS, ParseState, Production, SymbolId,
    SymbolInfo,
};

use crate::build::first::Analysis;
use crate::build::states::Automaton;
use crate::error::GrammarError;

pub(crate) fn build_actions(
    automaton: &Automaton,
    productions: &[Production],
    analysis: &Analysis,
    symbols: &[SymbolInfo],
    terminal_count: u16,
    declared_conflicts: &[Vec<String>],
    conflict_names: &[String],
) -> Result<Vec<ParseState>, GrammarError> {
    let mut states = Vec::with_capacity(automaton.states.len());

    for state in &automaton.states {
        let mut cells: BTreeMap<SymbolId, Vec<Candidate>> = BTreeMap::new();
        let mut gotos = Vec::new();

        for (&symbol, &target) in &state.transitions {
            if symbol < terminal_count {
                cells
                    .entry(symbol)
                    .or_default()
                    .push(Candidate::Shift { state: target });
            } else {
                gotos.push((symbol, target));
            }
        }

        for item in &state.items {
            if item.next_symbol(productions).is_some() {
                continue;
            }
            if item.production == 0 {
                cells
                    .entry(END_SYMBOL)
                    .or_default()
                    .push(Candidate::Accept);
                continue;
            }
            let lhs = productions[item.production as usize].lhs;
            for &lookahead in analysis.follow(lhs) {
                cells
                    .entry(lookahead)
                    .or_default()
                    .push(Candidate::Reduce {
                        production: item.production,
                    });
            }
        }

        let mut actions = Vec::with_capacity(cells.len());
        for (lookahead, candidates) in cells {
            let resolved = resolve_cell(
                lookahead,
                candidates,
                state,
                productions,
                analysis,
                symbols,
                declared_conflicts,
                conflict_names,
            )?;
            actions.push((lookahead, resolved));
        }

        states.push(ParseState { actions, gotos });
    }

    Ok(states)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Candidate {
    Shift { state: u32 },
    Reduce { production: u32 },
    Accept,
}

#[allow(clippy::too_many_arguments)]
fn resolve_cell(
    lookahead: SymbolId,
    candidates: Vec<Candidate>,
    state: &crate::build::states::StateData,
    productions: &[Production],
    analysis: &Analysis,
    symbols: &[SymbolInfo],
    declared_conflicts: &[Vec<String>],
    conflict_names: &[String],
) -> Result<ActionSet, GrammarError> {
    if candidates.len() == 1 {
        return Ok(ActionSet::new(vec![to_action(candidates[0])]));
    }

    let shift = candidates.iter().find_map(|c| match c {
        Candidate::Shift { state } => Some(*state),
        _ => None,
    });
    let accept = candidates.contains(&Candidate::Accept);
    let mut reduces: Vec<u32> = candidates
        .iter()
        .filter_map(|c| match c {
            Candidate::Reduce { production } => Some(*production),
            _ => None,
        })
        .collect();

    // Reduce/reduce: strictly higher precedence wins outright.
    if reduces.len() > 1 {
        let max_prec = reduces
            .iter()
            .map(|&p| productions[p as usize].prec)
            .max()
            .unwrap_or(0);
        reduces.retain(|&p| productions[p as usize].prec == max_prec);
    }

    // Shift/reduce: compare each reduce against the precedence of the
    // productions the shift would continue.
    let mut keep_shift = shift.is_some();
    let mut tie_unresolved = false;
    if let Some(_target) = shift {
        let shift_prec = state
            .items
            .iter()
            .filter(|item| item.next_symbol(productions) == Some(lookahead))
            .map(|item| productions[item.production as usize].prec)
            .max()
            .unwrap_or(0);

        reduces.retain(|&p| {
            let production = &productions[p as usize];
            match production.prec.cmp(&shift_prec) {
                std::cmp::Ordering::Greater => {
                    keep_shift = false;
                    true
                }
                std::cmp::Ordering::Less => false,
                std::cmp::Ordering::Equal => match production.assoc {
                    Assoc::Left => {
                        keep_shift = false;
                        true
                    }
                    Assoc::Right => false,
                    Assoc::None => {
                        tie_unresolved = true;
                        true
                    }
                },
            }
        });
    }

    let mut survivors: Vec<Action> = Vec::new();
    if accept {
        survivors.push(Action::Accept);
    }
    if keep_shift {
        if let Some(target) = shift {
            survivors.push(Action::Shift { state: target });
        }
    }
    survivors.extend(reduces.iter().map(|&production| Action::Reduce { production }));

    if survivors.len() == 1 && !tie_unresolved {
        return Ok(ActionSet::new(survivors));
    }

    // Still ambiguous: acceptable only when a declared conflict set covers
    // every involved rule. An item is involved if it shifts this lookahead
    // or is completed and reduces on it.
    let mut involved: Vec<String> = Vec::new();
    for item in &state.items {
        let lhs = productions[item.production as usize].lhs;
        let participates = match item.next_symbol(productions) {
            Some(next) => next == lookahead,
            None => analysis.follow(lhs).contains(&lookahead),
        };
        if participates {
            let name = conflict_names[lhs as usize].clone();
            if !involved.contains(&name) {
                involved.push(name);
            }
        }
    }
    involved.retain(|name| name != "$start");

    let covered = declared_conflicts.iter().any(|set| {
        involved
            .iter()
            .all(|name| set.iter().any(|declared| declared == name))
    });

    let lookahead_name = symbols[lookahead as usize].name.clone();
    if !covered {
        return Err(GrammarError::Conflict {
            lookahead: lookahead_name,
            rules: involved,
        });
    }
    if survivors.len() > MAX_ACTIONS {
        return Err(GrammarError::AmbiguityBound {
            lookahead: lookahead_name,
            width: survivors.len(),
            bound: MAX_ACTIONS,
        });
    }
    Ok(ActionSet::new(survivors))
}

fn to_action(candidate: Candidate) -> Action {
    match candidate {
        Candidate::Shift { state } => Action::Shift { state },
        Candidate::Reduce { production } => Action::Reduce { production },
        Candidate::Accept => Action::Accept,
    }
}
