//! Automaton construction: symbol numbering, FIRST/FOLLOW analysis, item
//! sets, action tables, and lexical DFAs.

mod actions;
mod first;
mod lexer;
mod states;

#[cfg(test)]
mod first_tests;
#[cfg(test)]
mod states_tests;

use canopy_tables::{
    CompiledGrammar, ParseTable, Production, SymbolId, SymbolInfo,
};

use crate::error::GrammarError;
use crate::prepare::{FlatGrammar, SymRef};

/// Assemble a [`CompiledGrammar`] from a validated flat grammar.
pub(crate) fn build(flat: &FlatGrammar, fingerprint: u64) -> Result<CompiledGrammar, GrammarError> {
    let terminal_count = flat.terminals.len() as u16;
    let nt_base = terminal_count;

    // Final symbol listing: terminals, then nonterminals, then the
    // augmented start symbol.
    let mut symbols: Vec<SymbolInfo> = Vec::with_capacity(
        flat.terminals.len() + flat.nonterminals.len() + 1,
    );
    for term in &flat.terminals {
        symbols.push(SymbolInfo {
            name: term.name.clone(),
            named: term.named,
            visible: true,
            extra: term.extra,
            external: matches!(term.matcher, crate::prepare::FlatMatcher::External(_)),
        });
    }
    for nt in &flat.nonterminals {
        symbols.push(SymbolInfo {
            name: nt.name.clone(),
            named: nt.visible,
            visible: nt.visible,
            extra: false,
            external: false,
        });
    }
    let augmented: SymbolId = nt_base + flat.nonterminals.len() as u16;
    symbols.push(SymbolInfo {
        name: "$start".to_string(),
        named: false,
        visible: false,
        extra: false,
        external: false,
    });

    let start_symbol: SymbolId = nt_base + flat.start as u16;

    // Production 0 is the augmented start production.
    let mut productions = Vec::with_capacity(flat.productions.len() + 1);
    productions.push(Production {
        lhs: augmented,
        rhs: vec![start_symbol],
        prec: 0,
        assoc: canopy_tables::Assoc::None,
        dynamic_prec: 0,
    });
    for flat_production in &flat.productions {
        productions.push(Production {
            lhs: nt_base + flat_production.lhs as u16,
            rhs: flat_production
                .rhs
                .iter()
                .map(|sym| match sym {
                    SymRef::T(term) => *term as SymbolId,
                    SymRef::N(nt) => nt_base + *nt as u16,
                })
                .collect(),
            prec: flat_production.prec,
            assoc: flat_production.assoc,
            dynamic_prec: flat_production.dynamic_prec,
        });
    }

    let analysis = first::analyze(&productions, terminal_count, symbols.len(), augmented);
    let automaton = states::build_states(&productions, terminal_count);

    // Conflict-set names per nonterminal symbol, for declared-conflict
    // matching during resolution.
    let conflict_names: Vec<String> = symbols
        .iter()
        .enumerate()
        .map(|(id, info)| {
            let id = id as SymbolId;
            if id >= nt_base && id < augmented {
                flat.nonterminals[(id - nt_base) as usize].conflict_name.clone()
            } else {
                info.name.clone()
            }
        })
        .collect();

    let parse_states = actions::build_actions(
        &automaton,
        &productions,
        &analysis,
        &symbols,
        terminal_count,
        &flat.conflicts,
        &conflict_names,
    )?;

    let lex = lexer::build_lex_table(flat)?;

    Ok(CompiledGrammar {
        name: flat.name.clone(),
        fingerprint,
        symbols,
        terminal_count,
        start_symbol,
        productions,
        parse: ParseTable {
            states: parse_states,
        },
        lex,
    })
}
