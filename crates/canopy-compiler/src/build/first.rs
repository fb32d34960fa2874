//! Nullable/FIRST/FOLLOW analysis over the numbered production set.

use std::collections::BTreeSet;

use canopy_tables::{END_SYMBOL, Production, SymbolId};

/// Fixed-point results used for reduce placement.
pub(crate) struct Analysis {
    nullable: Vec<bool>,
    first: Vec<BTreeSet<SymbolId>>,
    follow: Vec<BTreeSet<SymbolId>>,
}

impl Analysis {
    #[inline]
    pub fn is_nullable(&self, symbol: SymbolId) -> bool {
        self.nullable[symbol as usize]
    }

    #[inline]
    pub fn first(&self, symbol: SymbolId) -> &BTreeSet<SymbolId> {
        &self.first[symbol as usize]
    }

    #[inline]
    pub fn follow(&self, symbol: SymbolId) -> &BTreeSet<SymbolId> {
        &self.follow[symbol as usize]
    }
}

/// Compute nullable, FIRST, and FOLLOW for every symbol.
///
/// Terminals are their own FIRST; FOLLOW of the augmented symbol is
/// end-of-input, which propagates to the entry rule through production 0.
pub(crate) fn analyze(
    productions: &[Production],
    terminal_count: u16,
    symbol_count: usize,
    augmented: SymbolId,
) -> Analysis {
    let mut nullable = vec![false; symbol_count];
    let mut first: Vec<BTreeSet<SymbolId>> = vec![BTreeSet::new(); symbol_count];
    let mut follow: Vec<BTreeSet<SymbolId>> = vec![BTreeSet::new(); symbol_count];

    for terminal in 0..terminal_count {
        first[terminal as usize].insert(terminal);
    }

    // Nullable and FIRST to fixed point.
    loop {
        let mut changed = false;
        for production in productions {
            let lhs = production.lhs as usize;

            let mut all_nullable = true;
            for &sym in &production.rhs {
                let additions: Vec<SymbolId> =
                    first[sym as usize].difference(&first[lhs]).copied().collect();
                if !additions.is_empty() {
                    first[lhs].extend(additions);
                    changed = true;
                }
                if !nullable[sym as usize] {
                    all_nullable = false;
                    break;
                }
            }
            if all_nullable && !nullable[lhs] {
                nullable[lhs] = true;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    follow[augmented as usize].insert(END_SYMBOL);

    // FOLLOW to fixed point.
    loop {
        let mut changed = false;
        for production in productions {
            let lhs = production.lhs as usize;
            for (i, &sym) in production.rhs.iter().enumerate() {
                if sym < terminal_count {
                    continue;
                }
                let sym = sym as usize;

                // FIRST of everything after the occurrence.
                let mut rest_nullable = true;
                let mut additions: BTreeSet<SymbolId> = BTreeSet::new();
                for &after in &production.rhs[i + 1..] {
                    additions.extend(first[after as usize].iter().copied());
                    if !nullable[after as usize] {
                        rest_nullable = false;
                        break;
                    }
                }
                if rest_nullable {
                    additions.extend(follow[lhs].iter().copied());
                }

                let new: Vec<SymbolId> =
                    additions.difference(&follow[sym]).copied().collect();
                if !new.is_empty() {
                    follow[sym].extend(new);
                    changed = true;
                }
            }
        }
        if !changed {
            return Analysis {
                nullable,
                first,
                follow,
            };
        }
    }
}
