//! LR(0) item-set construction.
//!
//! States are closures of item kernels; transitions advance the dot.
//! Iteration is over ordered containers throughout, so state numbering is
//! deterministic for a given grammar: repeated compilation yields
//! byte-identical tables.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use canopy_tables::{Production, StateId, SymbolId};

/// A dotted production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct Item {
    pub production: u32,
    pub dot: u16,
}

impl Item {
    /// The symbol after the dot, if any.
    pub fn next_symbol(&self, productions: &[Production]) -> Option<SymbolId> {
        productions[self.production as usize]
            .rhs
            .get(self.dot as usize)
            .copied()
    }

    pub fn advanced(&self) -> Item {
        Item {
            production: self.production,
            dot: self.dot + 1,
        }
    }
}

#[derive(Debug)]
pub(crate) struct StateData {
    /// Full closure, sorted.
    pub items: Vec<Item>,
    pub transitions: BTreeMap<SymbolId, StateId>,
}

#[derive(Debug)]
pub(crate) struct Automaton {
    pub states: Vec<StateData>,
}

/// Build the canonical LR(0) collection. State 0 is the closure of the
/// augmented start item.
pub(crate) fn build_states(productions: &[Production], terminal_count: u16) -> Automaton {
    // Productions grouped by lhs for closure expansion.
    let mut by_lhs: HashMap<SymbolId, Vec<u32>> = HashMap::new();
    for (id, production) in productions.iter().enumerate() {
        by_lhs.entry(production.lhs).or_default().push(id as u32);
    }

    let closure = |kernel: BTreeSet<Item>| -> Vec<Item> {
        let mut set = kernel;
        let mut work: Vec<Item> = set.iter().copied().collect();
        while let Some(item) = work.pop() {
            let Some(next) = item.next_symbol(productions) else {
                continue;
            };
            if next < terminal_count {
                continue;
            }
            for &production in by_lhs.get(&next).map(|v| v.as_slice()).unwrap_or(&[]) {
                let added = Item { production, dot: 0 };
                if set.insert(added) {
                    work.push(added);
                }
            }
        }
        set.into_iter().collect()
    };

    let start_items = closure(BTreeSet::from([Item {
        production: 0,
        dot: 0,
    }]));

    let mut states = vec![StateData {
        items: start_items.clone(),
        transitions: BTreeMap::new(),
    }];
    let mut ids: HashMap<Vec<Item>, StateId> = HashMap::from([(start_items, 0)]);
    let mut work: Vec<StateId> = vec![0];

    while let Some(state_id) = work.pop() {
        // Kernel of each successor, grouped by the transition symbol.
        let mut successors: BTreeMap<SymbolId, BTreeSet<Item>> = BTreeMap::new();
        for item in &states[state_id as usize].items {
            if let Some(symbol) = item.next_symbol(productions) {
                successors.entry(symbol).or_default().insert(item.advanced());
            }
        }

        for (symbol, kernel) in successors {
            let items = closure(kernel);
            let target = match ids.get(&items) {
                Some(&existing) => existing,
                None => {
                    let new_id = states.len() as StateId;
                    ids.insert(items.clone(), new_id);
                    states.push(StateData {
                        items,
                        transitions: BTreeMap::new(),
                    });
                    work.push(new_id);
                    new_id
                }
            };
            states[state_id as usize].transitions.insert(symbol, target);
        }
    }

    Automaton { states }
}
