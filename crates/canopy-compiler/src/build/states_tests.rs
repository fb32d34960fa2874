use canopy_tables::{Assoc, Production};

use super::states::{Item, build_states};

fn production(lhs: u16, rhs: Vec<u16>) -> Production {
    Production {
        lhs,
        rhs,
        prec: 0,
        assoc: Assoc::None,
        dynamic_prec: 0,
    }
}

/// Symbols: 0=end, 1=x (terminals); 2=S, 3=$start.
/// Productions: $start := S ; S := x ; S := S x
fn sample() -> Vec<Production> {
    vec![
        production(3, vec![2]),
        production(2, vec![1]),
        production(2, vec![2, 1]),
    ]
}

#[test]
fn start_state_closes_over_start_productions() {
    let automaton = build_states(&sample(), 2);

    let state0 = &automaton.states[0];
    assert!(state0.items.contains(&Item {
        production: 0,
        dot: 0
    }));
    assert!(state0.items.contains(&Item {
        production: 1,
        dot: 0
    }));
    assert!(state0.items.contains(&Item {
        production: 2,
        dot: 0
    }));
}

#[test]
fn transitions_cover_terminals_and_nonterminals() {
    let automaton = build_states(&sample(), 2);

    let state0 = &automaton.states[0];
    assert!(state0.transitions.contains_key(&1));
    assert!(state0.transitions.contains_key(&2));
}

#[test]
fn identical_kernels_share_a_state() {
    let automaton = build_states(&sample(), 2);

    // s0 --x--> {S := x·}, and that's the only state with that item.
    let with_completed: Vec<_> = automaton
        .states
        .iter()
        .filter(|s| {
            s.items.contains(&Item {
                production: 1,
                dot: 1,
            })
        })
        .collect();
    assert_eq!(with_completed.len(), 1);
}

#[test]
fn construction_is_deterministic() {
    let a = build_states(&sample(), 2);
    let b = build_states(&sample(), 2);

    assert_eq!(a.states.len(), b.states.len());
    for (sa, sb) in a.states.iter().zip(&b.states) {
        assert_eq!(sa.items, sb.items);
        assert_eq!(sa.transitions, sb.transitions);
    }
}
