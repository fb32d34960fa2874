use super::*;

fn sample_state() -> ParseState {
    ParseState {
        actions: vec![
            (0, ActionSet::new(vec![Action::Accept])),
            (1, ActionSet::new(vec![Action::Shift { state: 2 }])),
            (
                3,
                ActionSet::new(vec![
                    Action::Shift { state: 4 },
                    Action::Reduce { production: 1 },
                ]),
            ),
        ],
        gotos: vec![(5, 1), (6, 3)],
    }
}

#[test]
fn action_lookup_is_by_symbol() {
    let state = sample_state();

    assert_eq!(state.action(0).unwrap().single(), Some(Action::Accept));
    assert_eq!(
        state.action(1).unwrap().single(),
        Some(Action::Shift { state: 2 })
    );
    assert!(state.action(2).is_none());
}

#[test]
fn conflict_cells_have_no_single_action() {
    let state = sample_state();

    let set = state.action(3).unwrap();
    assert_eq!(set.len(), 2);
    assert!(set.single().is_none());
    assert!(state.has_conflicts());
}

#[test]
fn goto_lookup() {
    let state = sample_state();

    assert_eq!(state.goto(5), Some(1));
    assert_eq!(state.goto(6), Some(3));
    assert_eq!(state.goto(7), None);
}

#[test]
fn valid_terminals_come_back_sorted() {
    let state = sample_state();
    let valid: Vec<_> = state.valid_terminals().collect();
    assert_eq!(valid, vec![0, 1, 3]);
}

#[test]
fn deterministic_state_reports_no_conflicts() {
    let state = ParseState {
        actions: vec![(1, ActionSet::new(vec![Action::Shift { state: 1 }]))],
        gotos: vec![],
    };
    assert!(!state.has_conflicts());
}
