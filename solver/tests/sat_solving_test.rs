use proptest::prelude::*;

use solver::{Formula, SatResult, SimplePropagator, SolverCore, WatchedPropagator};

const MAX_NUM_VARIABLES: usize = 12;
const MAX_NUM_LITERALS: usize = 5;
const MAX_NUM_CLAUSES: usize = 8;

fn dimacs_of(num_variables: usize, clauses: &[Vec<i32>]) -> String {
    let mut text = format!("p cnf {} {}\n", num_variables, clauses.len());
    for clause in clauses {
        let rendered: Vec<String> = clause.iter().map(|l| l.to_string()).collect();
        text.push_str(&rendered.join(" "));
        text.push_str(" 0\n");
    }
    text
}

fn solve_simple(formula: &Formula) -> SatResult {
    let mut solver: SolverCore<SimplePropagator> = SolverCore::new(formula.clone());
    solver.query().unwrap()
}

fn solve_watched(formula: &Formula) -> SatResult {
    let mut solver: SolverCore<WatchedPropagator> = SolverCore::new(formula.clone());
    solver.query().unwrap()
}

/// Brute-force reference: tries every assignment of `num_variables`
/// variables and reports whether any one satisfies every clause.
fn brute_force_satisfiable(num_variables: usize, clauses: &[Vec<i32>]) -> bool {
    if num_variables == 0 {
        return clauses.is_empty();
    }
    for assignment in 0u64..(1u64 << num_variables) {
        let value = |var: i32| -> bool { (assignment >> (var - 1)) & 1 == 1 };
        let satisfied = clauses.iter().all(|clause| {
            clause.iter().any(|&lit| {
                if lit > 0 {
                    value(lit)
                } else {
                    !value(-lit)
                }
            })
        });
        if satisfied {
            return true;
        }
    }
    false
}

fn arb_clause(num_variables: usize) -> impl Strategy<Value = Vec<i32>> {
    prop::collection::vec(1..=(num_variables as i32), 1..=MAX_NUM_LITERALS.min(num_variables.max(1))).prop_map(
        move |vars| {
            vars.into_iter()
                .enumerate()
                .map(|(i, v)| if i % 2 == 0 { v } else { -v })
                .collect()
        },
    )
}

fn arb_formula() -> impl Strategy<Value = (usize, Vec<Vec<i32>>)> {
    (1..=MAX_NUM_VARIABLES).prop_flat_map(|num_variables| {
        prop::collection::vec(arb_clause(num_variables), 1..=MAX_NUM_CLAUSES)
            .prop_map(move |clauses| (num_variables, clauses))
    })
}

proptest! {
    /// Property 3 (§8): the two propagation variants must agree on
    /// satisfiable vs. unsatisfiable whenever both finish.
    #[test]
    fn variants_agree_on_verdict((num_variables, clauses) in arb_formula()) {
        let formula = Formula::from_dimacs(&dimacs_of(num_variables, &clauses)).unwrap();
        let simple = solve_simple(&formula);
        let watched = solve_watched(&formula);
        if !simple.is_undefined() && !watched.is_undefined() {
            prop_assert_eq!(simple.is_satisfiable(), watched.is_satisfiable());
        }
    }

    /// Property 1 (§8): a reported satisfiable result must check out under
    /// `apply()` on the returned assignment.
    #[test]
    fn satisfiable_verdict_is_sound((num_variables, clauses) in arb_formula()) {
        let formula = Formula::from_dimacs(&dimacs_of(num_variables, &clauses)).unwrap();
        let mut solver: SolverCore<WatchedPropagator> = SolverCore::new(formula);
        let result = solver.query().unwrap();
        if result.is_satisfiable() {
            prop_assert_eq!(solver.apply(), 1);
        }
    }

    /// Property 2 (§8): agreement with brute force on small instances.
    #[test]
    fn unsatisfiable_verdict_agrees_with_brute_force(
        (num_variables, clauses) in (1..=8usize).prop_flat_map(|n| {
            prop::collection::vec(arb_clause(n), 1..=MAX_NUM_CLAUSES).prop_map(move |c| (n, c))
        })
    ) {
        let formula = Formula::from_dimacs(&dimacs_of(num_variables, &clauses)).unwrap();
        let result = solve_watched(&formula);
        if !result.is_undefined() {
            prop_assert_eq!(result.is_satisfiable(), brute_force_satisfiable(num_variables, &clauses));
        }
    }
}

/// Properties 4 and 6 (§8): driven step by step across a real search (the
/// formula below forces at least one conflict and backtrack before it is
/// satisfied), the watch-list membership and the decision-level sign must
/// stay consistent at every intermediate state, not just at the end.
#[test]
fn watch_and_time_sign_invariants_hold_across_a_full_search() {
    let formula = Formula::from_dimacs("p cnf 2 2\n1 2 0\n-1 0\n").unwrap();
    let mut solver: SolverCore<WatchedPropagator> = SolverCore::new(formula);
    loop {
        solver.step().unwrap();

        match solver.top_decision() {
            None => assert_eq!(solver.current_level(), 0),
            Some((_, is_flip)) => {
                if is_flip {
                    assert!(solver.current_level() < 0);
                } else {
                    assert!(solver.current_level() > 0);
                }
            }
        }

        let assigned_count = (1..=solver.formula().num_variables())
            .filter(|&v| solver.assignment().entry(v).truth().is_some())
            .count();
        assert_eq!(assigned_count, solver.assignment().size());
        assert!(solver.check_watch_invariant());

        if solver.is_finished() {
            break;
        }
    }
    assert!(solver.is_satisfied());
}

#[test]
fn only_positive_unit_clauses_are_satisfiable_by_setting_them_all_true() {
    let clauses: Vec<Vec<i32>> = (1..=6).map(|v| vec![v]).collect();
    let formula = Formula::from_dimacs(&dimacs_of(6, &clauses)).unwrap();
    let result = solve_watched(&formula);
    match result {
        SatResult::Satisfiable(values) => assert!(values.iter().all(|&v| v == Some(true))),
        other => panic!("expected satisfiable, got {:?}", other),
    }
}
