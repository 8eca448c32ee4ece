//! Literal end-to-end DIMACS scenarios from §8, run through both
//! propagation variants.

use solver::{Formula, SatResult, SimplePropagator, SolverCore, WatchedPropagator};

fn run_both(dimacs: &str) -> (SatResult, SatResult) {
    let formula = Formula::from_dimacs(dimacs).unwrap();
    let mut simple: SolverCore<SimplePropagator> = SolverCore::new(formula.clone());
    let mut watched: SolverCore<WatchedPropagator> = SolverCore::new(formula);
    (simple.query().unwrap(), watched.query().unwrap())
}

#[test]
fn scenario_a_single_unit_clause() {
    let (simple, watched) = run_both("p cnf 1 1\n1 0\n");
    for result in [simple, watched] {
        match result {
            SatResult::Satisfiable(values) => assert_eq!(values, vec![Some(true)]),
            other => panic!("expected SAT, got {:?}", other),
        }
    }
}

#[test]
fn scenario_b_contradictory_units() {
    let (simple, watched) = run_both("p cnf 1 2\n1 0\n-1 0\n");
    assert!(simple.is_unsatisfiable());
    assert!(watched.is_unsatisfiable());
}

#[test]
fn scenario_c_three_variable_chain_is_satisfiable() {
    let (simple, watched) = run_both("p cnf 3 3\n1 2 0\n-1 3 0\n-2 -3 0\n");
    assert!(simple.is_satisfiable());
    assert!(watched.is_satisfiable());
}

#[test]
fn scenario_d_xor_encoding_is_unsatisfiable() {
    let (simple, watched) = run_both("p cnf 3 4\n1 2 0\n-1 2 0\n1 -2 0\n-1 -2 0\n");
    assert!(simple.is_unsatisfiable());
    assert!(watched.is_unsatisfiable());
}

#[test]
fn scenario_e_two_independent_clauses_are_satisfiable() {
    let (simple, watched) = run_both("p cnf 4 4\n1 2 0\n3 4 0\n-1 -3 0\n-2 -4 0\n");
    assert!(simple.is_satisfiable());
    assert!(watched.is_satisfiable());
}

fn pigeonhole(pigeons: usize, holes: usize) -> String {
    let var = |p: usize, h: usize| -> i32 { (p * holes + h + 1) as i32 };
    let mut clauses = Vec::new();
    for p in 0..pigeons {
        let clause: Vec<String> = (0..holes).map(|h| var(p, h).to_string()).collect();
        clauses.push(format!("{} 0", clause.join(" ")));
    }
    for h in 0..holes {
        for p1 in 0..pigeons {
            for p2 in (p1 + 1)..pigeons {
                clauses.push(format!("-{} -{} 0", var(p1, h), var(p2, h)));
            }
        }
    }
    format!("p cnf {} {}\n{}\n", pigeons * holes, clauses.len(), clauses.join("\n"))
}

#[test]
fn scenario_f_pigeonhole_three_into_two_is_unsatisfiable() {
    let dimacs = pigeonhole(3, 2);
    let (simple, watched) = run_both(&dimacs);
    assert!(simple.is_unsatisfiable());
    assert!(watched.is_unsatisfiable());

    // `apply` must prove at least one clause false for every possible
    // assignment to this formula, including the empty one.
    let formula = Formula::from_dimacs(&dimacs).unwrap();
    let mut solver: SolverCore<WatchedPropagator> = SolverCore::new(formula);
    assert_ne!(solver.apply(), 1);
    let _ = solver.query().unwrap();
    assert_eq!(solver.apply(), -1);
}
