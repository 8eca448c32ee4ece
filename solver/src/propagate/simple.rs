use crate::assignment::AssignmentMap;
use crate::error::SolverError;
use crate::formula::Formula;
use crate::literal::Literal;

use super::{evaluate_clause, ClauseStatus, PropagateOutcome, PropagationContext, Propagator};

/// Reference-oracle propagator (§4.3, §1): no incremental state at all, a
/// full clause-by-clause scan on every call to `propagate`. Deliberately
/// naive; exists so the watched variant's verdicts can be cross-checked
/// against it.
#[derive(Debug, Default)]
pub struct SimplePropagator;

impl Propagator for SimplePropagator {
    fn new(_formula: &Formula) -> Self {
        SimplePropagator
    }

    fn on_assign(
        &mut self,
        _formula: &Formula,
        _ctx: &mut PropagationContext,
        _literal: Literal,
    ) -> Result<(), SolverError> {
        Ok(())
    }

    fn on_unassign(&mut self, _formula: &Formula, _assignment: &AssignmentMap, _literal: Literal, _level: i64) {}

    fn propagate(
        &mut self,
        formula: &Formula,
        ctx: &mut PropagationContext,
    ) -> Result<PropagateOutcome, SolverError> {
        loop {
            let mut propagated = false;
            let mut all_satisfied = true;
            for clause in formula.clauses() {
                match evaluate_clause(clause, ctx.assignment) {
                    ClauseStatus::Satisfied => {}
                    ClauseStatus::Falsified => {
                        ctx.mark_conflict();
                        return Ok(PropagateOutcome::Conflict);
                    }
                    ClauseStatus::Unit(lit) => {
                        ctx.push_propagation(lit);
                        propagated = true;
                        all_satisfied = false;
                        if ctx.is_timed_out() {
                            return Ok(PropagateOutcome::Open);
                        }
                    }
                    ClauseStatus::Open => {
                        all_satisfied = false;
                    }
                }
            }
            if !propagated {
                return Ok(if all_satisfied {
                    PropagateOutcome::Satisfied
                } else {
                    PropagateOutcome::Open
                });
            }
        }
    }

    fn num_satisfied(&self) -> usize {
        // The simple propagator never caches this; `propagate` recomputes
        // satisfaction from scratch every time it is asked.
        0
    }

    fn check_watch_invariant(&self, _formula: &Formula, _assignment: &AssignmentMap) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::Formula;

    fn fresh_ctx<'a>(
        assignment: &'a mut AssignmentMap,
        stack: &'a mut Vec<(Literal, i64)>,
        conflict: &'a mut bool,
        timed_out: &'a mut bool,
    ) -> PropagationContext<'a> {
        PropagationContext::new(assignment, stack, 0, conflict, None, timed_out)
    }

    #[test]
    fn detects_unit_and_propagates_to_fixpoint() {
        let formula = Formula::from_dimacs("p cnf 2 2\n1 0\n-1 2 0\n").unwrap();
        let mut assignment = AssignmentMap::new(2);
        let mut stack = Vec::new();
        let mut conflict = false;
        let mut timed_out = false;
        let mut propagator = SimplePropagator::new(&formula);
        let outcome = propagator
            .propagate(&formula, &mut fresh_ctx(&mut assignment, &mut stack, &mut conflict, &mut timed_out))
            .unwrap();
        assert_eq!(outcome, PropagateOutcome::Satisfied);
        assert_eq!(assignment.truth_of(Literal::pos(1)), Some(true));
        assert_eq!(assignment.truth_of(Literal::pos(2)), Some(true));
    }

    #[test]
    fn detects_conflict() {
        let formula = Formula::from_dimacs("p cnf 1 2\n1 0\n-1 0\n").unwrap();
        let mut assignment = AssignmentMap::new(1);
        let mut stack = Vec::new();
        let mut conflict = false;
        let mut timed_out = false;
        let mut propagator = SimplePropagator::new(&formula);
        let outcome = propagator
            .propagate(&formula, &mut fresh_ctx(&mut assignment, &mut stack, &mut conflict, &mut timed_out))
            .unwrap();
        assert_eq!(outcome, PropagateOutcome::Conflict);
        assert!(conflict);
    }
}
