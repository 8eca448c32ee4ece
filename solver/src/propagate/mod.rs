//! The two propagation strategies `SolverCore` is generic over (§4.3, §4.4).

mod simple;
mod watched;

pub use simple::SimplePropagator;
pub use watched::WatchedPropagator;

use std::time::Instant;

use crate::assignment::AssignmentMap;
use crate::error::SolverError;
use crate::formula::{Clause, Formula};
use crate::literal::Literal;

pub(crate) enum ClauseStatus {
    Satisfied,
    Falsified,
    Unit(Literal),
    Open,
}

/// Shared by both propagators: classifies a clause under the current
/// assignment (§4.3). A clause is unit only when *exactly one* literal is
/// unassigned and every other literal is false (§4.3's stricter branch).
pub(crate) fn evaluate_clause(clause: &Clause, assignment: &AssignmentMap) -> ClauseStatus {
    let mut unassigned = None;
    let mut unassigned_count = 0usize;
    for &lit in &clause.literals {
        match assignment.truth_of(lit) {
            Some(true) => return ClauseStatus::Satisfied,
            Some(false) => {}
            None => {
                unassigned_count += 1;
                unassigned = Some(lit);
            }
        }
    }
    match unassigned_count {
        0 => ClauseStatus::Falsified,
        1 => ClauseStatus::Unit(unassigned.expect("counted exactly one unassigned literal")),
        _ => ClauseStatus::Open,
    }
}

/// Outcome of one `propagate` step of the search loop (§4.2's state
/// machine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropagateOutcome {
    Satisfied,
    Conflict,
    Open,
}

/// The mutable state a propagator is allowed to touch while reacting to a
/// push, handed down by `SolverCore` rather than accessed through a shared
/// owning reference (§9: "Cyclic references ... both owned by the Solver
/// Core").
pub struct PropagationContext<'a> {
    pub assignment: &'a mut AssignmentMap,
    pub propagation_stack: &'a mut Vec<(Literal, i64)>,
    pub level: i64,
    conflict: &'a mut bool,
    deadline: Option<Instant>,
    timed_out: &'a mut bool,
}

impl<'a> PropagationContext<'a> {
    pub fn new(
        assignment: &'a mut AssignmentMap,
        propagation_stack: &'a mut Vec<(Literal, i64)>,
        level: i64,
        conflict: &'a mut bool,
        deadline: Option<Instant>,
        timed_out: &'a mut bool,
    ) -> Self {
        PropagationContext {
            assignment,
            propagation_stack,
            level,
            conflict,
            deadline,
            timed_out,
        }
    }

    /// Assigns `literal` as a forced propagation at the context's current
    /// level and records it on the propagation stack. `intime()` is
    /// consulted on every push (§4.2), not just once per `step()` — this is
    /// what bounds a long propagator-internal cascade to `max_time`.
    pub fn push_propagation(&mut self, literal: Literal) {
        self.propagation_stack.push((literal, self.level));
        self.assignment.assign(literal, self.level);
        self.check_deadline();
    }

    fn check_deadline(&mut self) {
        if *self.timed_out {
            return;
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                *self.timed_out = true;
            }
        }
    }

    pub fn mark_conflict(&mut self) {
        *self.conflict = true;
    }

    pub fn is_conflicting(&self) -> bool {
        *self.conflict
    }

    /// Whether a propagator-internal sweep or cascade should keep pushing.
    /// Propagator loops check this after each push and bail out early,
    /// leaving the remaining work for `SolverCore::step`'s own `intime()`
    /// check on the next call, which reports `Undefined` immediately.
    pub fn is_timed_out(&self) -> bool {
        *self.timed_out
    }
}

/// A propagation strategy shared by the DPLL search loop in
/// [`crate::SolverCore`]. Implementations are composed, not subclassed
/// (§9): `SolverCore<P>` owns exactly one `P` and talks to it only through
/// this trait.
pub trait Propagator {
    fn new(formula: &Formula) -> Self
    where
        Self: Sized;

    /// Called once, synchronously, from `SolverCore::push` right after a
    /// literal's variable has been assigned (decision or propagation). May
    /// itself push further forced literals through `ctx` and recurse into
    /// its own trigger logic for them (§4.4.6); the simple propagator's
    /// implementation is a no-op.
    fn on_assign(
        &mut self,
        formula: &Formula,
        ctx: &mut PropagationContext,
        literal: Literal,
    ) -> Result<(), SolverError>;

    /// Called once per popped literal, in pop order, after the decision and
    /// propagation stacks have reached their final post-pop state (§4.4.7).
    fn on_unassign(&mut self, formula: &Formula, assignment: &AssignmentMap, literal: Literal, level: i64);

    /// The `propagate` step of the main loop (§4.3 / §4.4.3 / §4.4.8).
    fn propagate(
        &mut self,
        formula: &Formula,
        ctx: &mut PropagationContext,
    ) -> Result<PropagateOutcome, SolverError>;

    /// Number of clauses currently known satisfied (§3's `nsat_clauses`).
    fn num_satisfied(&self) -> usize;

    /// §8 property 4 (Literal invariants): for every clause, the literals it
    /// currently watches must in turn list that clause in their watch set.
    /// The simple propagator keeps no watches, so it is trivially `true`.
    fn check_watch_invariant(&self, formula: &Formula, assignment: &AssignmentMap) -> bool;
}
