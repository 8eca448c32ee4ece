use crate::assignment::{AssignmentMap, ClauseId};
use crate::error::SolverError;
use crate::formula::{Clause, Formula};
use crate::literal::Literal;

use super::{evaluate_clause, ClauseStatus, PropagateOutcome, PropagationContext, Propagator};

#[derive(Debug, Clone, Copy, Default)]
struct ClauseState {
    satisfied: bool,
    sat_time: i64,
    watches: [Option<Literal>; 2],
}

/// Two-watched-literals propagator (§4.4). Maintains, per clause, a pair of
/// watched literals and a satisfaction cache kept valid across backtracking
/// by `trigger`/`undo_trigger`; the search loop never rescans the whole
/// clause set once `registered` is true.
#[derive(Debug)]
pub struct WatchedPropagator {
    clause_states: Vec<ClauseState>,
    nsat_clauses: usize,
    registered: bool,
}

impl WatchedPropagator {
    fn is_time_valid(&self, recorded: i64, current_level: i64) -> bool {
        if recorded == 0 {
            // Established before any decision: an ancestor of every level.
            return true;
        }
        let same_sign = (recorded < 0) == (current_level < 0);
        same_sign && current_level.abs() >= recorded.abs()
    }

    fn mark_satisfied(&mut self, clause: ClauseId, time: i64) {
        let state = &mut self.clause_states[clause];
        if !state.satisfied {
            self.nsat_clauses += 1;
        }
        state.satisfied = true;
        state.sat_time = time;
    }

    fn unmark_satisfied(&mut self, clause: ClauseId) {
        let state = &mut self.clause_states[clause];
        if state.satisfied {
            self.nsat_clauses -= 1;
        }
        state.satisfied = false;
        state.sat_time = 0;
    }

    /// §4.4.4: among `clause`'s literals other than `known`, prefer two
    /// undefined literals, then an (undefined, true) pair, then two true
    /// literals. A watched literal is never currently false.
    fn find_watch_vars(
        &self,
        clause: &Clause,
        assignment: &AssignmentMap,
        known: Option<Literal>,
    ) -> (Option<Literal>, Option<Literal>) {
        let mut undefined = Vec::with_capacity(2);
        let mut true_lits = Vec::with_capacity(2);
        for &lit in &clause.literals {
            if Some(lit) == known {
                continue;
            }
            match assignment.truth_of(lit) {
                None => {
                    if undefined.len() < 2 {
                        undefined.push(lit);
                    }
                }
                Some(true) => {
                    if true_lits.len() < 2 {
                        true_lits.push(lit);
                    }
                }
                Some(false) => {}
            }
        }
        if undefined.len() >= 2 {
            (Some(undefined[0]), Some(undefined[1]))
        } else if !undefined.is_empty() && !true_lits.is_empty() {
            (Some(undefined[0]), Some(true_lits[0]))
        } else if true_lits.len() >= 2 {
            (Some(true_lits[0]), Some(true_lits[1]))
        } else if !undefined.is_empty() {
            (Some(undefined[0]), None)
        } else if !true_lits.is_empty() {
            (Some(true_lits[0]), None)
        } else {
            (None, None)
        }
    }

    /// §4.4.5.
    fn watch(
        &mut self,
        assignment: &mut AssignmentMap,
        clause: ClauseId,
        new_literal: Option<Literal>,
        subst_literal: Option<Literal>,
    ) -> Result<(), SolverError> {
        let watches = self.clause_states[clause].watches;
        if let Some(subst) = subst_literal {
            let slot = watches.iter().position(|w| *w == Some(subst)).ok_or_else(|| {
                SolverError::InternalInconsistency(format!(
                    "watch({}) on clause {} but {} is not currently watched",
                    subst, clause, subst
                ))
            })?;
            assignment.watch_set_mut(subst).retain(|&c| c != clause);
            self.clause_states[clause].watches[slot] = new_literal;
            if let Some(lit) = new_literal {
                assignment.watch_set_mut(lit).push(clause);
            }
            return Ok(());
        }
        if let Some(slot) = watches.iter().position(|w| w.is_none()) {
            self.clause_states[clause].watches[slot] = new_literal;
            if let Some(lit) = new_literal {
                assignment.watch_set_mut(lit).push(clause);
            }
            return Ok(());
        }
        // Both slots full and no substitution named: shift.
        if let Some(evicted) = watches[1] {
            assignment.watch_set_mut(evicted).retain(|&c| c != clause);
        }
        self.clause_states[clause].watches = [new_literal, watches[0]];
        if let Some(lit) = new_literal {
            assignment.watch_set_mut(lit).push(clause);
        }
        Ok(())
    }

    /// Fills in whichever watch slots `clause` is still missing, given the
    /// current assignment. Used both during initial registration and is
    /// safe to call repeatedly (idempotent once both slots are set).
    fn ensure_watches(
        &mut self,
        clause_id: ClauseId,
        clause: &Clause,
        assignment: &mut AssignmentMap,
    ) -> Result<(), SolverError> {
        let known = self.clause_states[clause_id].watches[0];
        if self.clause_states[clause_id].watches[1].is_some() {
            return Ok(());
        }
        let (first, second) = self.find_watch_vars(clause, assignment, known);
        if known.is_none() {
            if let Some(f) = first {
                self.watch(assignment, clause_id, Some(f), None)?;
            }
            if let Some(s) = second {
                self.watch(assignment, clause_id, Some(s), None)?;
            }
        } else if let Some(f) = first {
            self.watch(assignment, clause_id, Some(f), None)?;
        }
        Ok(())
    }

    /// §4.4.3: full sweep equivalent to the simple propagator, additionally
    /// installing watches as it goes.
    fn register(
        &mut self,
        formula: &Formula,
        ctx: &mut PropagationContext,
    ) -> Result<PropagateOutcome, SolverError> {
        loop {
            let mut propagated = false;
            let mut all_satisfied = true;
            for (idx, clause) in formula.clauses().iter().enumerate() {
                self.ensure_watches(idx, clause, ctx.assignment)?;
                match evaluate_clause(clause, ctx.assignment) {
                    ClauseStatus::Satisfied => self.mark_satisfied(idx, ctx.level),
                    ClauseStatus::Falsified => {
                        self.unmark_satisfied(idx);
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
                    ClauseStatus::Open => all_satisfied = false,
                }
            }
            if !propagated {
                self.registered = true;
                return Ok(if all_satisfied {
                    PropagateOutcome::Satisfied
                } else {
                    PropagateOutcome::Open
                });
            }
        }
    }

    /// §4.4.6, run after `literal`'s variable has been assigned.
    fn trigger(
        &mut self,
        formula: &Formula,
        ctx: &mut PropagationContext,
        literal: Literal,
    ) -> Result<(), SolverError> {
        let inv = -literal;

        // (a) True side: any clause watching `literal` is now satisfied.
        let true_side: Vec<ClauseId> = ctx.assignment.watch_set(literal).clone();
        for clause in true_side {
            let state = self.clause_states[clause];
            if !(state.satisfied && self.is_time_valid(state.sat_time, ctx.level)) {
                self.mark_satisfied(clause, ctx.level);
            }
        }

        // (b) False side: clauses watching `inv` may need a new watch.
        let mut index = 0usize;
        loop {
            let false_side: Vec<ClauseId> = ctx.assignment.watch_set(inv).clone();
            if index >= false_side.len() {
                break;
            }
            let clause_id = false_side[index];
            let watches = self.clause_states[clause_id].watches;
            let other = if watches[0] == Some(inv) {
                watches[1]
            } else if watches[1] == Some(inv) {
                watches[0]
            } else {
                return Err(SolverError::InternalInconsistency(format!(
                    "clause {} is in the watch set of {} but does not watch it",
                    clause_id, inv
                )));
            };

            let clause = formula.clause(clause_id);
            let (first, second) = self.find_watch_vars(clause, ctx.assignment, other);

            if let Some(candidate) = first {
                self.watch(ctx.assignment, clause_id, Some(candidate), Some(inv))?;
                if ctx.assignment.is_true(candidate) {
                    let other_time = other.map(|o| ctx.assignment.entry(o.var()).time()).unwrap_or(0);
                    self.mark_satisfied(clause_id, other_time);
                } else if second.is_none() {
                    if let Some(o) = other {
                        if ctx.assignment.is_false(o) {
                            self.unmark_satisfied(clause_id);
                            ctx.push_propagation(candidate);
                            if ctx.is_timed_out() {
                                return Ok(());
                            }
                            self.trigger(formula, ctx, candidate)?;
                        }
                    }
                }
                index = 0;
                continue;
            }

            match other {
                Some(o) if ctx.assignment.is_false(o) => {
                    self.unmark_satisfied(clause_id);
                    ctx.mark_conflict();
                    return Ok(());
                }
                Some(o) if ctx.assignment.is_true(o) => {
                    if !self.clause_states[clause_id].satisfied {
                        self.mark_satisfied(clause_id, ctx.assignment.entry(o.var()).time());
                    }
                }
                Some(o) => {
                    // `o` unassigned: unit.
                    self.unmark_satisfied(clause_id);
                    ctx.push_propagation(o);
                    if ctx.is_timed_out() {
                        return Ok(());
                    }
                    self.trigger(formula, ctx, o)?;
                    index = 0;
                    continue;
                }
                None => {
                    // Clause has no other literal to fall back on (a unit
                    // clause whose sole literal just became false).
                    self.unmark_satisfied(clause_id);
                    ctx.mark_conflict();
                    return Ok(());
                }
            }
            index += 1;
        }
        Ok(())
    }
}

impl Propagator for WatchedPropagator {
    fn new(formula: &Formula) -> Self {
        WatchedPropagator {
            clause_states: vec![ClauseState::default(); formula.num_clauses()],
            nsat_clauses: 0,
            registered: false,
        }
    }

    fn on_assign(
        &mut self,
        formula: &Formula,
        ctx: &mut PropagationContext,
        literal: Literal,
    ) -> Result<(), SolverError> {
        if !self.registered {
            // Registration hasn't run yet; it will pick this assignment up
            // on its own first full sweep.
            return Ok(());
        }
        self.trigger(formula, ctx, literal)
    }

    fn on_unassign(&mut self, _formula: &Formula, assignment: &AssignmentMap, literal: Literal, level: i64) {
        let inv = -literal;
        let mut clauses: Vec<ClauseId> = assignment.watch_set(literal).clone();
        clauses.extend(assignment.watch_set(inv).iter().copied());
        for clause in clauses {
            let state = self.clause_states[clause];
            if state.satisfied && !self.is_time_valid(state.sat_time, level) {
                self.unmark_satisfied(clause);
            }
        }
    }

    fn propagate(
        &mut self,
        formula: &Formula,
        ctx: &mut PropagationContext,
    ) -> Result<PropagateOutcome, SolverError> {
        if !self.registered {
            return self.register(formula, ctx);
        }
        if self.nsat_clauses == formula.num_clauses() {
            Ok(PropagateOutcome::Satisfied)
        } else if ctx.is_conflicting() {
            Ok(PropagateOutcome::Conflict)
        } else {
            Ok(PropagateOutcome::Open)
        }
    }

    fn num_satisfied(&self) -> usize {
        self.nsat_clauses
    }

    fn check_watch_invariant(&self, formula: &Formula, assignment: &AssignmentMap) -> bool {
        for (clause_id, state) in self.clause_states.iter().enumerate() {
            let clause = formula.clause(clause_id);
            for watch in state.watches.iter().flatten() {
                if !clause.literals.contains(watch) {
                    return false;
                }
                if !assignment.watch_set(*watch).contains(&clause_id) {
                    return false;
                }
            }
            if let (Some(a), Some(b)) = (state.watches[0], state.watches[1]) {
                if a == b {
                    return false;
                }
            }
        }
        true
    }
}
