use std::time::{Duration, Instant};

use log::{debug, trace};

use crate::assignment::AssignmentMap;
use crate::error::SolverError;
use crate::formula::Formula;
use crate::literal::Literal;
use crate::propagate::{PropagateOutcome, PropagationContext, Propagator};
use crate::solution::SatResult;

#[derive(Debug, Clone, Copy)]
struct DecisionFrame {
    literal: Literal,
    is_flip: bool,
}

/// Why the current attempt ended, mirroring `apply`'s `{+1, -1, 0}` but kept
/// as an enum internally; `None` means the search is still open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Satisfied,
    Unsatisfiable,
    Undefined,
}

/// The shared DPLL search loop (§4.2), generic over a propagation strategy.
/// Holds the decision stack, propagation stack, and Assignment Map;
/// `Propagator` implementations never see these directly, only through
/// [`PropagationContext`] (§9: composition, not inheritance).
pub struct SolverCore<P: Propagator> {
    formula: Formula,
    assignment: AssignmentMap,
    decisions: Vec<DecisionFrame>,
    propagations: Vec<(Literal, i64)>,
    propagator: P,
    conflicting: bool,
    started: bool,
    verdict: Option<Verdict>,
    max_time: Option<Duration>,
    start_time: Option<Instant>,
    timed_out: bool,
}

impl<P: Propagator> SolverCore<P> {
    pub fn new(formula: Formula) -> SolverCore<P> {
        let assignment = AssignmentMap::new(formula.num_variables());
        let propagator = P::new(&formula);
        SolverCore {
            formula,
            assignment,
            decisions: Vec::new(),
            propagations: Vec::new(),
            propagator,
            conflicting: false,
            started: false,
            verdict: None,
            max_time: None,
            start_time: None,
            timed_out: false,
        }
    }

    pub fn formula(&self) -> &Formula {
        &self.formula
    }

    pub fn assignment(&self) -> &AssignmentMap {
        &self.assignment
    }

    /// Fixes the deadline before `start` (§4.2 "Time handling").
    pub fn set_max_time(&mut self, secs: f64) {
        self.max_time = Some(Duration::from_secs_f64(secs));
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.map(|t| t.elapsed()).unwrap_or_default()
    }

    pub fn has_timeout(&self) -> bool {
        self.timed_out
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_finished(&self) -> bool {
        self.verdict.is_some()
    }

    pub fn is_satisfied(&self) -> bool {
        self.verdict == Some(Verdict::Satisfied)
    }

    pub fn is_conflicting(&self) -> bool {
        self.conflicting
    }

    fn intime(&mut self) -> bool {
        if self.timed_out {
            return false;
        }
        if let (Some(max_time), Some(start_time)) = (self.max_time, self.start_time) {
            if start_time.elapsed() > max_time {
                self.timed_out = true;
                return false;
            }
        }
        true
    }

    /// The absolute deadline handed to a [`PropagationContext`] so every
    /// forced push inside a propagator sweep can check it too, not just the
    /// per-`step()` call to `intime()`.
    fn deadline(&self) -> Option<Instant> {
        match (self.max_time, self.start_time) {
            (Some(max_time), Some(start_time)) => Some(start_time + max_time),
            _ => None,
        }
    }

    /// The signed decision level (§3's `time`): positive depth for a
    /// fresh branch, negative depth once the topmost decision has been
    /// flipped, `0` with an empty decision stack. §8 property 6 requires
    /// this sign to always track the topmost decision's flip state.
    pub fn current_level(&self) -> i64 {
        self.current_signed_level()
    }

    /// The topmost decision's literal and whether it is a flip, if any.
    pub fn top_decision(&self) -> Option<(Literal, bool)> {
        self.decisions.last().map(|frame| (frame.literal, frame.is_flip))
    }

    /// §8 property 4's watch-list half: delegates to the propagator, which
    /// alone knows its own watch bookkeeping.
    pub fn check_watch_invariant(&self) -> bool {
        self.propagator.check_watch_invariant(&self.formula, &self.assignment)
    }

    fn current_signed_level(&self) -> i64 {
        match self.decisions.last() {
            None => 0,
            Some(frame) => {
                let depth = self.decisions.len() as i64;
                if frame.is_flip {
                    -depth
                } else {
                    depth
                }
            }
        }
    }

    /// `apply()`: evaluate the current (possibly partial) assignment, no
    /// propagation. `+1` all clauses satisfied, `-1` some clause falsified,
    /// `0` otherwise.
    pub fn apply(&self) -> i32 {
        let mut all_satisfied = true;
        for clause in self.formula.clauses() {
            let mut satisfied = false;
            let mut falsified = true;
            for &lit in &clause.literals {
                match self.assignment.truth_of(lit) {
                    Some(true) => {
                        satisfied = true;
                        falsified = false;
                        break;
                    }
                    Some(false) => {}
                    None => falsified = false,
                }
            }
            if falsified {
                return -1;
            }
            if !satisfied {
                all_satisfied = false;
            }
        }
        if all_satisfied {
            1
        } else {
            0
        }
    }

    fn finish(&mut self, verdict: Option<Verdict>) {
        self.verdict = verdict;
    }

    fn assign_and_notify(&mut self, literal: Literal) -> Result<(), SolverError> {
        let level = self.current_signed_level();
        self.assignment.assign(literal, level);
        trace!("push {} at level {}", literal, level);
        if !self.intime() {
            return Ok(());
        }
        let mut conflict = false;
        let deadline = self.deadline();
        {
            let SolverCore {
                formula,
                assignment,
                propagations,
                propagator,
                timed_out,
                ..
            } = self;
            let mut ctx = PropagationContext::new(assignment, propagations, level, &mut conflict, deadline, timed_out);
            propagator.on_assign(formula, &mut ctx, literal)?;
        }
        if conflict {
            self.conflicting = true;
        }
        Ok(())
    }

    /// `push(literal, is_decision)` (§4.2). `is_flip` is only meaningful
    /// when pushing a decision.
    fn push_decision(&mut self, literal: Literal, is_flip: bool) -> Result<(), SolverError> {
        self.decisions.push(DecisionFrame { literal, is_flip });
        self.assign_and_notify(literal)
    }

    /// `pop()` (§4.2). Returns the inverted literal of the topmost unflipped
    /// decision, or `None` if the decision stack holds only flips (search
    /// exhausted).
    fn pop(&mut self) -> Option<Literal> {
        if self.decisions.is_empty() {
            return None;
        }
        let mut popped = Vec::new();
        let mut inverted = None;
        let mut target_level = None;
        while let Some(frame) = self.decisions.pop() {
            self.assignment.unassign(frame.literal.var());
            popped.push(frame.literal);
            if !frame.is_flip {
                target_level = Some(self.decisions.len() as i64 + 1);
                inverted = Some(-frame.literal);
                break;
            }
        }
        // Every propagation recorded at a level above 0 belongs to a
        // decision frame that either got unwound above (target_level
        // found) or no longer exists at all (full exhaustion, no unflipped
        // decision left) — either way it must go too. Level-0 propagations
        // have no enclosing decision frame and are left untouched.
        let threshold = target_level.unwrap_or(1);
        while let Some(&(lit, lvl)) = self.propagations.last() {
            if lvl.abs() >= threshold {
                self.propagations.pop();
                self.assignment.unassign(lit.var());
                popped.push(lit);
            } else {
                break;
            }
        }
        let new_level = self.current_signed_level();
        for &lit in &popped {
            trace!("pop {} (new level {})", lit, new_level);
            self.propagator.on_unassign(&self.formula, &self.assignment, lit, new_level);
        }
        self.conflicting = false;
        inverted
    }

    /// `backtrack()` (§4.2): pop to the last unflipped decision and push its
    /// negation as a flip. Returns `Ok(false)` when the search space is
    /// exhausted (report UNSAT).
    fn backtrack(&mut self) -> Result<bool, SolverError> {
        if !self.intime() {
            return Ok(false);
        }
        match self.pop() {
            Some(inverted) => {
                debug!("backtrack: flipping to {}", inverted);
                // Re-open the search before the flip push so the push's
                // side effects run in a "not yet finished" state.
                self.finish(None);
                self.push_decision(inverted, true)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// `decide()` (§4.2): the first unassigned variable in the formula's
    /// `order`, pushed as a fresh decision. Falls back to `backtrack` when
    /// no free variable remains.
    fn decide(&mut self) -> Result<bool, SolverError> {
        if !self.intime() {
            return Ok(false);
        }
        let next = self
            .formula
            .order()
            .iter()
            .copied()
            .find(|lit| !self.assignment.is_assigned(lit.var()));
        match next {
            Some(literal) => {
                debug!("decide {}", literal);
                self.push_decision(literal, false)?;
                Ok(true)
            }
            None => self.backtrack(),
        }
    }

    fn propagate_once(&mut self) -> Result<PropagateOutcome, SolverError> {
        if self.conflicting {
            return Ok(PropagateOutcome::Conflict);
        }
        let level = self.current_signed_level();
        let mut conflict = false;
        let deadline = self.deadline();
        let outcome = {
            let SolverCore {
                formula,
                assignment,
                propagations,
                propagator,
                timed_out,
                ..
            } = self;
            let mut ctx = PropagationContext::new(assignment, propagations, level, &mut conflict, deadline, timed_out);
            propagator.propagate(formula, &mut ctx)?
        };
        if conflict {
            self.conflicting = true;
        }
        Ok(if self.conflicting { PropagateOutcome::Conflict } else { outcome })
    }

    /// Runs exactly one state-machine transition of `query`'s loop (§4.2):
    /// one `propagate`, then a `decide`/`backtrack` as needed. Exposed
    /// (beyond `query`'s own use of it) so tests can drive the search one
    /// step at a time and assert invariants between steps.
    pub fn step(&mut self) -> Result<(), SolverError> {
        if !self.intime() {
            self.finish(Some(Verdict::Undefined));
            return Ok(());
        }
        match self.propagate_once()? {
            PropagateOutcome::Satisfied => self.finish(Some(Verdict::Satisfied)),
            PropagateOutcome::Conflict => {
                if !self.backtrack()? {
                    self.finish(Some(Verdict::Unsatisfiable));
                }
            }
            PropagateOutcome::Open => {
                if !self.decide()? {
                    self.finish(Some(Verdict::Unsatisfiable));
                }
            }
        }
        Ok(())
    }

    fn start(&mut self) {
        self.started = true;
        self.start_time = Some(Instant::now());
    }

    /// `query()`: run the search loop to a verdict (satisfied, conflicting
    /// exhaustion, or timeout). Idempotent once finished.
    pub fn query(&mut self) -> Result<SatResult, SolverError> {
        if !self.formula.is_valid() {
            return Ok(SatResult::Undefined);
        }
        if !self.started {
            self.start();
        }
        while self.started && !self.is_finished() {
            self.step()?;
        }
        Ok(match self.verdict {
            Some(Verdict::Satisfied) => SatResult::Satisfiable(SatResult::from_assignment(&self.assignment)),
            Some(Verdict::Unsatisfiable) => SatResult::Unsatisfiable,
            Some(Verdict::Undefined) | None => SatResult::Undefined,
        })
    }

    /// Discards all search state, allowing the same `SolverCore` to be
    /// reused (fresh `start`/`query`) over the same formula.
    pub fn clear(&mut self) {
        self.assignment.clear();
        self.decisions.clear();
        self.propagations.clear();
        self.propagator = P::new(&self.formula);
        self.conflicting = false;
        self.started = false;
        self.verdict = None;
        self.start_time = None;
        self.timed_out = false;
    }
}
