//! A DPLL SAT solver engine: a chronological decision/backtrack search loop
//! shared by two propagation strategies — a two-watched-literals engine and
//! a clause-scanning reference oracle used to cross-check it.
//!
//! No conflict-driven clause learning, no restarts, no parallel search: the
//! search is plain DPLL, non-chronological only in the sense that a
//! conflict backtracks straight to the last unflipped decision.

mod assignment;
mod error;
mod formula;
mod literal;
mod propagate;
mod solution;
mod solver_core;

pub use assignment::{AssignmentEntry, AssignmentMap, ClauseId};
pub use error::SolverError;
pub use formula::{Clause, Formula, FormulaError};
pub use literal::{Literal, VarId};
pub use propagate::{PropagateOutcome, Propagator, SimplePropagator, WatchedPropagator};
pub use solution::{SatResult, Valuation};
pub use solver_core::SolverCore;
