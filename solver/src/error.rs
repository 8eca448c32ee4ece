use thiserror::Error;

/// Fatal, non-SAT/non-UNSAT/non-timeout outcomes. Raised when the watched
/// propagator trips an assertion it structurally cannot violate under
/// correct bookkeeping — a bug in the engine, not a user-facing condition.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SolverError {
    #[error("internal solver inconsistency: {0}")]
    InternalInconsistency(String),
}
