use std::fmt::Write as _;

use crate::assignment::AssignmentMap;
use crate::literal::Literal;

/// A (possibly partial) valuation: `values[v - 1]` is the truth of variable
/// `v`, or `None` if `v` was never decided. A satisfied query does not imply
/// every variable is assigned — `nsat_clauses == num_clauses` (§4.4.8) can
/// hold with free variables still on the board.
pub type Valuation = Vec<Option<bool>>;

/// The verdict produced by a completed or timed-out [`query`](crate::SolverCore::query).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SatResult {
    Satisfiable(Valuation),
    Unsatisfiable,
    Undefined,
}

impl SatResult {
    pub fn is_satisfiable(&self) -> bool {
        matches!(self, SatResult::Satisfiable(_))
    }

    pub fn is_unsatisfiable(&self) -> bool {
        matches!(self, SatResult::Unsatisfiable)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, SatResult::Undefined)
    }

    /// Reads a valuation out of a (fully or partially assigned) map,
    /// preserving unassigned variables as `None` rather than defaulting them.
    pub fn from_assignment(map: &AssignmentMap) -> Valuation {
        (1..=map.num_variables()).map(|v| map.entry(v).truth()).collect()
    }

    /// Renders the §6 solution output: a `c` header line, an `s cnf ...`
    /// status line, and one `v L` line per *assigned* variable — unassigned
    /// variables are omitted, not defaulted to false.
    pub fn to_dimacs(&self, num_variables: usize, num_clauses: usize) -> String {
        let mut out = String::new();
        match self {
            SatResult::Satisfiable(values) => {
                writeln!(out, "c SATISFIABLE").unwrap();
                writeln!(out, "s cnf 1 {} {}", num_variables, num_clauses).unwrap();
                for (index, value) in values.iter().enumerate() {
                    if let Some(value) = value {
                        let var = index + 1;
                        let lit = Literal::with_sign(var, *value);
                        writeln!(out, "v {}", lit).unwrap();
                    }
                }
            }
            SatResult::Unsatisfiable => {
                writeln!(out, "c UNSATISFIABLE").unwrap();
                writeln!(out, "s cnf -1 {} {}", num_variables, num_clauses).unwrap();
            }
            SatResult::Undefined => {
                writeln!(out, "c UNDEFINED").unwrap();
                writeln!(out, "s cnf 0 {} {}", num_variables, num_clauses).unwrap();
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn satisfiable_renders_one_v_line_per_assigned_variable() {
        let result = SatResult::Satisfiable(vec![Some(true), Some(false)]);
        let text = result.to_dimacs(2, 3);
        assert!(text.contains("c SATISFIABLE"));
        assert!(text.contains("s cnf 1 2 3"));
        assert!(text.contains("v 1\n"));
        assert!(text.contains("v -2\n"));
    }

    #[test]
    fn unassigned_variables_are_omitted() {
        let result = SatResult::Satisfiable(vec![Some(true), None]);
        let text = result.to_dimacs(2, 1);
        assert!(text.contains("v 1\n"));
        assert!(!text.contains("v 2\n"));
        assert!(!text.contains("v -2\n"));
    }

    #[test]
    fn unsatisfiable_has_no_v_lines() {
        let text = SatResult::Unsatisfiable.to_dimacs(2, 3);
        assert!(text.contains("s cnf -1 2 3"));
        assert!(!text.contains('v'));
    }
}
