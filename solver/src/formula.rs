use std::fmt;
use std::io::{self, Write};

use thiserror::Error;

use crate::literal::{Literal, VarId};

/// A single disjunctive clause: at least one literal, duplicates and
/// tautologies accepted as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub literals: Vec<Literal>,
}

impl Clause {
    pub fn new(literals: Vec<Literal>) -> Clause {
        Clause { literals }
    }
}

/// Errors raised while loading a DIMACS CNF stream.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormulaError {
    #[error("input does not contain a `p cnf N M` problem line")]
    MissingProblemLine,

    #[error("malformed problem line: {0:?}")]
    MalformedProblemLine(String),

    #[error("literal {literal} out of range for {num_variables} variable(s)")]
    LiteralOutOfRange { literal: i32, num_variables: usize },

    #[error("clause {clause_index} is empty")]
    EmptyClause { clause_index: usize },

    #[error("clause count mismatch: header declared {expected}, input had {found}")]
    ClauseCountMismatch { expected: usize, found: usize },
}

/// A CNF formula: `num_variables` variables, a clause list, and the derived
/// statistics (`freq`, decision `order`) described in the data model.
#[derive(Debug, Clone)]
pub struct Formula {
    num_variables: usize,
    clauses: Vec<Clause>,
    pos_freq: Vec<usize>,
    neg_freq: Vec<usize>,
    order: Vec<Literal>,
}

impl Formula {
    /// Builds a formula directly from clauses, computing `freq`/`order`.
    ///
    /// Does not validate literal ranges; callers assembling a formula by hand
    /// (as opposed to via [`Formula::from_dimacs`]) are responsible for
    /// satisfying `1 <= |l| <= num_variables` for every literal.
    pub fn new(num_variables: usize, clauses: Vec<Clause>) -> Formula {
        let mut pos_freq = vec![0usize; num_variables + 1];
        let mut neg_freq = vec![0usize; num_variables + 1];
        for clause in &clauses {
            for lit in &clause.literals {
                if lit.is_positive() {
                    pos_freq[lit.var()] += 1;
                } else {
                    neg_freq[lit.var()] += 1;
                }
            }
        }
        let order = compute_order(num_variables, &pos_freq, &neg_freq);
        Formula {
            num_variables,
            clauses,
            pos_freq,
            neg_freq,
            order,
        }
    }

    pub fn num_variables(&self) -> usize {
        self.num_variables
    }

    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn clause(&self, index: usize) -> &Clause {
        &self.clauses[index]
    }

    /// Decision order: variables in strictly decreasing `total(v)`, ties
    /// broken by smaller variable index, each entry signed by majority
    /// polarity (positive on a tie).
    pub fn order(&self) -> &[Literal] {
        &self.order
    }

    /// Number of occurrences of the signed literal `l` across all clauses.
    pub fn freq(&self, lit: Literal) -> usize {
        if lit.is_positive() {
            self.pos_freq[lit.var()]
        } else {
            self.neg_freq[lit.var()]
        }
    }

    /// `freq(v) + freq(-v)`.
    pub fn total(&self, var: VarId) -> usize {
        self.pos_freq[var] + self.neg_freq[var]
    }

    /// A formula is only meaningful to search over when it declares at least
    /// one variable and one clause (§7: "Invalid formula ... solver refuses
    /// to start").
    pub fn is_valid(&self) -> bool {
        self.num_variables > 0 && !self.clauses.is_empty()
    }

    /// Parses a DIMACS CNF stream per §4.1 / §6: `c` comments and blank
    /// lines tolerated anywhere, one `p cnf N M` header required before any
    /// clause line, and any other unrecognized line tolerated once the
    /// header has been seen.
    pub fn from_dimacs(input: &str) -> Result<Formula, FormulaError> {
        let mut num_variables = None;
        let mut num_clauses_declared = None;
        let mut clauses = Vec::new();

        for raw_line in input.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('c') {
                continue;
            }
            if let Some(rest) = line.strip_prefix('p') {
                let (n, m) = parse_problem_line(rest)
                    .ok_or_else(|| FormulaError::MalformedProblemLine(raw_line.to_string()))?;
                num_variables = Some(n);
                num_clauses_declared = Some(m);
                continue;
            }
            let n = match num_variables {
                Some(n) => n,
                None => {
                    // Before the header, unparsable lines are tolerated; a
                    // line of bare literals before `p cnf` is ambiguous
                    // enough that treating it as "not yet reached the
                    // header" matches the tolerant-parser mandate.
                    if parse_literal_line(line).is_none() {
                        continue;
                    }
                    return Err(FormulaError::MissingProblemLine);
                }
            };

            let literals = match parse_literal_line(line) {
                Some(literals) => literals,
                None => continue,
            };
            if literals.is_empty() {
                return Err(FormulaError::EmptyClause {
                    clause_index: clauses.len(),
                });
            }
            for &lit in &literals {
                let magnitude = lit.to_i32().unsigned_abs() as usize;
                if magnitude == 0 || magnitude > n {
                    return Err(FormulaError::LiteralOutOfRange {
                        literal: lit.to_i32(),
                        num_variables: n,
                    });
                }
            }
            clauses.push(Clause::new(literals));
        }

        let num_variables = num_variables.ok_or(FormulaError::MissingProblemLine)?;
        let declared = num_clauses_declared.unwrap_or(0);
        if clauses.len() != declared {
            return Err(FormulaError::ClauseCountMismatch {
                expected: declared,
                found: clauses.len(),
            });
        }

        Ok(Formula::new(num_variables, clauses))
    }

    /// Renders the formula back out as a DIMACS CNF stream (used by
    /// `-f`/`--print-formula`, and for round-tripping in tests).
    pub fn write_dimacs<W: Write>(&self, mut out: W) -> io::Result<()> {
        writeln!(out, "p cnf {} {}", self.num_variables, self.clauses.len())?;
        for clause in &self.clauses {
            let rendered: Vec<String> = clause.literals.iter().map(|l| l.to_string()).collect();
            writeln!(out, "{} 0", rendered.join(" "))?;
        }
        Ok(())
    }
}

fn parse_problem_line(rest: &str) -> Option<(usize, usize)> {
    let mut parts = rest.split_whitespace();
    if parts.next()? != "cnf" {
        return None;
    }
    let n: usize = parts.next()?.parse().ok()?;
    let m: usize = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((n, m))
}

fn parse_literal_line(line: &str) -> Option<Vec<Literal>> {
    let mut values = Vec::new();
    for token in line.split_whitespace() {
        let v: i32 = token.parse().ok()?;
        if v == 0 {
            return Some(values);
        }
        values.push(Literal::new(v));
    }
    // A clause line not terminated by `0` is not a clause line at all by our
    // tolerant grammar; callers treat a `None` as "ignore this line".
    None
}

fn compute_order(num_variables: usize, pos_freq: &[usize], neg_freq: &[usize]) -> Vec<Literal> {
    let mut vars: Vec<VarId> = (1..=num_variables).collect();
    vars.sort_by(|&a, &b| {
        let total_a = pos_freq[a] + neg_freq[a];
        let total_b = pos_freq[b] + neg_freq[b];
        total_b.cmp(&total_a).then(a.cmp(&b))
    });
    vars.into_iter()
        .map(|v| Literal::with_sign(v, pos_freq[v] >= neg_freq[v]))
        .collect()
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Vec::new();
        self.write_dimacs(&mut buf).map_err(|_| fmt::Error)?;
        f.write_str(&String::from_utf8_lossy(&buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lits(vs: &[i32]) -> Vec<Literal> {
        vs.iter().map(|&v| Literal::new(v)).collect()
    }

    #[test]
    fn parses_minimal_formula() {
        let formula = Formula::from_dimacs("p cnf 1 1\n1 0\n").unwrap();
        assert_eq!(formula.num_variables(), 1);
        assert_eq!(formula.num_clauses(), 1);
        assert_eq!(formula.clause(0).literals, lits(&[1]));
    }

    #[test]
    fn tolerates_comments_blank_lines_and_stray_trailing_lines() {
        let text = "c a comment\n\np cnf 2 1\nc another comment\n1 -2 0\nstray trailer\n";
        let formula = Formula::from_dimacs(text).unwrap();
        assert_eq!(formula.num_clauses(), 1);
    }

    #[test]
    fn missing_problem_line_is_an_error() {
        let err = Formula::from_dimacs("1 0\n").unwrap_err();
        assert_eq!(err, FormulaError::MissingProblemLine);
    }

    #[test]
    fn literal_out_of_range_is_an_error() {
        let err = Formula::from_dimacs("p cnf 1 1\n2 0\n").unwrap_err();
        assert_eq!(
            err,
            FormulaError::LiteralOutOfRange {
                literal: 2,
                num_variables: 1
            }
        );
    }

    #[test]
    fn empty_clause_is_an_error() {
        let err = Formula::from_dimacs("p cnf 1 1\n0\n").unwrap_err();
        assert_eq!(err, FormulaError::EmptyClause { clause_index: 0 });
    }

    #[test]
    fn clause_count_mismatch_is_an_error() {
        let err = Formula::from_dimacs("p cnf 1 2\n1 0\n").unwrap_err();
        assert_eq!(
            err,
            FormulaError::ClauseCountMismatch {
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn order_is_descending_total_ties_by_smaller_index() {
        // var 1 appears 3 times, var 2 appears 3 times, var 3 appears once.
        let formula = Formula::from_dimacs("p cnf 3 3\n1 2 0\n1 -2 0\n-1 3 0\n").unwrap();
        let order: Vec<VarId> = formula.order().iter().map(|l| l.var()).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn order_polarity_favors_majority_and_positive_on_tie() {
        let formula = Formula::from_dimacs("p cnf 1 2\n1 0\n-1 0\n").unwrap();
        assert_eq!(formula.order()[0], Literal::pos(1));
    }
}
