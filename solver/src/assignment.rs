use crate::literal::{Literal, VarId};

pub type ClauseId = usize;

/// Per-variable bookkeeping: current truth value, the (signed) decision
/// level at which it was set, and the watch lists of clauses currently
/// watching `+v` / `-v` (populated by the watched propagator only; the
/// simple propagator never touches them).
#[derive(Debug, Clone, Default)]
pub struct AssignmentEntry {
    truth: Option<bool>,
    time: i64,
    pub true_clauses: Vec<ClauseId>,
    pub false_clauses: Vec<ClauseId>,
}

impl AssignmentEntry {
    pub fn truth(&self) -> Option<bool> {
        self.truth
    }

    pub fn time(&self) -> i64 {
        self.time
    }
}

/// Truth + timestamp storage for every variable, indexed `1..=num_variables`
/// (index `0` unused), plus the running count of assigned variables.
#[derive(Debug, Clone)]
pub struct AssignmentMap {
    entries: Vec<AssignmentEntry>,
    size: usize,
}

impl AssignmentMap {
    pub fn new(num_variables: usize) -> AssignmentMap {
        AssignmentMap {
            entries: vec![AssignmentEntry::default(); num_variables + 1],
            size: 0,
        }
    }

    pub fn num_variables(&self) -> usize {
        self.entries.len().saturating_sub(1)
    }

    /// Number of currently assigned variables.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn entry(&self, var: VarId) -> &AssignmentEntry {
        &self.entries[var]
    }

    pub fn entry_mut(&mut self, var: VarId) -> &mut AssignmentEntry {
        &mut self.entries[var]
    }

    pub fn is_assigned(&self, var: VarId) -> bool {
        self.entries[var].truth.is_some()
    }

    /// The truth value of `lit` under the current assignment: `Some(true)`
    /// if `lit` evaluates true, `Some(false)` if it evaluates false, `None`
    /// if its variable is unassigned.
    pub fn truth_of(&self, lit: Literal) -> Option<bool> {
        self.entries[lit.var()]
            .truth
            .map(|var_truth| var_truth == lit.is_positive())
    }

    pub fn is_true(&self, lit: Literal) -> bool {
        self.truth_of(lit) == Some(true)
    }

    pub fn is_false(&self, lit: Literal) -> bool {
        self.truth_of(lit) == Some(false)
    }

    /// Assigns `lit`'s variable so that `lit` evaluates true, stamping it
    /// with signed decision-level `time`.
    pub fn assign(&mut self, lit: Literal, time: i64) {
        let entry = &mut self.entries[lit.var()];
        debug_assert!(entry.truth.is_none(), "variable {} already assigned", lit.var());
        entry.truth = Some(lit.is_positive());
        entry.time = time;
        self.size += 1;
    }

    pub fn unassign(&mut self, var: VarId) {
        let entry = &mut self.entries[var];
        debug_assert!(entry.truth.is_some(), "variable {} already unassigned", var);
        entry.truth = None;
        entry.time = 0;
        self.size -= 1;
    }

    /// The watch list for literal `lit`: `true_clauses` of `lit`'s variable
    /// when `lit` is positive, `false_clauses` otherwise.
    pub fn watch_set(&self, lit: Literal) -> &Vec<ClauseId> {
        let entry = &self.entries[lit.var()];
        if lit.is_positive() {
            &entry.true_clauses
        } else {
            &entry.false_clauses
        }
    }

    pub fn watch_set_mut(&mut self, lit: Literal) -> &mut Vec<ClauseId> {
        let entry = &mut self.entries[lit.var()];
        if lit.is_positive() {
            &mut entry.true_clauses
        } else {
            &mut entry.false_clauses
        }
    }

    /// Resets every variable to unassigned and drops all watch-list entries.
    pub fn clear(&mut self) {
        for entry in &mut self.entries {
            *entry = AssignmentEntry::default();
        }
        self.size = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_and_truth_of_agree_on_polarity() {
        let mut map = AssignmentMap::new(2);
        map.assign(Literal::neg(1), -1);
        assert_eq!(map.truth_of(Literal::neg(1)), Some(true));
        assert_eq!(map.truth_of(Literal::pos(1)), Some(false));
        assert_eq!(map.truth_of(Literal::pos(2)), None);
        assert_eq!(map.size(), 1);
    }

    #[test]
    fn unassign_restores_unknown_and_decrements_size() {
        let mut map = AssignmentMap::new(1);
        map.assign(Literal::pos(1), 1);
        map.unassign(1);
        assert_eq!(map.truth_of(Literal::pos(1)), None);
        assert_eq!(map.size(), 0);
    }

    #[test]
    fn watch_set_selects_by_sign() {
        let mut map = AssignmentMap::new(1);
        map.watch_set_mut(Literal::pos(1)).push(7);
        map.watch_set_mut(Literal::neg(1)).push(9);
        assert_eq!(map.watch_set(Literal::pos(1)), &vec![7]);
        assert_eq!(map.watch_set(Literal::neg(1)), &vec![9]);
    }

    #[test]
    fn clear_resets_everything() {
        let mut map = AssignmentMap::new(1);
        map.assign(Literal::pos(1), 1);
        map.watch_set_mut(Literal::pos(1)).push(0);
        map.clear();
        assert_eq!(map.size(), 0);
        assert!(map.watch_set(Literal::pos(1)).is_empty());
    }
}
