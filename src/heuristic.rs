//! Two-sided Jeroslow-Wang decision heuristic.
//!
//! Every clause not yet satisfied contributes `2^-|C|` to each variable it mentions, once per
//! polarity present. The highest score wins; ties go to the lowest variable id.

use crate::assignment::AssignmentStore;
use crate::error::SolverError;
use crate::formula::{Clause, Formula, Literal, Variable};
use log::trace;

pub fn jeroslow_wang(formula: &Formula, assignment: &AssignmentStore) -> Result<Variable, SolverError> {
    let mut unassigned = assignment.unassigned_vars();
    let first = unassigned.next().ok_or(SolverError::HeuristicExhaustion)?;

    let active: Vec<&Clause> = formula.clauses().filter(|c| !assignment.is_satisfied(c)).collect();
    if active.is_empty() {
        // every clause already holds, any remaining variable will do
        return Ok(first);
    }

    let mut best = first;
    let mut best_score = score(first, &active);
    for variable in unassigned {
        let s = score(variable, &active);
        if s > best_score {
            best = variable;
            best_score = s;
        }
    }

    trace!("jeroslow-wang picked {} with score {}", best, best_score);
    Ok(best)
}

pub(crate) fn score(variable: Variable, active: &[&Clause]) -> f64 {
    let positive = Literal::Positive(variable);
    let negative = Literal::Negative(variable);
    active
        .iter()
        .map(|clause| {
            let weight = 0.5f64.powi(clause.len() as i32);
            let mut s = 0.0;
            if clause.contains(&positive) {
                s += weight;
            }
            if clause.contains(&negative) {
                s += weight;
            }
            s
        })
        .sum()
}
