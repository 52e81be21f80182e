//! DPLL satisfiability search that delegates unit propagation to an external oracle.
//!
//! The search driver picks decision variables with two-sided Jeroslow-Wang, sends each decision
//! to an [`Oracle`] as a text trigger, and backtracks on the conflicts it reports.

mod assignment;
mod error;
pub mod formula;
mod heuristic;
pub mod oracle;
pub mod protocol;
mod solver;
mod trace;

#[cfg(test)]
mod brute_force;

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum SatResult {
    Satisfiable,
    Unsatisfiable,
}

pub use assignment::{AssignmentStore, Model, Snapshot};
pub use error::{ProtocolError, SolverError};
pub use formula::{Clause, Formula, Literal, Variable};
pub use heuristic::jeroslow_wang;
pub use oracle::{CommandOracle, Oracle, UnitPropagator};
pub use solver::{SearchStats, SolveResult, Solver};
pub use trace::{TraceRecorder, TRACE_SEPARATOR};

/// Solves `formula` with a fresh search state, consulting `oracle` for propagation.
pub fn solve<O: Oracle>(formula: &Formula, oracle: O) -> Result<SolveResult, SolverError> {
    Solver::new(formula, oracle).solve()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::{n, p};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_formula(rng: &mut StdRng, num_variables: usize, num_clauses: usize) -> Formula {
        Formula::new(
            num_variables,
            (0..num_clauses).map(|_| {
                let clause_size = rng.gen_range(1, 4);
                Clause::new((0..clause_size).map(|_| {
                    let var = Variable(rng.gen_range(1, num_variables + 1));
                    Literal::new(var, rng.gen())
                }))
            }),
        )
    }

    #[test]
    fn solve_bcp_sat() {
        let f = Formula::new(2, vec![Clause::new(vec![p(1), p(2)]), Clause::new(vec![n(1)])]);
        let r = solve(&f, UnitPropagator::new(&f)).unwrap();
        assert_eq!(r.status, SatResult::Satisfiable);
        assert_eq!(r.model.unwrap().literals(), vec![n(1), p(2)]);
    }

    #[test]
    fn solve_bcp_unsat() {
        let f = Formula::from_dimacs(2, &[vec![1, 2], vec![-1], vec![-2]]);
        let r = solve(&f, UnitPropagator::new(&f)).unwrap();
        assert_eq!(r.status, SatResult::Unsatisfiable);
        assert_eq!(r.stats.oracle_calls, 1);
    }

    #[test]
    fn repeated_solves_are_identical() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..50 {
            let f = random_formula(&mut rng, 10, 30);
            let first = solve(&f, UnitPropagator::new(&f)).unwrap();
            let second = solve(&f, UnitPropagator::new(&f)).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn trace_covers_every_oracle_call() {
        let f = Formula::from_dimacs(2, &[vec![1, 2], vec![1, -2], vec![-1, 2], vec![-1, -2]]);
        let r = solve(&f, UnitPropagator::new(&f)).unwrap();
        let entries: Vec<&str> = r.trace.split(TRACE_SEPARATOR).filter_map(|entry| entry.lines().last()).collect();
        assert_eq!(
            entries,
            vec!["[DL0] STATUS CONTINUE", "[DL1] STATUS CONFLICT", "[DL1] STATUS CONFLICT"]
        );
    }
}
