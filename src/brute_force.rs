use crate::*;

// Exhaustive reference used to cross-check the search in property tests
pub(crate) fn solve_brute_force(f: &Formula) -> SatResult {
    let num_variables = f.num_variables();
    assert!(num_variables <= 15); // just for safety

    // variable x (1-indexed) is true when bit x-1 is clear
    fn assignment_for(assignment: u32, x: usize) -> bool {
        assignment & (1 << (x - 1)) == 0
    }

    'search: for assignment in 0..2u32.pow(num_variables as u32) {
        'clauses: for clause in f.clauses() {
            for literal in clause.literals() {
                if assignment_for(assignment, literal.idx()) == literal.is_positive() {
                    // this clause is satisfied, let's go to the next one
                    continue 'clauses;
                }
            }
            // if we got here, this clause was not satisfied, so this assignment is bogus
            continue 'search;
        }
        // if we got here, every clause was satisfied, so we're done and satisfiable
        return SatResult::Satisfiable;
    }
    // no assignment is valid
    SatResult::Unsatisfiable
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solve_bcp_sat() {
        let f = Formula::from_dimacs(2, &[vec![1, 2], vec![-1]]);
        assert_eq!(solve_brute_force(&f), SatResult::Satisfiable);
    }

    #[test]
    fn solve_bcp_unsat() {
        let f = Formula::from_dimacs(2, &[vec![1, 2], vec![-1], vec![-2]]);
        assert_eq!(solve_brute_force(&f), SatResult::Unsatisfiable);
    }

    #[test]
    fn solve_conflict_sat() {
        let f = Formula::from_dimacs(3, &[vec![1, 2, 3], vec![-1, -2, 3], vec![-2, -3]]);
        assert_eq!(solve_brute_force(&f), SatResult::Satisfiable);
    }

    #[test]
    fn no_variables() {
        assert_eq!(solve_brute_force(&Formula::new(0, vec![])), SatResult::Satisfiable);
    }
}
