use crate::formula::{Formula, Literal, Variable};
use crate::oracle::Oracle;
use crate::protocol::{self, DecisionLevel, OracleResponse, OracleStatus, TriggerRequest};
use log::trace;
use std::collections::BTreeMap;
use std::io;

/// In-process reference oracle: plain unit propagation over a borrowed formula.
///
/// Keeps its own assignment tagged with decision levels. A trigger at level `d` first forgets
/// everything assigned at `d` or deeper, so re-triggering a level after a backtrack starts from
/// the state the driver restored.
pub struct UnitPropagator<'f> {
    formula: &'f Formula,
    variables: Vec<Option<(bool, DecisionLevel)>>,
}

enum Outcome {
    Conflict(Option<usize>),
    NoConflict,
}

impl<'f> UnitPropagator<'f> {
    pub fn new(formula: &'f Formula) -> Self {
        Self {
            formula,
            variables: vec![None; formula.num_variables()],
        }
    }

    pub fn propagate(&mut self, trigger: &TriggerRequest) -> OracleResponse {
        let level = trigger.decision_level;
        for state in self.variables.iter_mut() {
            if matches!(state, Some((_, l)) if *l >= level) {
                *state = None;
            }
        }

        let mut log = vec![];
        let outcome = match trigger.literal {
            None => {
                log.push(format!("[DL{}] PROPAGATE", level));
                self.bcp(level, &mut log)
            }
            Some(literal) if !self.formula.contains_variable(*literal.variable()) => {
                log.push(format!("[DL{}] UNKNOWN VARIABLE {}", level, literal.variable()));
                return self.response(OracleStatus::Error, level, None, log);
            }
            Some(literal) => {
                log.push(format!("[DL{}] DECIDE {}", level, literal));
                match self.value_of(&literal) {
                    Some(false) => {
                        log.push(format!("[DL{}] DECISION {} CONTRADICTS ASSIGNMENT", level, literal));
                        Outcome::Conflict(None)
                    }
                    Some(true) => self.bcp(level, &mut log),
                    None => {
                        self.assign(literal, level);
                        self.bcp(level, &mut log)
                    }
                }
            }
        };

        let (status, conflict_id) = match outcome {
            Outcome::Conflict(clause) => {
                let id = clause.map(|idx| format!("Clause_{}", idx + 1));
                log.push(format!("[DL{}] CONFLICT {}", level, id.as_deref().unwrap_or("None")));
                if level == DecisionLevel(0) {
                    (OracleStatus::Unsat, id)
                } else {
                    (OracleStatus::Conflict, id)
                }
            }
            Outcome::NoConflict if self.all_satisfied() => (OracleStatus::Sat, None),
            Outcome::NoConflict => (OracleStatus::Continue, None),
        };
        log.push(format!("[DL{}] STATUS {}", level, status));

        self.response(status, level, conflict_id, log)
    }

    fn response(
        &self,
        status: OracleStatus,
        level: DecisionLevel,
        conflict_id: Option<String>,
        log: Vec<String>,
    ) -> OracleResponse {
        let implied: BTreeMap<Variable, bool> = self
            .variables
            .iter()
            .enumerate()
            .filter_map(|(i, state)| state.map(|(value, _)| (Variable(i + 1), value)))
            .collect();
        OracleResponse {
            status,
            decision_level: Some(level),
            conflict_id,
            implied,
            log: log.join("\n"),
        }
    }

    fn value_of(&self, literal: &Literal) -> Option<bool> {
        self.variables[literal.idx() - 1].map(|(value, _)| value == literal.is_positive())
    }

    fn assign(&mut self, literal: Literal, level: DecisionLevel) {
        trace!("oracle assigns {} at level {}", literal, level);
        self.variables[literal.idx() - 1] = Some((literal.is_positive(), level));
    }

    fn all_satisfied(&self) -> bool {
        self.formula
            .clauses()
            .all(|clause| clause.literals().any(|l| self.value_of(l) == Some(true)))
    }

    fn bcp(&mut self, level: DecisionLevel, log: &mut Vec<String>) -> Outcome {
        let formula = self.formula;
        let mut did_work = true;
        while did_work {
            did_work = false;
            'clauses: for (idx, clause) in formula.clauses().enumerate() {
                let mut last_literal: Option<Literal> = None;
                'literals: for literal in clause.literals() {
                    match self.value_of(literal) {
                        // true => this clause is satisfied
                        Some(true) => continue 'clauses,
                        // false => need to look at more literals
                        Some(false) => continue 'literals,
                        // undecided => we'll be assigning this literal if it's the only undecided one
                        None => match last_literal {
                            None => last_literal = Some(*literal),
                            Some(seen) if seen == *literal => {}
                            // second undecided literal, can't resolve this clause
                            Some(_) => continue 'clauses,
                        },
                    }
                }
                // no undecided literal left means every literal was false
                match last_literal {
                    Some(literal) => {
                        self.assign(literal, level);
                        log.push(format!("[DL{}] IMPLY {} (Clause_{})", level, literal, idx + 1));
                    }
                    None => return Outcome::Conflict(Some(idx)),
                }
                did_work = true;
            }
        }
        Outcome::NoConflict
    }
}

impl Oracle for UnitPropagator<'_> {
    fn run(&mut self, request: &str) -> io::Result<String> {
        let trigger =
            protocol::decode_trigger(request).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let response = self.propagate(&trigger);
        Ok(protocol::encode_response(&response, self.formula.num_variables()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::{n, p};

    fn implied(response: &OracleResponse) -> Vec<(usize, bool)> {
        response.implied.iter().map(|(v, b)| (v.0, *b)).collect()
    }

    #[test]
    fn unit_chain_is_sat_at_level_zero() {
        let f = Formula::from_dimacs(3, &[vec![1], vec![-1, 2], vec![-2, 3]]);
        let mut oracle = UnitPropagator::new(&f);
        let response = oracle.propagate(&TriggerRequest::propagate(DecisionLevel(0)));
        assert_eq!(response.status, OracleStatus::Sat);
        assert_eq!(implied(&response), vec![(1, true), (2, true), (3, true)]);
        assert_eq!(response.decision_level, Some(DecisionLevel(0)));
    }

    #[test]
    fn conflict_at_level_zero_is_unsat() {
        let f = Formula::from_dimacs(1, &[vec![1], vec![-1]]);
        let mut oracle = UnitPropagator::new(&f);
        let response = oracle.propagate(&TriggerRequest::propagate(DecisionLevel(0)));
        assert_eq!(response.status, OracleStatus::Unsat);
        assert_eq!(response.conflict_id.as_deref(), Some("Clause_2"));
    }

    #[test]
    fn decision_conflict_and_retry_at_same_level() {
        let f = Formula::from_dimacs(2, &[vec![1, 2], vec![1, -2], vec![-1, 2], vec![-1, -2]]);
        let mut oracle = UnitPropagator::new(&f);
        assert_eq!(
            oracle.propagate(&TriggerRequest::propagate(DecisionLevel(0))).status,
            OracleStatus::Continue
        );

        let response = oracle.propagate(&TriggerRequest::decide(p(1), DecisionLevel(1)));
        assert_eq!(response.status, OracleStatus::Conflict);
        assert_eq!(response.conflict_id.as_deref(), Some("Clause_4"));

        // retrying level 1 forgets the previous attempt
        let response = oracle.propagate(&TriggerRequest::decide(n(1), DecisionLevel(1)));
        assert_eq!(response.status, OracleStatus::Conflict);
        assert_eq!(response.conflict_id.as_deref(), Some("Clause_2"));
    }

    #[test]
    fn deeper_levels_are_dropped_on_backtrack() {
        let f = Formula::from_dimacs(3, &[vec![1, 2, 3]]);
        let mut oracle = UnitPropagator::new(&f);
        oracle.propagate(&TriggerRequest::decide(n(1), DecisionLevel(1)));
        let response = oracle.propagate(&TriggerRequest::decide(n(2), DecisionLevel(2)));
        assert_eq!(implied(&response), vec![(1, false), (2, false), (3, true)]);
        assert_eq!(response.status, OracleStatus::Sat);

        let response = oracle.propagate(&TriggerRequest::decide(p(2), DecisionLevel(2)));
        assert_eq!(implied(&response), vec![(1, false), (2, true)]);

        let response = oracle.propagate(&TriggerRequest::decide(p(1), DecisionLevel(1)));
        assert_eq!(implied(&response), vec![(1, true)]);
    }

    #[test]
    fn log_records_decision_and_implications() {
        let f = Formula::from_dimacs(2, &[vec![-1, 2]]);
        let mut oracle = UnitPropagator::new(&f);
        let response = oracle.propagate(&TriggerRequest::decide(p(1), DecisionLevel(1)));
        assert_eq!(
            response.log,
            "[DL1] DECIDE 1\n[DL1] IMPLY 2 (Clause_1)\n[DL1] STATUS SAT"
        );
    }

    #[test]
    fn unknown_decision_variable_is_an_error() {
        let f = Formula::from_dimacs(1, &[vec![1]]);
        let mut oracle = UnitPropagator::new(&f);
        let response = oracle.propagate(&TriggerRequest::decide(p(5), DecisionLevel(1)));
        assert_eq!(response.status, OracleStatus::Error);
    }

    #[test]
    fn speaks_the_wire_format() {
        let f = Formula::from_dimacs(2, &[vec![-1, 2]]);
        let mut oracle = UnitPropagator::new(&f);
        let reply = oracle
            .run(&protocol::encode_trigger(&TriggerRequest::decide(p(1), DecisionLevel(1))))
            .unwrap();
        let response = protocol::decode_response(&reply).unwrap();
        assert_eq!(response.status, OracleStatus::Sat);
        assert_eq!(implied(&response), vec![(1, true), (2, true)]);

        assert_eq!(
            oracle.run("garbage").unwrap_err().kind(),
            io::ErrorKind::InvalidData
        );
    }
}
