use crate::assignment::{AssignmentStore, Model, Snapshot};
use crate::error::{ProtocolError, SolverError};
use crate::formula::{Clause, Formula, Literal, Variable};
use crate::heuristic::jeroslow_wang;
use crate::oracle::Oracle;
use crate::protocol::{self, DecisionLevel, OracleResponse, OracleStatus, TriggerRequest};
use crate::trace::TraceRecorder;
use crate::SatResult;
use log::{info, trace};

/// Outcome of a top-level solve.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SolveResult {
    pub status: SatResult,
    /// Present iff `status` is [`SatResult::Satisfiable`].
    pub model: Option<Model>,
    /// Every oracle log in call order.
    pub trace: String,
    /// The last conflict identifier any oracle response carried.
    pub final_conflict_id: Option<String>,
    pub stats: SearchStats,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Decision variables picked (one per explored search node).
    pub decisions: usize,
    pub oracle_calls: usize,
    /// Polarities abandoned because of a conflict or an exhausted subtree.
    pub backtracks: usize,
}

/// DPLL search that leaves propagation to an [`Oracle`].
///
/// The driver decides with [`jeroslow_wang`], always trying the positive literal before the
/// negative one, and snapshots the assignment before each decision so a failed polarity can be
/// undone exactly. Decisions live on an explicit stack rather than the call stack.
pub struct Solver<'f, O: Oracle> {
    formula: &'f Formula,
    oracle: O,
    assignment: AssignmentStore,
    trace: TraceRecorder,
    last_conflict: Option<String>,
    stats: SearchStats,
}

/// One open decision: the variable, the level it was made at, and the state to return to.
#[derive(Debug)]
struct Frame {
    variable: Variable,
    level: DecisionLevel,
    snapshot: Snapshot,
    tried: u8,
}

impl Frame {
    fn next_literal(&mut self) -> Option<Literal> {
        let literal = match self.tried {
            0 => Literal::Positive(self.variable),
            1 => Literal::Negative(self.variable),
            _ => return None,
        };
        self.tried += 1;
        Some(literal)
    }
}

impl<'f, O: Oracle> Solver<'f, O> {
    pub fn new(formula: &'f Formula, oracle: O) -> Self {
        Self {
            formula,
            oracle,
            assignment: AssignmentStore::new(formula.num_variables()),
            trace: TraceRecorder::new(),
            last_conflict: None,
            stats: SearchStats::default(),
        }
    }

    /// Runs the search to completion and finalizes the trace.
    ///
    /// Protocol failures abort the search; no partial result is returned.
    pub fn solve(mut self) -> Result<SolveResult, SolverError> {
        let status = self.search()?;
        let model = match status {
            SatResult::Satisfiable => Some(self.assignment.to_model()),
            SatResult::Unsatisfiable => None,
        };
        info!(
            "{:?} after {} decisions, {} oracle calls, {} backtracks",
            status, self.stats.decisions, self.stats.oracle_calls, self.stats.backtracks
        );
        Ok(SolveResult {
            status,
            model,
            trace: self.trace.finalize(),
            final_conflict_id: self.last_conflict,
            stats: self.stats,
        })
    }

    fn search(&mut self) -> Result<SatResult, SolverError> {
        if self.assignment.is_complete() {
            // only reachable with no variables, where an empty clause is the one way to fail
            if self.formula.clauses().any(Clause::is_empty) {
                return Ok(SatResult::Unsatisfiable);
            }
            return Ok(SatResult::Satisfiable);
        }
        if let Some(result) = self.initial_check()? {
            return Ok(result);
        }

        let mut frames: Vec<Frame> = vec![];
        let mut descend = true;
        loop {
            if descend {
                if self.assignment.is_complete() {
                    return Ok(SatResult::Satisfiable);
                }
                let level = frames.last().map_or(DecisionLevel(0), |f| f.level).next();
                let variable = jeroslow_wang(self.formula, &self.assignment)?;
                self.stats.decisions += 1;
                trace!("decide {} at level {}", variable, level);
                frames.push(Frame {
                    variable,
                    level,
                    snapshot: self.assignment.snapshot(),
                    tried: 0,
                });
            }

            let frame = match frames.last_mut() {
                Some(frame) => frame,
                None => return Ok(SatResult::Unsatisfiable),
            };
            let (variable, level) = (frame.variable, frame.level);
            let literal = match frame.next_literal() {
                Some(literal) => literal,
                None => {
                    // both polarities failed: the parent abandons the polarity that led here
                    trace!("exhausted {} at level {}", variable, level);
                    frames.pop();
                    match frames.last() {
                        Some(parent) => {
                            self.assignment.restore(&parent.snapshot);
                            self.stats.backtracks += 1;
                        }
                        None => return Ok(SatResult::Unsatisfiable),
                    }
                    descend = false;
                    continue;
                }
            };

            let response = self.query(TriggerRequest::decide(literal, level))?;
            match response.status {
                OracleStatus::Sat => {
                    self.merge(&response)?;
                    return Ok(SatResult::Satisfiable);
                }
                OracleStatus::Conflict | OracleStatus::Unsat => {
                    trace!("{} failed at level {}, backtracking", literal, level);
                    if let Some(frame) = frames.last() {
                        self.assignment.restore(&frame.snapshot);
                    }
                    self.stats.backtracks += 1;
                    descend = false;
                }
                OracleStatus::Continue => {
                    self.merge(&response)?;
                    self.assignment.set(variable, literal.is_positive())?;
                    descend = true;
                }
                // rejected by protocol::round_trip
                OracleStatus::Error => {
                    return Err(protocol_failure(response));
                }
            }
        }
    }

    /// Propagate-only round trip at level 0. `None` means the search has to decide.
    fn initial_check(&mut self) -> Result<Option<SatResult>, SolverError> {
        let response = self.query(TriggerRequest::propagate(DecisionLevel(0)))?;
        match response.status {
            OracleStatus::Conflict | OracleStatus::Unsat => Ok(Some(SatResult::Unsatisfiable)),
            OracleStatus::Sat => {
                self.merge(&response)?;
                Ok(Some(SatResult::Satisfiable))
            }
            OracleStatus::Continue => {
                self.merge(&response)?;
                Ok(None)
            }
            OracleStatus::Error => Err(protocol_failure(response)),
        }
    }

    fn query(&mut self, request: TriggerRequest) -> Result<OracleResponse, SolverError> {
        let response = protocol::round_trip(&mut self.oracle, &request)?;
        self.stats.oracle_calls += 1;
        self.trace.record(response.log.as_str());
        if let Some(id) = &response.conflict_id {
            self.last_conflict = Some(id.clone());
        }
        Ok(response)
    }

    fn merge(&mut self, response: &OracleResponse) -> Result<(), SolverError> {
        for (&variable, &value) in &response.implied {
            self.assignment.set(variable, value)?;
        }
        Ok(())
    }
}

fn protocol_failure(response: OracleResponse) -> SolverError {
    ProtocolError::OracleFailure(response.conflict_id).into()
}
