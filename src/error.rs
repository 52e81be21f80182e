use crate::formula::Variable;
use crate::protocol::DecisionLevel;
use thiserror::Error;

/// Fatal failures of a search. Oracle-reported conflicts are not errors.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("variable {variable} already holds {current}, cannot assign {requested}")]
    AssignmentConflict {
        variable: Variable,
        current: bool,
        requested: bool,
    },

    #[error("decision requested but every variable is assigned")]
    HeuristicExhaustion,
}

/// The oracle's reply was missing or could not be understood.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("oracle produced no response")]
    MissingResponse,

    #[error("oracle transport failed: {0}")]
    Transport(#[from] std::io::Error),

    #[error("missing required field {0}")]
    MissingField(&'static str),

    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },

    #[error("response echoes decision level {found}, request was at {expected}")]
    LevelMismatch {
        expected: DecisionLevel,
        found: DecisionLevel,
    },

    #[error("oracle reported an error (conflict id: {0:?})")]
    OracleFailure(Option<String>),

    #[error("variable {variable} is outside 1..={num_variables}")]
    UnknownVariable { variable: Variable, num_variables: usize },
}

impl ProtocolError {
    pub(crate) fn malformed(line: usize, message: impl Into<String>) -> Self {
        ProtocolError::Malformed {
            line,
            message: message.into(),
        }
    }
}
