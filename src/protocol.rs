//! Text schema spoken with the propagation oracle (version 1).
//!
//! A trigger is two `KEY: value` lines. A response carries three sections, each opened by a
//! fixed header line, in any order:
//!
//! ```text
//! --- STATUS ---
//! STATUS: SAT|CONFLICT|CONTINUE|UNSAT
//! DL: <integer>
//! CONFLICT_ID: <string | None>
//!
//! --- BCP EXECUTION LOG ---
//! <free text>
//!
//! --- CURRENT VARIABLE STATE ---
//! <var id> | TRUE|FALSE|UNASSIGNED
//! ```

use crate::error::ProtocolError;
use crate::formula::{Literal, Variable};
use crate::oracle::Oracle;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Debug, Default, Hash)]
pub struct DecisionLevel(pub usize);

impl DecisionLevel {
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl Display for DecisionLevel {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TriggerRequest {
    /// `None` asks the oracle to propagate without making a decision.
    pub literal: Option<Literal>,
    pub decision_level: DecisionLevel,
}

impl TriggerRequest {
    pub fn propagate(decision_level: DecisionLevel) -> Self {
        Self {
            literal: None,
            decision_level,
        }
    }

    pub fn decide(literal: Literal, decision_level: DecisionLevel) -> Self {
        Self {
            literal: Some(literal),
            decision_level,
        }
    }

    fn wire_literal(&self) -> i64 {
        self.literal.map_or(0, |l| l.to_dimacs())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OracleStatus {
    Sat,
    Conflict,
    Continue,
    Unsat,
    Error,
}

impl OracleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OracleStatus::Sat => "SAT",
            OracleStatus::Conflict => "CONFLICT",
            OracleStatus::Continue => "CONTINUE",
            OracleStatus::Unsat => "UNSAT",
            OracleStatus::Error => "ERROR",
        }
    }
}

impl Display for OracleStatus {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OracleStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SAT" => Ok(OracleStatus::Sat),
            "CONFLICT" => Ok(OracleStatus::Conflict),
            "CONTINUE" => Ok(OracleStatus::Continue),
            "UNSAT" => Ok(OracleStatus::Unsat),
            "ERROR" => Ok(OracleStatus::Error),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OracleResponse {
    pub status: OracleStatus,
    /// Echo of the request's decision level, when the oracle sent one.
    pub decision_level: Option<DecisionLevel>,
    pub conflict_id: Option<String>,
    /// Variables the oracle reports as TRUE or FALSE. UNASSIGNED rows are not kept.
    pub implied: BTreeMap<Variable, bool>,
    pub log: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Section {
    Status,
    Log,
    Variables,
}

impl Section {
    const ALL: [Section; 3] = [Section::Status, Section::Log, Section::Variables];

    fn header(self) -> &'static str {
        match self {
            Section::Status => "--- STATUS ---",
            Section::Log => "--- BCP EXECUTION LOG ---",
            Section::Variables => "--- CURRENT VARIABLE STATE ---",
        }
    }

    fn from_header(line: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.header() == line)
    }
}

pub fn encode_trigger(request: &TriggerRequest) -> String {
    format!(
        "# BCP TRIGGER INPUT v{}\nTRIGGER_LITERAL: {}\nDL: {}\n",
        SCHEMA_VERSION,
        request.wire_literal(),
        request.decision_level
    )
}

/// Oracle-side parse of a trigger record.
pub fn decode_trigger(text: &str) -> Result<TriggerRequest, ProtocolError> {
    let mut literal = None;
    let mut decision_level = None;

    for (idx, raw) in text.lines().enumerate() {
        let number = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (key, value) = split_field(line, number)?;
        match key {
            "TRIGGER_LITERAL" => {
                let value = value
                    .parse::<i64>()
                    .map_err(|_| ProtocolError::malformed(number, format!("invalid literal '{}'", value)))?;
                literal = Some(Literal::from_dimacs(value));
            }
            "DL" => decision_level = Some(parse_level(value, number)?),
            other => {
                return Err(ProtocolError::malformed(
                    number,
                    format!("unknown trigger field '{}'", other),
                ))
            }
        }
    }

    Ok(TriggerRequest {
        literal: literal.ok_or(ProtocolError::MissingField("TRIGGER_LITERAL"))?,
        decision_level: decision_level.ok_or(ProtocolError::MissingField("DL"))?,
    })
}

/// Writes the canonical response record, listing every variable in `1..=num_variables`.
pub fn encode_response(response: &OracleResponse, num_variables: usize) -> String {
    let mut out = String::new();

    out.push_str(Section::Status.header());
    out.push('\n');
    out.push_str(&format!("STATUS: {}\n", response.status));
    if let Some(level) = response.decision_level {
        out.push_str(&format!("DL: {}\n", level));
    }
    out.push_str(&format!(
        "CONFLICT_ID: {}\n\n",
        response.conflict_id.as_deref().unwrap_or("None")
    ));

    out.push_str(Section::Log.header());
    out.push('\n');
    if !response.log.is_empty() {
        out.push_str(&response.log);
        out.push('\n');
    }
    out.push('\n');

    out.push_str(Section::Variables.header());
    out.push('\n');
    for v in 1..=num_variables {
        let state = match response.implied.get(&Variable(v)) {
            Some(true) => "TRUE",
            Some(false) => "FALSE",
            None => "UNASSIGNED",
        };
        out.push_str(&format!("{} | {}\n", v, state));
    }
    out
}

#[derive(Default)]
struct StatusFields {
    status: Option<OracleStatus>,
    decision_level: Option<DecisionLevel>,
    conflict_id: Option<Option<String>>,
}

pub fn decode_response(text: &str) -> Result<OracleResponse, ProtocolError> {
    if text.trim().is_empty() {
        return Err(ProtocolError::MissingResponse);
    }

    let mut section = None;
    let mut fields = StatusFields::default();
    let mut log_lines = Vec::new();
    let mut implied = BTreeMap::new();

    for (idx, raw) in text.lines().enumerate() {
        let number = idx + 1;
        let line = raw.trim();
        if let Some(next) = Section::from_header(line) {
            section = Some(next);
            continue;
        }
        match section {
            // the log is free text, kept verbatim
            Some(Section::Log) => log_lines.push(raw.trim_end()),
            _ if line.is_empty() || line.starts_with('#') => {}
            None => {
                return Err(ProtocolError::malformed(
                    number,
                    "content before the first section header",
                ))
            }
            Some(Section::Status) => decode_status_field(line, number, &mut fields)?,
            Some(Section::Variables) => {
                let (variable, value) = decode_variable_row(line, number)?;
                if let Some(value) = value {
                    if let Some(previous) = implied.insert(variable, value) {
                        if previous != value {
                            return Err(ProtocolError::malformed(
                                number,
                                format!("variable {} listed as both TRUE and FALSE", variable),
                            ));
                        }
                    }
                }
            }
        }
    }

    let start = log_lines.iter().position(|l| !l.is_empty()).unwrap_or(log_lines.len());
    let end = log_lines.iter().rposition(|l| !l.is_empty()).map_or(start, |i| i + 1);

    Ok(OracleResponse {
        status: fields.status.ok_or(ProtocolError::MissingField("STATUS"))?,
        decision_level: fields.decision_level,
        conflict_id: fields.conflict_id.flatten(),
        implied,
        log: log_lines[start..end].join("\n"),
    })
}

fn decode_status_field(line: &str, number: usize, fields: &mut StatusFields) -> Result<(), ProtocolError> {
    let (key, value) = split_field(line, number)?;
    match key {
        "STATUS" => {
            let status = value
                .parse::<OracleStatus>()
                .map_err(|_| ProtocolError::malformed(number, format!("unknown status '{}'", value)))?;
            set_once(&mut fields.status, status, number, key)
        }
        "DL" => set_once(&mut fields.decision_level, parse_level(value, number)?, number, key),
        "CONFLICT_ID" => {
            let id = match value {
                "" | "None" => None,
                id => Some(id.to_string()),
            };
            set_once(&mut fields.conflict_id, id, number, key)
        }
        other => {
            warn!("ignoring unknown status field '{}' on line {}", other, number);
            Ok(())
        }
    }
}

fn decode_variable_row(line: &str, number: usize) -> Result<(Variable, Option<bool>), ProtocolError> {
    let (id, state) = line
        .split_once('|')
        .ok_or_else(|| ProtocolError::malformed(number, format!("expected '<var> | <state>', found '{}'", line)))?;
    let id = id.trim();
    let variable = match id.parse::<usize>() {
        Ok(v) if v > 0 => Variable(v),
        _ => return Err(ProtocolError::malformed(number, format!("invalid variable id '{}'", id))),
    };
    let value = match state.trim() {
        "TRUE" => Some(true),
        "FALSE" => Some(false),
        "UNASSIGNED" => None,
        other => {
            return Err(ProtocolError::malformed(
                number,
                format!("invalid variable state '{}'", other),
            ))
        }
    };
    Ok((variable, value))
}

fn split_field(line: &str, number: usize) -> Result<(&str, &str), ProtocolError> {
    line.split_once(':')
        .map(|(k, v)| (k.trim(), v.trim()))
        .ok_or_else(|| ProtocolError::malformed(number, format!("expected 'KEY: value', found '{}'", line)))
}

fn parse_level(value: &str, number: usize) -> Result<DecisionLevel, ProtocolError> {
    value
        .parse::<usize>()
        .map(DecisionLevel)
        .map_err(|_| ProtocolError::malformed(number, format!("invalid decision level '{}'", value)))
}

fn set_once<T>(slot: &mut Option<T>, value: T, number: usize, key: &str) -> Result<(), ProtocolError> {
    if slot.is_some() {
        return Err(ProtocolError::malformed(number, format!("duplicate {} field", key)));
    }
    *slot = Some(value);
    Ok(())
}

/// Sends one trigger through `oracle` and decodes the reply.
///
/// The reply must echo the request's decision level when it carries one. An `ERROR` status is
/// turned into [`ProtocolError::OracleFailure`], so callers only ever see the four search outcomes.
pub fn round_trip<O: Oracle + ?Sized>(
    oracle: &mut O,
    request: &TriggerRequest,
) -> Result<OracleResponse, ProtocolError> {
    debug!(
        "trigger literal {} at DL {}",
        request.wire_literal(),
        request.decision_level
    );
    let reply = oracle.run(&encode_trigger(request))?;
    let response = decode_response(&reply)?;

    if let Some(found) = response.decision_level {
        if found != request.decision_level {
            return Err(ProtocolError::LevelMismatch {
                expected: request.decision_level,
                found,
            });
        }
    }
    if response.status == OracleStatus::Error {
        return Err(ProtocolError::OracleFailure(response.conflict_id));
    }

    debug!(
        "oracle answered {} at DL {} ({} implied, conflict {:?})",
        response.status,
        request.decision_level,
        response.implied.len(),
        response.conflict_id
    );
    Ok(response)
}
