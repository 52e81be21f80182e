use crate::formula::{Clause, Formula, Literal};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use thiserror::Error;

pub fn parse<R: Read>(reader: R) -> Result<Formula, DimacsParseError> {
    let reader = BufReader::new(reader);

    let mut clauses = vec![];
    let mut header = None;
    // literals read since the last 0; a clause may span lines
    let mut clause = vec![];

    'lines: for line in reader.lines() {
        let line = line?;
        let mut line = line.split_whitespace().peekable();

        match line.peek() {
            Some(&"c") | None => continue,
            // SATLIB end-of-data marker
            Some(&"%") => break,
            Some(&"p") => {
                if header.is_some() {
                    return Err(DimacsParseError::Format("duplicate 'p' line".into()));
                }
                let _ = line.next();

                if line.next() != Some("cnf") {
                    return Err(DimacsParseError::Format("missing 'cnf'".into()));
                }

                let num_variables = line
                    .next()
                    .and_then(|c| c.parse::<usize>().ok())
                    .ok_or_else(|| DimacsParseError::Format("invalid num_variables".into()))?;

                let num_clauses = line
                    .next()
                    .and_then(|c| c.parse::<usize>().ok())
                    .ok_or_else(|| DimacsParseError::Format("invalid num_clauses".into()))?;

                header = Some((num_variables, num_clauses));
            }
            Some(_) => {
                let (num_variables, num_clauses) = header
                    .ok_or_else(|| DimacsParseError::Format("missing 'p' line before clauses".into()))?;

                for x in line {
                    match parse_literal(x)? {
                        Some(l) if l.idx() > num_variables => {
                            return Err(DimacsParseError::Format(format!(
                                "literal {} exceeds declared {} variables",
                                l, num_variables
                            )));
                        }
                        Some(l) => clause.push(l),
                        None => {
                            // every 0 ends a clause; a bare 0 yields the empty clause
                            clauses.push(Clause::new(std::mem::take(&mut clause)));
                            if clauses.len() >= num_clauses {
                                break 'lines;
                            }
                        }
                    }
                }
            }
        }
    }

    // tolerate a missing 0 after the last clause
    if !clause.is_empty() {
        clauses.push(Clause::new(clause));
    }

    match header {
        Some((num_variables, _)) => Ok(Formula::new(num_variables, clauses)),
        None => Err(DimacsParseError::Format("missing 'p' line before clauses".into())),
    }
}

pub fn parse_file(path: impl AsRef<Path>) -> Result<Formula, DimacsParseError> {
    let file = File::open(path)?;
    parse(file)
}

fn parse_literal(s: &str) -> Result<Option<Literal>, DimacsParseError> {
    let l = s
        .parse::<i64>()
        .map_err(|_| DimacsParseError::Format(format!("invalid literal '{}'", s)))?;
    Ok(Literal::from_dimacs(l))
}

#[derive(Debug, Error)]
pub enum DimacsParseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("format error: {0}")]
    Format(String),
}
