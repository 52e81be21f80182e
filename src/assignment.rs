use crate::error::{ProtocolError, SolverError};
use crate::formula::{Clause, Formula, Literal, Variable};
use std::collections::BTreeMap;

/// The partial assignment owned by the search driver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssignmentStore {
    // indexed by variable id - 1
    values: Vec<Option<bool>>,
    assigned: usize,
}

/// A by-value copy of an [`AssignmentStore`], unaffected by later mutation of the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    values: Vec<Option<bool>>,
    assigned: usize,
}

impl AssignmentStore {
    pub fn new(num_variables: usize) -> Self {
        Self {
            values: vec![None; num_variables],
            assigned: 0,
        }
    }

    pub fn num_variables(&self) -> usize {
        self.values.len()
    }

    pub fn get(&self, variable: Variable) -> Option<bool> {
        variable
            .0
            .checked_sub(1)
            .and_then(|i| self.values.get(i))
            .copied()
            .flatten()
    }

    /// Value of `literal` under the assignment, `None` while its variable is unset.
    pub fn value_of(&self, literal: &Literal) -> Option<bool> {
        self.get(*literal.variable()).map(|v| v == literal.is_positive())
    }

    pub fn is_satisfied(&self, clause: &Clause) -> bool {
        clause.literals().any(|l| self.value_of(l) == Some(true))
    }

    /// Assigns `variable`. Re-assigning the same value is a no-op; the opposite value is refused.
    pub fn set(&mut self, variable: Variable, value: bool) -> Result<(), SolverError> {
        let num_variables = self.num_variables();
        let values = &mut self.values;
        let slot = variable
            .0
            .checked_sub(1)
            .and_then(|i| values.get_mut(i))
            .ok_or(ProtocolError::UnknownVariable {
                variable,
                num_variables,
            })?;
        match *slot {
            Some(current) if current != value => Err(SolverError::AssignmentConflict {
                variable,
                current,
                requested: value,
            }),
            Some(_) => Ok(()),
            None => {
                *slot = Some(value);
                self.assigned += 1;
                Ok(())
            }
        }
    }

    pub fn assigned_count(&self) -> usize {
        self.assigned
    }

    pub fn is_complete(&self) -> bool {
        self.assigned == self.values.len()
    }

    /// Unassigned variables in ascending id order.
    pub fn unassigned_vars(&self) -> impl Iterator<Item = Variable> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_none())
            .map(|(i, _)| Variable(i + 1))
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            values: self.values.clone(),
            assigned: self.assigned,
        }
    }

    pub fn restore(&mut self, snapshot: &Snapshot) {
        self.values.clone_from(&snapshot.values);
        self.assigned = snapshot.assigned;
    }

    /// Completes the assignment into a model; unset variables are reported `false`.
    pub fn to_model(&self) -> Model {
        Model(
            self.values
                .iter()
                .enumerate()
                .map(|(i, v)| (Variable(i + 1), v.unwrap_or(false)))
                .collect(),
        )
    }
}

/// A total assignment of the formula's variables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Model(BTreeMap<Variable, bool>);

impl Model {
    pub fn value(&self, variable: Variable) -> Option<bool> {
        self.0.get(&variable).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Variable, bool)> + '_ {
        self.0.iter().map(|(v, b)| (*v, *b))
    }

    /// The model as true literals, ordered by variable.
    pub fn literals(&self) -> Vec<Literal> {
        self.iter().map(|(v, b)| Literal::new(v, b)).collect()
    }

    pub fn satisfies(&self, formula: &Formula) -> bool {
        formula
            .clauses()
            .all(|c| c.literals().any(|l| self.value(*l.variable()) == Some(l.is_positive())))
    }
}
