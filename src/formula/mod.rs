pub mod dimacs;

use std::fmt::Debug;
use std::fmt::{self, Display, Formatter};

/// A 1-indexed propositional variable.
#[derive(Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash, Debug)]
pub struct Variable(pub usize);

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Literal {
    Positive(Variable),
    Negative(Variable),
}

impl Literal {
    pub fn new(variable: Variable, positive: bool) -> Self {
        if positive {
            Literal::Positive(variable)
        } else {
            Literal::Negative(variable)
        }
    }

    /// Signed DIMACS form; `0` is not a literal.
    pub fn from_dimacs(value: i64) -> Option<Self> {
        if value > 0 {
            Some(Literal::Positive(Variable(value as usize)))
        } else if value < 0 {
            Some(Literal::Negative(Variable(value.unsigned_abs() as usize)))
        } else {
            None
        }
    }

    pub fn to_dimacs(&self) -> i64 {
        match self {
            Literal::Positive(v) => v.0 as i64,
            Literal::Negative(v) => -(v.0 as i64),
        }
    }

    pub fn variable(&self) -> &Variable {
        match self {
            Literal::Positive(v) => v,
            Literal::Negative(v) => v,
        }
    }

    pub fn is_positive(&self) -> bool {
        match self {
            Literal::Positive(_) => true,
            Literal::Negative(_) => false,
        }
    }

    pub fn idx(&self) -> usize {
        self.variable().0
    }

    pub fn negated(&self) -> Self {
        match self {
            Literal::Positive(v) => Literal::Negative(*v),
            Literal::Negative(v) => Literal::Positive(*v),
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.to_dimacs())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Clause {
    literals: Vec<Literal>,
}

impl Clause {
    pub fn new(disjuncts: impl IntoIterator<Item = Literal>) -> Self {
        Self {
            literals: disjuncts.into_iter().collect(),
        }
    }

    pub fn literals(&self) -> impl Iterator<Item = &Literal> {
        self.literals.iter()
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    pub fn contains(&self, literal: &Literal) -> bool {
        self.literals.contains(literal)
    }
}

impl Display for Clause {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str("[")?;
        for (i, literal) in self.literals.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", literal)?;
        }
        f.write_str("]")
    }
}

/// A CNF formula over the variables `1..=num_variables`. Immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct Formula {
    num_variables: usize,
    clauses: Vec<Clause>,
}

impl Formula {
    pub fn new(num_variables: usize, conjuncts: impl IntoIterator<Item = Clause>) -> Self {
        let clauses: Vec<Clause> = conjuncts.into_iter().collect();
        for clause in &clauses {
            for literal in clause.literals() {
                assert!(
                    literal.idx() >= 1 && literal.idx() <= num_variables,
                    "literal {} outside variables 1..={}",
                    literal,
                    num_variables
                );
            }
        }
        Self { num_variables, clauses }
    }

    /// Builds a formula from signed DIMACS literals. Zeros are skipped.
    pub fn from_dimacs(num_variables: usize, clauses: &[Vec<i64>]) -> Self {
        Self::new(
            num_variables,
            clauses
                .iter()
                .map(|c| Clause::new(c.iter().filter_map(|&l| Literal::from_dimacs(l)))),
        )
    }

    pub fn num_variables(&self) -> usize {
        self.num_variables
    }

    pub fn variables(&self) -> impl Iterator<Item = Variable> {
        (1..=self.num_variables).map(Variable)
    }

    pub fn contains_variable(&self, variable: Variable) -> bool {
        variable.0 >= 1 && variable.0 <= self.num_variables
    }

    pub fn clauses(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.iter()
    }

    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }
}

impl Debug for Formula {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        let mut first_clause = true;
        for clause in &self.clauses {
            if first_clause {
                first_clause = false;
            } else {
                f.write_str(" & ")?;
            }
            if clause.literals.len() > 1 {
                f.write_str("(")?;
            }
            let mut first_literal = true;
            for literal in &clause.literals {
                if first_literal {
                    first_literal = false;
                } else {
                    f.write_str(" | ")?;
                }
                match literal {
                    Literal::Positive(Variable(x)) => f.write_fmt(format_args!("{}", x))?,
                    Literal::Negative(Variable(x)) => f.write_fmt(format_args!("!{}", x))?,
                }
            }
            if clause.literals.len() > 1 {
                f.write_str(")")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn p(x: usize) -> Literal {
    Literal::Positive(Variable(x))
}

#[cfg(test)]
pub(crate) fn n(x: usize) -> Literal {
    Literal::Negative(Variable(x))
}

/// Random formulas with clauses of one to three literals over at most 8 variables.
#[cfg(test)]
pub(crate) fn formula_3sat_strategy() -> impl proptest::strategy::Strategy<Value = Formula> {
    use proptest::prelude::*;

    (1usize..=8).prop_flat_map(|num_variables| {
        let literal =
            (1..=num_variables, any::<bool>()).prop_map(|(v, positive)| Literal::new(Variable(v), positive));
        let clause = proptest::collection::vec(literal, 1..=3).prop_map(|literals| Clause::new(literals));
        proptest::collection::vec(clause, 1..=20).prop_map(move |clauses| Formula::new(num_variables, clauses))
    })
}
