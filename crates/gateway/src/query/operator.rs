//! Query operator kinds.

use std::fmt;

/// A named comparison or geo operator group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Plain value equality.
    Eq,
    /// Not equal.
    Ne,
    /// Less than.
    Lt,
    /// Less than or equal.
    Le,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Ge,
    /// Regular expression match.
    Like,
    /// Set membership.
    In,
    /// Within a radius (km) of a point.
    Geo,
}

impl Operator {
    /// All operators, in translation order. `Eq` comes first.
    pub const ALL: [Operator; 9] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Lt,
        Operator::Le,
        Operator::Gt,
        Operator::Ge,
        Operator::Like,
        Operator::In,
        Operator::Geo,
    ];

    /// The parameter name of this operator group.
    pub fn name(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Lt => "lt",
            Operator::Le => "le",
            Operator::Gt => "gt",
            Operator::Ge => "ge",
            Operator::Like => "like",
            Operator::In => "in",
            Operator::Geo => "geo",
        }
    }

    /// The native operator key, for operators that translate to one.
    pub fn symbol(&self) -> Option<&'static str> {
        match self {
            Operator::Eq | Operator::Geo => None,
            Operator::Ne => Some("$ne"),
            Operator::Lt => Some("$lt"),
            Operator::Le => Some("$lte"),
            Operator::Gt => Some("$gt"),
            Operator::Ge => Some("$gte"),
            Operator::Like => Some("$regex"),
            Operator::In => Some("$in"),
        }
    }

    /// Looks up an operator by parameter name.
    pub fn from_name(name: &str) -> Option<Operator> {
        Operator::ALL.into_iter().find(|op| op.name() == name)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
