//! The parsed form of a request's query string.

use crate::{Ident, Value};
use core::fmt;

/// Comparison operator of a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    Ilike,
    Is,
    In,
}

impl Operator {
    pub const ALL: [Operator; 10] = [
        Operator::Eq,
        Operator::Neq,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::Like,
        Operator::Ilike,
        Operator::Is,
        Operator::In,
    ];

    /// Looks up the wire token. `not` is accepted as an alias of `neq`.
    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "eq" => Operator::Eq,
            "neq" | "not" => Operator::Neq,
            "gt" => Operator::Gt,
            "gte" => Operator::Gte,
            "lt" => Operator::Lt,
            "lte" => Operator::Lte,
            "like" => Operator::Like,
            "ilike" => Operator::Ilike,
            "is" => Operator::Is,
            "in" => Operator::In,
            _ => return None,
        })
    }

    pub const fn as_token(self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Neq => "neq",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Like => "like",
            Operator::Ilike => "ilike",
            Operator::Is => "is",
            Operator::In => "in",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

/// Right-hand side of a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Single(Value),
    /// Produced by `in`
    List(Vec<Value>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: Ident,
    pub operator: Operator,
    pub operand: Operand,
}

impl Filter {
    pub fn new(column: Ident, operator: Operator, operand: Operand) -> Self {
        Self {
            column,
            operator,
            operand,
        }
    }

    /// Shorthand for an equality filter.
    pub fn eq(column: Ident, value: impl Into<Value>) -> Self {
        Self::new(column, Operator::Eq, Operand::Single(value.into()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSpec {
    pub column: Ident,
    pub ascending: bool,
}

/// Column list of a `SELECT`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    All,
    Columns(Vec<Ident>),
}

impl Selection {
    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }

    /// Whether rows fetched with this selection carry `column`.
    pub fn includes(&self, column: &Ident) -> bool {
        match self {
            Selection::All => true,
            Selection::Columns(columns) => columns.contains(column),
        }
    }
}

/// An embedded relation requested as `table:foreign_key(col_a,col_b)`.
///
/// Resolved after the main query by looking up `table.id = row[foreign_key]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationSpec {
    pub table: Ident,
    pub foreign_key: Ident,
    pub columns: Selection,
}

/// Everything a read or a filtered write needs from the query string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPlan {
    pub select: Selection,
    pub filters: Vec<Filter>,
    pub order: Vec<OrderSpec>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub relations: Vec<RelationSpec>,
    /// `confirmFullTableMutation=true` was passed
    pub confirm_full_table: bool,
}

impl QueryPlan {
    pub fn has_filters(&self) -> bool {
        !self.filters.is_empty()
    }

    pub fn has_relations(&self) -> bool {
        !self.relations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_tokens_round_trip() {
        for op in Operator::ALL {
            assert_eq!(Operator::from_token(op.as_token()), Some(op));
        }
        assert_eq!(Operator::from_token("not"), Some(Operator::Neq));
        assert_eq!(Operator::from_token("EQ"), None);
        assert_eq!(Operator::from_token("bogus"), None);
    }

    #[test]
    fn selection_includes() {
        let id = Ident::new("id").unwrap();
        let name = Ident::new("name").unwrap();
        assert!(Selection::All.includes(&id));
        let cols = Selection::Columns(vec![name.clone()]);
        assert!(cols.includes(&name));
        assert!(!cols.includes(&id));
    }
}
