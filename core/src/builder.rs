//! Compiles a [`QueryPlan`] and request records into [`SQL`].
//!
//! Table and column names come in as [`Ident`]s and are written unquoted;
//! every value is a bound parameter. The output is still marker-neutral, but
//! the few constructs whose spelling differs by backend (`ILIKE`, `OFFSET`
//! without `LIMIT`) are decided here from the builder's [`Dialect`].

use crate::{
    Ident, Record, Value,
    dialect::Dialect,
    error::{QueryError, Result},
    plan::{Filter, Operand, Operator, OrderSpec, QueryPlan, Selection},
    sql::{SQL, SQLChunk, Token},
};

#[derive(Clone, Copy)]
pub struct QueryBuilder<'d> {
    dialect: &'d dyn Dialect,
}

impl<'d> QueryBuilder<'d> {
    pub fn new(dialect: &'d dyn Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> &'d dyn Dialect {
        self.dialect
    }

    /// `SELECT cols FROM table [WHERE ...] [ORDER BY ...] [LIMIT ?] [OFFSET ?]`
    pub fn select(&self, table: &Ident, plan: &QueryPlan) -> SQL {
        self.select_from(table, &plan.select)
            .append(self.where_clause(&plan.filters))
            .append(order_by(&plan.order))
            .append(self.paging(plan.limit, plan.offset))
    }

    /// `SELECT cols FROM table`
    pub fn select_from(&self, table: &Ident, selection: &Selection) -> SQL {
        SQL::token(Token::SELECT)
            .append(columns(selection))
            .push(Token::FROM)
            .push(table)
    }

    /// `WHERE a AND b ...`, or nothing for no filters.
    pub fn where_clause(&self, filters: &[Filter]) -> SQL {
        if filters.is_empty() {
            return SQL::empty();
        }
        SQL::token(Token::WHERE).append(SQL::join(
            filters.iter().map(|f| self.condition(f)),
            Token::AND,
        ))
    }

    /// A single filter condition.
    pub fn condition(&self, filter: &Filter) -> SQL {
        let column = &filter.column;
        match (filter.operator, &filter.operand) {
            (Operator::Is, Operand::Single(Value::Null)) => {
                SQL::ident(column).push(Token::IS).push(Token::NULL)
            }
            (Operator::Is, _) => SQL::ident(column)
                .push(Token::IS)
                .push(Token::NOT)
                .push(Token::NULL),
            (Operator::In, Operand::List(values)) if values.is_empty() => SQL::raw("1 = 0"),
            (Operator::In, Operand::List(values)) => SQL::ident(column)
                .push(Token::IN)
                .append(SQL::param_list(values.iter().cloned()).parens()),
            (Operator::In, Operand::Single(value)) => SQL::ident(column)
                .push(Token::IN)
                .append(SQL::param(value.clone()).parens()),
            (Operator::Ilike, operand) if !self.dialect.native_ilike() => SQL::raw("UPPER(")
                .push(column)
                .push(Token::RPAREN)
                .push(Token::LIKE)
                .push(SQLChunk::Raw("UPPER(".into()))
                .push(single(operand))
                .push(Token::RPAREN),
            (op, operand) => SQL::ident(column)
                .push(comparison_token(op))
                .push(single(operand)),
        }
    }

    /// `LIMIT ? [OFFSET ?]`.
    ///
    /// Dialects that only accept `OFFSET` after `LIMIT` get `LIMIT -1` when
    /// just an offset is requested.
    pub fn paging(&self, limit: Option<u64>, offset: Option<u64>) -> SQL {
        let mut sql = SQL::empty();
        match limit {
            Some(limit) => sql.push_mut(Token::LIMIT),
            None if offset.is_some() && self.dialect.offset_requires_limit() => {
                sql.push_mut(Token::LIMIT);
                sql.push_mut(SQLChunk::Raw("-1".into()));
            }
            None => {}
        }
        if let Some(limit) = limit {
            sql.push_mut(Value::from(limit));
        }
        if let Some(offset) = offset {
            sql.push_mut(Token::OFFSET);
            sql.push_mut(Value::from(offset));
        }
        sql
    }

    /// `INSERT INTO table (a, b) VALUES (?, ?)`
    pub fn insert(&self, table: &Ident, record: &Record) -> SQL {
        let head = SQL::token(Token::INSERT).push(Token::INTO).push(table);
        if record.is_empty() {
            return head.push(SQLChunk::Raw("DEFAULT VALUES".into()));
        }
        head.append(SQL::ident_list(record.columns()).parens())
            .push(Token::VALUES)
            .append(SQL::param_list(record.values().cloned()).parens())
    }

    /// `UPDATE table SET a = ?, b = ? [WHERE ...]`
    pub fn update(&self, table: &Ident, record: &Record, filters: &[Filter]) -> Result<SQL> {
        if record.is_empty() {
            return Err(QueryError::InvalidBody("no columns to update".to_string()));
        }
        let assignments = SQL::join(
            record.iter().map(|(column, value)| {
                SQL::ident(column)
                    .push(Token::EQ)
                    .push(value.clone())
            }),
            Token::COMMA,
        );
        Ok(SQL::token(Token::UPDATE)
            .push(table)
            .push(Token::SET)
            .append(assignments)
            .append(self.where_clause(filters)))
    }

    /// `DELETE FROM table [WHERE ...]`
    pub fn delete(&self, table: &Ident, filters: &[Filter]) -> SQL {
        SQL::token(Token::DELETE)
            .push(Token::FROM)
            .push(table)
            .append(self.where_clause(filters))
    }

    /// `SELECT COUNT(*) FROM table WHERE id = ?`
    pub fn count_by_id(&self, table: &Ident, id: Value) -> SQL {
        SQL::token(Token::SELECT)
            .push(SQLChunk::Raw("COUNT(*)".into()))
            .push(Token::FROM)
            .push(table)
            .append(self.where_clause(&[Filter::eq(Ident::id(), id)]))
    }

    /// `SELECT cols FROM table WHERE id = ?`
    pub fn select_by_id(&self, table: &Ident, selection: &Selection, id: Value) -> SQL {
        self.select_from(table, selection)
            .append(self.where_clause(&[Filter::eq(Ident::id(), id)]))
    }

    /// `SELECT cols FROM table WHERE id IN (?, ...)`
    pub fn select_by_ids(&self, table: &Ident, selection: &Selection, ids: &[Value]) -> SQL {
        let filter = Filter::new(Ident::id(), Operator::In, Operand::List(ids.to_vec()));
        self.select_from(table, selection)
            .append(self.where_clause(&[filter]))
    }
}

fn columns(selection: &Selection) -> SQL {
    match selection {
        Selection::All => SQL::token(Token::STAR),
        Selection::Columns(cols) if cols.is_empty() => SQL::token(Token::STAR),
        Selection::Columns(cols) => SQL::ident_list(cols),
    }
}

/// `ORDER BY a ASC, b DESC`, or nothing.
fn order_by(order: &[OrderSpec]) -> SQL {
    if order.is_empty() {
        return SQL::empty();
    }
    let terms = order.iter().map(|o| {
        SQL::ident(&o.column).push(if o.ascending { Token::ASC } else { Token::DESC })
    });
    SQL::token(Token::ORDER)
        .push(Token::BY)
        .append(SQL::join(terms, Token::COMMA))
}

const fn comparison_token(op: Operator) -> Token {
    match op {
        Operator::Neq => Token::NE,
        Operator::Gt => Token::GT,
        Operator::Gte => Token::GE,
        Operator::Lt => Token::LT,
        Operator::Lte => Token::LE,
        Operator::Like => Token::LIKE,
        Operator::Ilike => Token::ILIKE,
        // `is` and `in` are handled before this point
        Operator::Eq | Operator::Is | Operator::In => Token::EQ,
    }
}

/// Scalar bound for a comparison. A list only reaches here when built by
/// hand; it binds as its comma-joined text, like the raw query value would.
fn single(operand: &Operand) -> Value {
    match operand {
        Operand::Single(value) => value.clone(),
        Operand::List(values) => Value::Text(
            values
                .iter()
                .map(|v| match v {
                    Value::Text(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
        ),
    }
}
