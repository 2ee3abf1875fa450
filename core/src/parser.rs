//! Query-string grammar.
//!
//! ```text
//! select=title,author,cat:category_id(name)
//! age.gte=18              column.operator=value
//! status=neq.closed       column=operator.value
//! order=created_at.desc,title
//! limit=10&offset=20
//! ```
//!
//! Every non-reserved key is a filter, and every occurrence of a repeated key
//! contributes its own filter in query-string order.

use crate::{
    Ident, QueryParams, Value,
    error::{QueryError, Result},
    plan::{Filter, Operand, Operator, OrderSpec, QueryPlan, RelationSpec, Selection},
};
use serde::{Deserialize, Serialize};

pub const SELECT: &str = "select";
pub const ORDER: &str = "order";
pub const LIMIT: &str = "limit";
pub const OFFSET: &str = "offset";
pub const CONFIRM_FULL_TABLE: &str = "confirmFullTableMutation";

const RESERVED: [&str; 5] = [SELECT, ORDER, LIMIT, OFFSET, CONFIRM_FULL_TABLE];

/// What to do with `column.<token>=value` when `<token>` is not an operator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownOperatorPolicy {
    /// Treat the whole parameter as `key = value`. The dotted key then fails
    /// identifier validation, so the request is rejected as an invalid
    /// column rather than matching nothing.
    #[default]
    Equality,
    /// Fail with a parse error naming the parameter.
    Reject,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    pub unknown_operator: UnknownOperatorPolicy,
}

impl ParseOptions {
    pub const fn rejecting() -> Self {
        Self {
            unknown_operator: UnknownOperatorPolicy::Reject,
        }
    }
}

/// Parses request parameters into a [`QueryPlan`].
pub fn parse_query(params: &QueryParams, options: &ParseOptions) -> Result<QueryPlan> {
    let mut plan = QueryPlan::default();

    if let Some(select) = params.get(SELECT)
        && !select.trim().is_empty()
    {
        let (selection, relations) = parse_select(select)?;
        plan.select = selection;
        plan.relations = relations;
    }

    for (key, value) in params.iter() {
        if RESERVED.contains(&key) {
            continue;
        }
        plan.filters.push(parse_filter(key, value, options)?);
    }

    if let Some(order) = params.get(ORDER) {
        plan.order = parse_order(order)?;
    }

    plan.limit = params.get(LIMIT).and_then(parse_paging);
    plan.offset = params.get(OFFSET).and_then(parse_paging);

    plan.confirm_full_table = params
        .get(CONFIRM_FULL_TABLE)
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));

    Ok(plan)
}

/// Paging values must be non-negative and fit a SQL integer; anything else is
/// ignored rather than rejected.
fn parse_paging(raw: &str) -> Option<u64> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(|n| u64::try_from(n).ok())
}

/// Parses a single filter parameter.
pub fn parse_filter(key: &str, value: &str, options: &ParseOptions) -> Result<Filter> {
    if let Some((column, token)) = key.split_once('.') {
        match Operator::from_token(token) {
            Some(op) => return build_filter(column, op, value),
            None if options.unknown_operator == UnknownOperatorPolicy::Reject => {
                return Err(QueryError::parse(
                    key,
                    format!("unknown filter operator `{token}`"),
                ));
            }
            None => {}
        }
    }

    if let Some((token, rest)) = value.split_once('.')
        && let Some(op) = Operator::from_token(token)
    {
        return build_filter(key, op, rest);
    }

    build_filter(key, Operator::Eq, value)
}

fn build_filter(column: &str, operator: Operator, raw: &str) -> Result<Filter> {
    let column = Ident::new(column)?;
    let operand = match operator {
        Operator::Is if raw.trim().eq_ignore_ascii_case("null") => Operand::Single(Value::Null),
        Operator::Is => Operand::Single(Value::from_query_text(raw)),
        Operator::In => Operand::List(parse_list(raw)),
        _ => Operand::Single(Value::from_query_text(raw)),
    };
    Ok(Filter::new(column, operator, operand))
}

/// `(a,b,c)` or `a,b,c`
fn parse_list(raw: &str) -> Vec<Value> {
    let raw = raw.trim();
    let inner = raw
        .strip_prefix('(')
        .and_then(|r| r.strip_suffix(')'))
        .unwrap_or(raw);
    inner
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(Value::from_query_text)
        .collect()
}

/// Parses the `order` parameter: `col`, `col.asc`, `col.desc`, comma-joined.
pub fn parse_order(raw: &str) -> Result<Vec<OrderSpec>> {
    let mut order = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (column, ascending) = match part.split_once('.') {
            None => (part, true),
            Some((column, direction)) => {
                let ascending = match direction.trim().to_ascii_lowercase().as_str() {
                    "asc" => true,
                    "desc" => false,
                    other => {
                        return Err(QueryError::parse(
                            ORDER,
                            format!("unknown sort direction `{other}`"),
                        ));
                    }
                };
                (column, ascending)
            }
        };
        order.push(OrderSpec {
            column: Ident::new(column.trim())?,
            ascending,
        });
    }
    Ok(order)
}

/// Parses the `select` parameter into plain columns and embedded relations.
pub fn parse_select(raw: &str) -> Result<(Selection, Vec<RelationSpec>)> {
    let mut columns = Vec::new();
    let mut relations = Vec::new();
    let mut star = false;

    for segment in split_top_level(raw)? {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        if segment.contains('(') {
            relations.push(parse_relation(segment)?);
        } else if segment == "*" {
            star = true;
        } else {
            columns.push(Ident::new(segment)?);
        }
    }

    let selection = if star || columns.is_empty() {
        Selection::All
    } else {
        Selection::Columns(columns)
    };
    Ok((selection, relations))
}

/// `table:foreign_key(col_a,col_b)`
fn parse_relation(segment: &str) -> Result<RelationSpec> {
    let malformed = || QueryError::parse(SELECT, format!("malformed relation `{segment}`"));

    let (head, rest) = segment.split_once('(').ok_or_else(malformed)?;
    let inner = rest.strip_suffix(')').ok_or_else(malformed)?;
    let (table, foreign_key) = head.split_once(':').ok_or_else(malformed)?;

    let mut columns = Vec::new();
    let mut star = false;
    for column in inner.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        if column == "*" {
            star = true;
        } else {
            columns.push(Ident::new(column)?);
        }
    }

    Ok(RelationSpec {
        table: Ident::new(table.trim())?,
        foreign_key: Ident::new(foreign_key.trim())?,
        columns: if star || columns.is_empty() {
            Selection::All
        } else {
            Selection::Columns(columns)
        },
    })
}

/// Splits on commas outside parentheses.
fn split_top_level(raw: &str) -> Result<Vec<&str>> {
    let unbalanced = || QueryError::parse(SELECT, "unbalanced parentheses");

    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in raw.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.checked_sub(1).ok_or_else(unbalanced)?,
            ',' if depth == 0 => {
                parts.push(&raw[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(unbalanced());
    }
    parts.push(&raw[start..]);
    Ok(parts)
}
