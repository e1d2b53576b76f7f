//! SQL inspection logic for the statement guard.
//!
//! Uses sqlparser-rs with the PostgreSQL dialect to look inside candidate
//! statements before they reach the store.

use sqlparser::ast::{Query, SetExpr, Statement, TableFactor, TableWithJoins};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;
use std::collections::HashSet;

use crate::db::Schema;
use crate::error::{ParleyError, Result};

use super::{leading_keyword, ALLOWED_KEYWORDS};

/// Checks a candidate statement against the read-only policy.
///
/// Rejections are reported as execution-class errors raised before the
/// store is touched:
/// - leading keyword not in the allow-list (SELECT/WITH),
/// - more than one statement,
/// - data-modifying CTEs anywhere in the query,
/// - referenced tables missing from the schema descriptor.
///
/// A statement that fails to parse passes the keyword check alone; its
/// syntax is left for the store to judge.
pub fn check_statement(sql: &str, schema: &Schema) -> Result<()> {
    let Some(keyword) = leading_keyword(sql) else {
        return Err(ParleyError::execution(
            "statement does not begin with a SQL keyword",
        ));
    };

    if !ALLOWED_KEYWORDS.contains(&keyword.as_str()) {
        return Err(ParleyError::execution(format!(
            "refusing to execute {keyword} statement; only read queries are allowed"
        )));
    }

    let statements = match Parser::parse_sql(&PostgreSqlDialect {}, sql) {
        Ok(statements) => statements,
        // Syntax is the store's call.
        Err(_) => return Ok(()),
    };

    if statements.len() > 1 {
        return Err(ParleyError::execution(format!(
            "refusing to execute {} statements in one request",
            statements.len()
        )));
    }

    let Some(statement) = statements.first() else {
        return Ok(());
    };

    match statement {
        Statement::Query(query) => {
            if let Some(op) = find_mutation(query) {
                return Err(ParleyError::execution(format!(
                    "refusing to execute query containing a {op} expression"
                )));
            }
            check_tables(query, schema)
        }
        _ => Err(ParleyError::execution(
            "refusing to execute non-query statement; only read queries are allowed",
        )),
    }
}

/// Finds a data-modifying operation anywhere in the query, including CTEs.
fn find_mutation(query: &Query) -> Option<&'static str> {
    if let Some(with) = &query.with {
        for cte in &with.cte_tables {
            if let Some(op) = find_mutation(&cte.query) {
                return Some(op);
            }
        }
    }

    set_expr_mutation(&query.body)
}

fn set_expr_mutation(set_expr: &SetExpr) -> Option<&'static str> {
    match set_expr {
        SetExpr::Insert(_) => Some("INSERT"),
        SetExpr::Update(_) => Some("UPDATE"),
        SetExpr::Delete(_) => Some("DELETE"),
        SetExpr::Merge(_) => Some("MERGE"),

        SetExpr::Query(query) => find_mutation(query),

        SetExpr::Select(select) => select.from.iter().find_map(table_with_joins_mutation),

        SetExpr::SetOperation { left, right, .. } => {
            set_expr_mutation(left).or_else(|| set_expr_mutation(right))
        }

        SetExpr::Values(_) | SetExpr::Table(_) => None,
    }
}

fn table_with_joins_mutation(twj: &TableWithJoins) -> Option<&'static str> {
    table_factor_mutation(&twj.relation)
        .or_else(|| twj.joins.iter().find_map(|j| table_factor_mutation(&j.relation)))
}

fn table_factor_mutation(factor: &TableFactor) -> Option<&'static str> {
    match factor {
        TableFactor::Derived { subquery, .. } => find_mutation(subquery),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => table_with_joins_mutation(table_with_joins),
        _ => None,
    }
}

/// Verifies every referenced table is either a CTE or in the descriptor.
fn check_tables(query: &Query, schema: &Schema) -> Result<()> {
    let mut ctes = HashSet::new();
    let mut tables = Vec::new();
    collect_query_tables(query, &mut ctes, &mut tables);

    for name in tables {
        if !ctes.contains(&name.to_lowercase()) && !schema.contains_table(&name) {
            return Err(ParleyError::execution(format!(
                "table '{name}' is not part of the queryable schema"
            )));
        }
    }

    Ok(())
}

fn collect_query_tables(query: &Query, ctes: &mut HashSet<String>, tables: &mut Vec<String>) {
    if let Some(with) = &query.with {
        for cte in &with.cte_tables {
            ctes.insert(cte.alias.name.value.to_lowercase());
            collect_query_tables(&cte.query, ctes, tables);
        }
    }

    collect_set_expr_tables(&query.body, ctes, tables);
}

fn collect_set_expr_tables(
    set_expr: &SetExpr,
    ctes: &mut HashSet<String>,
    tables: &mut Vec<String>,
) {
    match set_expr {
        SetExpr::Select(select) => {
            for twj in &select.from {
                collect_table_with_joins(twj, ctes, tables);
            }
        }
        SetExpr::Query(query) => collect_query_tables(query, ctes, tables),
        SetExpr::SetOperation { left, right, .. } => {
            collect_set_expr_tables(left, ctes, tables);
            collect_set_expr_tables(right, ctes, tables);
        }
        _ => {}
    }
}

fn collect_table_with_joins(
    twj: &TableWithJoins,
    ctes: &mut HashSet<String>,
    tables: &mut Vec<String>,
) {
    collect_table_factor(&twj.relation, ctes, tables);
    for join in &twj.joins {
        collect_table_factor(&join.relation, ctes, tables);
    }
}

fn collect_table_factor(
    factor: &TableFactor,
    ctes: &mut HashSet<String>,
    tables: &mut Vec<String>,
) {
    match factor {
        TableFactor::Table { name, .. } => {
            if let Some(ident) = name.0.last() {
                tables.push(ident.value.clone());
            }
        }
        TableFactor::Derived { subquery, .. } => collect_query_tables(subquery, ctes, tables),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => collect_table_with_joins(table_with_joins, ctes, tables),
        _ => {}
    }
}
