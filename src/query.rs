//! A small SELECT builder.
//!
//! Queries are composed as values (columns, joins, conditional projections)
//! and rendered to SQL in one place. Every identifier is checked and quoted on
//! render; every value goes through a numbered placeholder.
//!
//! ```rust
//! use translation_store::query::{Condition, Expr, Join, Params, Select};
//!
//! let mut params = Params::new();
//! let locale = params.bind("de".to_string());
//! let select = Select::from("collections")
//!     .column(Expr::column("collections", "id"), None)
//!     .join(Join::left(
//!         "translations",
//!         "t1_name",
//!         Condition::eq(Expr::column("t1_name", "locale"), locale),
//!     ));
//!
//! assert_eq!(
//!     select.to_sql().unwrap(),
//!     "SELECT \"collections\".\"id\" FROM \"collections\" \
//!      LEFT OUTER JOIN \"translations\" AS \"t1_name\" ON \"t1_name\".\"locale\" = ?1"
//! );
//! ```

use crate::error::{Result, TranslationError};
use rusqlite::types::{ToSqlOutput, Value};
use std::rc::Rc;

/// Quote an identifier after checking it only contains `[A-Za-z0-9_]`.
pub fn quote_ident(name: &str) -> Result<String> {
    let valid = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(TranslationError::UnsafeIdentifier(name.to_string()));
    }
    Ok(format!("\"{}\"", name))
}

/// Positional parameters collected while building a query.
///
/// A parameter is either a scalar or a whole list bound through the
/// `rarray()` table-valued function, so a list of any length costs one
/// placeholder.
#[derive(Debug, Default, Clone)]
pub struct Params {
    values: Vec<ToSqlOutput<'static>>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value and return the placeholder expression that refers to it.
    pub fn bind(&mut self, value: impl Into<Value>) -> Expr {
        self.values.push(ToSqlOutput::Owned(value.into()));
        Expr::Param(self.values.len())
    }

    /// Add a list for use with [`Condition::InArray`].
    pub fn bind_array(&mut self, values: Vec<Value>) -> Expr {
        self.values.push(ToSqlOutput::Array(Rc::new(values)));
        Expr::Param(self.values.len())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<ToSqlOutput<'static>> {
        self.values
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Column { table: String, column: String },
    /// 1-based placeholder index
    Param(usize),
    /// A string literal; only for fixed values such as `''`
    Literal(&'static str),
    Coalesce(Vec<Expr>),
    NullIf(Box<Expr>, Box<Expr>),
    Case {
        when: Box<Condition>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
}

impl Expr {
    pub fn column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Expr::Column {
            table: table.into(),
            column: column.into(),
        }
    }

    pub fn case(when: Condition, then: Expr, otherwise: Expr) -> Self {
        Expr::Case {
            when: Box::new(when),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    pub fn null_if(value: Expr, null_value: Expr) -> Self {
        Expr::NullIf(Box::new(value), Box::new(null_value))
    }

    fn render(&self, out: &mut String) -> Result<()> {
        match self {
            Expr::Column { table, column } => {
                out.push_str(&quote_ident(table)?);
                out.push('.');
                out.push_str(&quote_ident(column)?);
            }
            Expr::Param(index) => {
                out.push('?');
                out.push_str(&index.to_string());
            }
            Expr::Literal(text) => {
                out.push('\'');
                out.push_str(&text.replace('\'', "''"));
                out.push('\'');
            }
            Expr::Coalesce(args) => {
                out.push_str("COALESCE(");
                render_list(args, out)?;
                out.push(')');
            }
            Expr::NullIf(value, null_value) => {
                out.push_str("NULLIF(");
                value.render(out)?;
                out.push_str(", ");
                null_value.render(out)?;
                out.push(')');
            }
            Expr::Case {
                when,
                then,
                otherwise,
            } => {
                out.push_str("CASE WHEN ");
                when.render(out)?;
                out.push_str(" THEN ");
                then.render(out)?;
                out.push_str(" ELSE ");
                otherwise.render(out)?;
                out.push_str(" END");
            }
        }
        Ok(())
    }
}

fn render_list(exprs: &[Expr], out: &mut String) -> Result<()> {
    for (i, expr) in exprs.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        expr.render(out)?;
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(Expr, Expr),
    NotEq(Expr, Expr),
    IsNotNull(Expr),
    /// `<expr> IN rarray(<param>)`; the parameter must come from
    /// [`Params::bind_array`]
    InArray(Expr, Expr),
    And(Vec<Condition>),
}

impl Condition {
    pub fn eq(left: Expr, right: Expr) -> Self {
        Condition::Eq(left, right)
    }

    pub fn not_eq(left: Expr, right: Expr) -> Self {
        Condition::NotEq(left, right)
    }

    pub fn and(conditions: Vec<Condition>) -> Self {
        Condition::And(conditions)
    }

    fn render(&self, out: &mut String) -> Result<()> {
        match self {
            Condition::Eq(left, right) => {
                left.render(out)?;
                out.push_str(" = ");
                right.render(out)?;
            }
            Condition::NotEq(left, right) => {
                left.render(out)?;
                out.push_str(" <> ");
                right.render(out)?;
            }
            Condition::IsNotNull(expr) => {
                expr.render(out)?;
                out.push_str(" IS NOT NULL");
            }
            Condition::InArray(expr, list) => {
                expr.render(out)?;
                out.push_str(" IN rarray(");
                list.render(out)?;
                out.push(')');
            }
            Condition::And(conditions) => {
                out.push('(');
                for (i, condition) in conditions.iter().enumerate() {
                    if i > 0 {
                        out.push_str(" AND ");
                    }
                    condition.render(out)?;
                }
                out.push(')');
            }
        }
        Ok(())
    }
}

/// `LEFT OUTER JOIN <table> AS <alias> ON <condition>`
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub table: String,
    pub alias: String,
    pub on: Condition,
}

impl Join {
    pub fn left(table: impl Into<String>, alias: impl Into<String>, on: Condition) -> Self {
        Self {
            table: table.into(),
            alias: alias.into(),
            on,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub columns: Vec<(Expr, Option<String>)>,
    pub from: String,
    pub joins: Vec<Join>,
    pub filter: Option<Condition>,
}

impl Select {
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            columns: Vec::new(),
            from: table.into(),
            joins: Vec::new(),
            filter: None,
        }
    }

    pub fn column(mut self, expr: Expr, alias: Option<String>) -> Self {
        self.columns.push((expr, alias));
        self
    }

    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    pub fn filter(mut self, condition: Condition) -> Self {
        self.filter = Some(condition);
        self
    }

    pub fn to_sql(&self) -> Result<String> {
        let mut out = String::from("SELECT ");
        for (i, (expr, alias)) in self.columns.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            expr.render(&mut out)?;
            if let Some(alias) = alias {
                out.push_str(" AS ");
                out.push_str(&quote_ident(alias)?);
            }
        }

        out.push_str(" FROM ");
        out.push_str(&quote_ident(&self.from)?);

        for join in &self.joins {
            out.push_str(" LEFT OUTER JOIN ");
            out.push_str(&quote_ident(&join.table)?);
            out.push_str(" AS ");
            out.push_str(&quote_ident(&join.alias)?);
            out.push_str(" ON ");
            join.on.render(&mut out)?;
        }

        if let Some(filter) = &self.filter {
            out.push_str(" WHERE ");
            filter.render(&mut out)?;
        }
        Ok(out)
    }
}
