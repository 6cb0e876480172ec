//! Parameter marshaling for db-relay.
//!
//! Callers supply an ordered name/value bag. The MySQL wire protocol only
//! knows positional `?` placeholders, so `@name` references in the command
//! text are rewritten to placeholders and the matching values are collected
//! in occurrence order. Stored-procedure calls bind the bag positionally in
//! declared order instead.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::db::Value;
use crate::error::{RelayError, Result};

/// A named parameter supplied by the caller.
///
/// Values pass through to the driver unconverted unless `declared_type` is
/// set, in which case the value is coerced before binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name, referenced from the command text as `@name`.
    pub name: String,

    /// Parameter value.
    pub value: Value,

    /// Optional driver type to coerce the value to before binding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_type: Option<ParamType>,
}

impl Parameter {
    /// Creates a parameter without a declared type.
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            declared_type: None,
        }
    }

    /// Creates a parameter coerced to the given driver type at bind time.
    pub fn typed(name: impl Into<String>, value: impl Into<Value>, ty: ParamType) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            declared_type: Some(ty),
        }
    }

    /// Returns the value that will be bound, applying the declared type.
    pub fn bound_value(&self) -> Result<Value> {
        match self.declared_type {
            None => Ok(self.value.clone()),
            Some(ty) => ty
                .coerce(&self.value)
                .map_err(|e| RelayError::execution(format!("parameter '{}': {}", self.name, e))),
        }
    }
}

/// Driver types a parameter value can be coerced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Bool,
    Int,
    Float,
    Decimal,
    Text,
    Bytes,
    Date,
    DateTime,
}

impl ParamType {
    /// Coerces a value to this type. NULL passes through untouched.
    fn coerce(self, value: &Value) -> std::result::Result<Value, String> {
        if value.is_null() {
            return Ok(Value::Null);
        }

        match self {
            Self::Bool => match value {
                Value::Bool(b) => Ok(Value::Bool(*b)),
                Value::Int(i) => Ok(Value::Bool(*i != 0)),
                Value::UInt(u) => Ok(Value::Bool(*u != 0)),
                Value::String(s) => match s.to_lowercase().as_str() {
                    "true" | "1" => Ok(Value::Bool(true)),
                    "false" | "0" => Ok(Value::Bool(false)),
                    _ => Err(format!("'{s}' is not a boolean")),
                },
                other => Err(format!("cannot coerce {other:?} to bool")),
            },
            Self::Int => match value {
                Value::Int(i) => Ok(Value::Int(*i)),
                Value::UInt(u) => i64::try_from(*u)
                    .map(Value::Int)
                    .map_err(|_| format!("{u} does not fit a signed integer")),
                Value::Decimal(d) => d
                    .to_i64()
                    .map(Value::Int)
                    .ok_or_else(|| format!("{d} does not fit an integer")),
                Value::String(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(Value::Int)
                    .map_err(|_| format!("'{s}' is not an integer")),
                other => Err(format!("cannot coerce {other:?} to integer")),
            },
            Self::Float => match value {
                Value::Float(f) => Ok(Value::Float(*f)),
                Value::Int(i) => Ok(Value::Float(*i as f64)),
                Value::UInt(u) => Ok(Value::Float(*u as f64)),
                Value::Decimal(d) => d
                    .to_f64()
                    .map(Value::Float)
                    .ok_or_else(|| format!("{d} does not fit a float")),
                Value::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .map(Value::Float)
                    .map_err(|_| format!("'{s}' is not a number")),
                other => Err(format!("cannot coerce {other:?} to float")),
            },
            Self::Decimal => match value {
                Value::Decimal(d) => Ok(Value::Decimal(*d)),
                Value::Int(i) => Ok(Value::Decimal(Decimal::from(*i))),
                Value::UInt(u) => Ok(Value::Decimal(Decimal::from(*u))),
                Value::Float(f) => Decimal::from_f64(*f)
                    .map(Value::Decimal)
                    .ok_or_else(|| format!("{f} is not representable as decimal")),
                Value::String(s) => Decimal::from_str(s.trim())
                    .map(Value::Decimal)
                    .map_err(|_| format!("'{s}' is not a decimal")),
                other => Err(format!("cannot coerce {other:?} to decimal")),
            },
            Self::Text => Ok(Value::String(value.to_display_string())),
            Self::Bytes => match value {
                Value::Bytes(b) => Ok(Value::Bytes(b.clone())),
                Value::String(s) => Ok(Value::Bytes(s.clone().into_bytes())),
                other => Err(format!("cannot coerce {other:?} to bytes")),
            },
            Self::Date => match value {
                Value::Date(d) => Ok(Value::Date(*d)),
                Value::DateTime(dt) => Ok(Value::Date(dt.date())),
                Value::String(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                    .map(Value::Date)
                    .map_err(|_| format!("'{s}' is not a date (expected YYYY-MM-DD)")),
                other => Err(format!("cannot coerce {other:?} to date")),
            },
            Self::DateTime => match value {
                Value::DateTime(dt) => Ok(Value::DateTime(*dt)),
                Value::DateTimeTz(dt) => Ok(Value::DateTime(dt.naive_utc())),
                Value::Date(d) => Ok(Value::DateTime(d.and_hms_opt(0, 0, 0).unwrap())),
                Value::String(s) => parse_datetime(s.trim())
                    .map(Value::DateTime)
                    .ok_or_else(|| format!("'{s}' is not a timestamp")),
                other => Err(format!("cannot coerce {other:?} to datetime")),
            },
        }
    }
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.naive_utc())
                .ok()
        })
}

/// A statement ready for the driver: positional SQL, ordered values, and a
/// command timeout (`None` = unlimited).
#[derive(Debug, Clone)]
pub struct Statement {
    /// SQL text with `?` placeholders.
    pub sql: String,

    /// Values to bind, in placeholder order.
    pub values: Vec<Value>,

    /// Command timeout; `None` when the caller asked for 0 seconds.
    pub timeout: Option<Duration>,
}

impl Statement {
    /// Builds a statement from free-form SQL with `@name` references.
    pub fn text(sql: &str, params: &[Parameter], timeout: Option<Duration>) -> Result<Self> {
        let bound = bound_pairs(params)?;
        let (sql, values) = rewrite_named(sql, &bound)?;
        Ok(Self {
            sql,
            values,
            timeout,
        })
    }

    /// Builds a `CALL name(?, …)` statement for a stored procedure, binding
    /// the parameter bag positionally in declared order.
    ///
    /// Text that already spells out a CALL is rewritten like free-form SQL so
    /// that `@name` references keep working; a name carrying its own argument
    /// list, e.g. `GetById(@id)`, gets the `CALL` prefix added.
    pub fn procedure(text: &str, params: &[Parameter], timeout: Option<Duration>) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.to_lowercase().starts_with("call ") {
            return Self::text(trimmed, params, timeout);
        }
        if trimmed.contains('(') {
            return Self::text(&format!("CALL {trimmed}"), params, timeout);
        }

        let bound = bound_pairs(params)?;
        let placeholders = vec!["?"; bound.len()].join(", ");
        let sql = if bound.is_empty() {
            format!("CALL {trimmed}()")
        } else {
            format!("CALL {trimmed}({placeholders})")
        };
        Ok(Self {
            sql,
            values: bound.into_iter().map(|(_, v)| v).collect(),
            timeout,
        })
    }
}

fn bound_pairs(params: &[Parameter]) -> Result<Vec<(String, Value)>> {
    params
        .iter()
        .map(|p| p.bound_value().map(|v| (p.name.clone(), v)))
        .collect()
}

/// Rewrites `@name` references to `?` placeholders, collecting the matching
/// values in occurrence order. References inside string literals, quoted
/// identifiers, and comments are left alone, as are `@@system` variables.
fn rewrite_named(sql: &str, params: &[(String, Value)]) -> Result<(String, Vec<Value>)> {
    let mut out = String::with_capacity(sql.len());
    let mut values = Vec::new();
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' | '`' => {
                out.push(c);
                copy_until_quote(&mut chars, &mut out, c);
            }
            '-' if chars.peek() == Some(&'-') => {
                out.push(c);
                for c in chars.by_ref() {
                    out.push(c);
                    if c == '\n' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                out.push(c);
                out.push(chars.next().unwrap());
                let mut prev = ' ';
                for c in chars.by_ref() {
                    out.push(c);
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            '@' if chars.peek() == Some(&'@') => {
                // System variable, not a parameter.
                out.push(c);
                out.push(chars.next().unwrap());
            }
            '@' if chars.peek().is_some_and(|c| is_ident_char(*c)) => {
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if is_ident_char(c) {
                        name.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let (_, value) = params
                    .iter()
                    .find(|(n, _)| n.eq_ignore_ascii_case(&name))
                    .ok_or_else(|| {
                        RelayError::execution(format!("no value bound for parameter '@{name}'"))
                    })?;
                out.push('?');
                values.push(value.clone());
            }
            _ => out.push(c),
        }
    }

    Ok((out, values))
}

fn copy_until_quote(chars: &mut std::iter::Peekable<std::str::Chars>, out: &mut String, quote: char) {
    while let Some(c) = chars.next() {
        out.push(c);
        if c == '\\' && quote != '`' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else if c == quote {
            break;
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
