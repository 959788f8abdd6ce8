//! Named-parameter processing.
//!
//! SQL is written with `:name` tokens. [`extract_names`] finds them, [`rewrite`]
//! replaces each with positional markers in the driver's [`PlaceholderStyle`], and
//! [`bind_values`] lists the values in the order those markers appear. The scan is
//! purely lexical: nothing about the surrounding SQL is validated or understood.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::ops::Range;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::conversion::ConverterRegistry;
use crate::error::NimbleError;
use crate::types::Value;

lazy_static! {
    static ref PARAM_TOKEN: Regex = Regex::new(r":([A-Za-z0-9_]+)").unwrap();
}

/// Positional marker syntax emitted by [`rewrite`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderStyle {
    /// Bare `?` markers.
    #[default]
    Question,
    /// SQLite numbered markers: `?1`, `?2`, ...
    NumberedQuestion,
    /// PostgreSQL markers: `$1`, `$2`, ...
    Dollar,
}

impl PlaceholderStyle {
    /// Append the marker for the `position`-th bound value (1-based).
    fn push_marker(self, out: &mut String, position: usize) {
        match self {
            PlaceholderStyle::Question => out.push('?'),
            PlaceholderStyle::NumberedQuestion => {
                let _ = write!(out, "?{position}");
            }
            PlaceholderStyle::Dollar => {
                let _ = write!(out, "${position}");
            }
        }
    }
}

/// One `:name` occurrence in the SQL text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamToken {
    /// Name without the leading colon
    pub name: String,
    /// Byte range of the whole token, colon included
    pub range: Range<usize>,
}

/// Tokens of a SQL string in order of appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedQuery {
    tokens: Vec<ParamToken>,
}

impl ParsedQuery {
    #[must_use]
    pub fn tokens(&self) -> &[ParamToken] {
        &self.tokens
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Names in order of appearance, repeats included.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(|t| t.name.as_str())
    }

    /// Distinct names in order of first appearance.
    #[must_use]
    pub fn distinct_names(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for name in self.names() {
            if !seen.contains(&name) {
                seen.push(name);
            }
        }
        seen
    }
}

/// Scan `sql` for `:name` tokens.
#[must_use]
pub fn extract_names(sql: &str) -> ParsedQuery {
    let tokens = PARAM_TOKEN
        .captures_iter(sql)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.get(1)?;
            Some(ParamToken {
                name: name.as_str().to_string(),
                range: whole.range(),
            })
        })
        .collect();
    ParsedQuery { tokens }
}

/// Replace every token with positional markers.
///
/// A token whose value is a list of `n` elements becomes `n` comma-joined
/// markers (one for an empty list); any other token, including one with no
/// value at all, becomes a single marker. Text between tokens is copied as is.
#[must_use]
pub fn rewrite(
    sql: &str,
    parsed: &ParsedQuery,
    values: &HashMap<String, Value>,
    style: PlaceholderStyle,
) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut cursor = 0;
    let mut position = 0;

    for token in &parsed.tokens {
        out.push_str(&sql[cursor..token.range.start]);
        let count = values.get(&token.name).map_or(1, Value::marker_count);
        for i in 0..count {
            if i > 0 {
                out.push(',');
            }
            position += 1;
            style.push_marker(&mut out, position);
        }
        cursor = token.range.end;
    }
    out.push_str(&sql[cursor..]);
    out
}

/// Values for the markers produced by [`rewrite`], in marker order, each passed
/// through the registry's to-storage conversion.
///
/// # Errors
///
/// Returns `NimbleError::BindingError` naming the first token with no value, or
/// any error raised by a to-storage converter.
pub fn bind_values(
    parsed: &ParsedQuery,
    values: &HashMap<String, Value>,
    registry: &ConverterRegistry,
) -> Result<Vec<Value>, NimbleError> {
    let mut bound = Vec::with_capacity(parsed.len());
    for token in &parsed.tokens {
        let value = values
            .get(&token.name)
            .ok_or_else(|| NimbleError::binding(&token.name, "no value supplied"))?;
        match value {
            Value::List(items) if items.is_empty() => bound.push(Value::Null),
            Value::List(items) => {
                for item in items {
                    bound.push(registry.to_storage(item.clone())?);
                }
            }
            other => bound.push(registry.to_storage(other.clone())?),
        }
    }
    Ok(bound)
}

/// Rewritten SQL plus its positional values.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedSql {
    pub sql: String,
    pub values: Vec<Value>,
}

/// Extract, rewrite, and bind in one step.
///
/// # Errors
///
/// Same as [`bind_values`].
pub fn prepare_sql(
    sql: &str,
    values: &HashMap<String, Value>,
    style: PlaceholderStyle,
    registry: &ConverterRegistry,
) -> Result<PreparedSql, NimbleError> {
    let parsed = extract_names(sql);
    let bound = bind_values(&parsed, values, registry)?;
    Ok(PreparedSql {
        sql: rewrite(sql, &parsed, values, style),
        values: bound,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: Vec<(&str, Value)>) -> HashMap<String, Value> {
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn extracts_names_with_ranges() {
        let sql = "select * from t where a = :a and b_1 = :b_1";
        let parsed = extract_names(sql);
        assert_eq!(parsed.names().collect::<Vec<_>>(), vec!["a", "b_1"]);
        let first = &parsed.tokens()[0];
        assert_eq!(&sql[first.range.clone()], ":a");
        let second = &parsed.tokens()[1];
        assert_eq!(&sql[second.range.clone()], ":b_1");
    }

    #[test]
    fn list_values_expand_in_place() {
        let sql = "select * from t where id=:id and name in (:names)";
        let map = values(vec![
            ("id", Value::Long(7)),
            ("names", Value::from(vec!["a", "b", "c"])),
        ]);
        let prepared =
            prepare_sql(sql, &map, PlaceholderStyle::Question, &ConverterRegistry::default())
                .unwrap();
        assert_eq!(prepared.sql, "select * from t where id=? and name in (?,?,?)");
        assert_eq!(
            prepared.values,
            vec![
                Value::Long(7),
                Value::Text("a".into()),
                Value::Text("b".into()),
                Value::Text("c".into()),
            ]
        );
    }

    #[test]
    fn numbered_styles_count_expanded_markers() {
        let sql = "where x in (:xs) and y = :y";
        let map = values(vec![
            ("xs", Value::List(vec![Value::Int(1), Value::Int(2)])),
            ("y", Value::Int(3)),
        ]);
        let parsed = extract_names(sql);
        assert_eq!(
            rewrite(sql, &parsed, &map, PlaceholderStyle::Dollar),
            "where x in ($1,$2) and y = $3"
        );
        assert_eq!(
            rewrite(sql, &parsed, &map, PlaceholderStyle::NumberedQuestion),
            "where x in (?1,?2) and y = ?3"
        );
    }

    #[test]
    fn repeated_names_bind_each_occurrence() {
        let sql = "select :v, :v";
        let map = values(vec![("v", Value::from("x"))]);
        let prepared =
            prepare_sql(sql, &map, PlaceholderStyle::Question, &ConverterRegistry::default())
                .unwrap();
        assert_eq!(prepared.sql, "select ?, ?");
        assert_eq!(prepared.values.len(), 2);
        assert_eq!(extract_names(sql).distinct_names(), vec!["v"]);
    }

    #[test]
    fn rewrite_does_not_need_values_but_binding_does() {
        let sql = "insert into person (birth) values (:birthDate)";
        let parsed = extract_names(sql);
        let empty = HashMap::new();
        assert_eq!(
            rewrite(sql, &parsed, &empty, PlaceholderStyle::Question),
            "insert into person (birth) values (?)"
        );
        let err = bind_values(&parsed, &empty, &ConverterRegistry::default()).unwrap_err();
        assert!(matches!(err, NimbleError::BindingError { .. }));
        assert_eq!(err.parameter(), Some("birthDate"));
    }

    #[test]
    fn empty_list_binds_one_null() {
        let sql = "where id in (:ids)";
        let map = values(vec![("ids", Value::List(Vec::new()))]);
        let prepared =
            prepare_sql(sql, &map, PlaceholderStyle::Question, &ConverterRegistry::default())
                .unwrap();
        assert_eq!(prepared.sql, "where id in (?)");
        assert_eq!(prepared.values, vec![Value::Null]);
    }

    #[test]
    fn text_without_tokens_is_untouched() {
        let sql = "select 1 from dual";
        let parsed = extract_names(sql);
        assert!(parsed.is_empty());
        assert_eq!(
            rewrite(sql, &parsed, &HashMap::new(), PlaceholderStyle::Dollar),
            sql
        );
    }
}
