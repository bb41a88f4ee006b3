// SPDX-FileCopyrightText: 2026 Contactd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for contact and bot storage operations.
//!
//! Caller-supplied values only ever reach SQL as bound parameters. The only
//! identifiers interpolated into statement text are the `&'static str`
//! column names of the allowlists in `contactd_core::query`.

pub mod bots;
pub mod contacts;

use contactd_core::PagingWindow;

use crate::functions::FOLD_CASE;
use rusqlite::types::{Type, Value};
use uuid::Uuid;

/// AND-joined WHERE clause with positional parameters.
#[derive(Debug, Default)]
pub(crate) struct Predicate {
    clauses: Vec<String>,
    params: Vec<Value>,
}

impl Predicate {
    fn bind(&mut self, value: impl Into<Value>) -> String {
        self.params.push(value.into());
        format!("?{}", self.params.len())
    }

    /// `column = value`.
    pub(crate) fn eq(&mut self, column: &'static str, value: impl Into<Value>) -> &mut Self {
        let slot = self.bind(value);
        self.clauses.push(format!("{column} = {slot}"));
        self
    }

    /// `column IN (...)`. An empty set adds no clause.
    pub(crate) fn any_of<I, V>(&mut self, column: &'static str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let slots: Vec<String> = values.into_iter().map(|v| self.bind(v)).collect();
        if !slots.is_empty() {
            self.clauses
                .push(format!("{column} IN ({})", slots.join(", ")));
        }
        self
    }

    /// Case-insensitive substring match of `text` against any of `columns`.
    ///
    /// Both sides are Unicode-folded, so `q` matches regardless of script.
    pub(crate) fn contains_text(&mut self, columns: &[&'static str], text: &str) -> &mut Self {
        let slot = self.bind(like_substring(&text.to_lowercase()));
        let alternatives: Vec<String> = columns
            .iter()
            .map(|column| format!("{FOLD_CASE}({column}) LIKE {slot} ESCAPE '\\'"))
            .collect();
        self.clauses.push(format!("({})", alternatives.join(" OR ")));
        self
    }

    /// Case-insensitive match of `column` against any caller pattern, verbatim.
    pub(crate) fn like_any<I, S>(&mut self, column: &'static str, patterns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let alternatives: Vec<String> = patterns
            .into_iter()
            .map(|p| {
                let pattern: String = p.into();
                let slot = self.bind(pattern.to_lowercase());
                format!("{FOLD_CASE}({column}) LIKE {slot}")
            })
            .collect();
        if !alternatives.is_empty() {
            self.clauses
                .push(format!("({})", alternatives.join(" OR ")));
        }
        self
    }

    /// Appends `LIMIT`/`OFFSET` for the over-fetching window.
    pub(crate) fn page_sql(&mut self, window: &PagingWindow) -> String {
        let limit = self.bind(window.fetch_limit());
        let offset = self.bind(window.offset());
        format!("LIMIT {limit} OFFSET {offset}")
    }

    pub(crate) fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            "1 = 1".to_string()
        } else {
            self.clauses.join(" AND ")
        }
    }

    pub(crate) fn into_params(self) -> Vec<Value> {
        self.params
    }
}

/// Escapes LIKE metacharacters in `text` and wraps it as `%text%`.
pub(crate) fn like_substring(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

pub(crate) fn uuid_value(id: &Uuid) -> Value {
    Value::Text(id.to_string())
}

/// Reads a TEXT column holding a UUID.
pub(crate) fn uuid_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let text: String = row.get(idx)?;
    Uuid::parse_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
