// SPDX-FileCopyrightText: 2026 Contactd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Column allowlists and the sort/projection policy for dynamic queries.
//!
//! Caller-supplied sort expressions and field lists are resolved against a
//! closed enumeration of columns per entity. Only the `&'static str` names of
//! those enumerations ever reach SQL text; unknown or malformed input falls
//! back to a safe default instead of failing.

use std::fmt;
use std::str::FromStr;

use strum::{EnumString, IntoStaticStr, VariantArray};

/// A compiled-in column of a queryable entity.
pub trait Column: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// Every column of the entity, in canonical select order.
    const ALL: &'static [Self];

    /// The creation timestamp column, used by the default sort.
    const CREATED_AT: Self;

    /// The SQL identifier of this column.
    fn as_sql(self) -> &'static str;

    /// Resolves an exact column name. Returns `None` for anything not allowlisted.
    fn parse(name: &str) -> Option<Self>;
}

/// Columns of the `contacts` table that callers may select or sort by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, IntoStaticStr, VariantArray)]
#[strum(serialize_all = "snake_case")]
pub enum ContactColumn {
    Id,
    DomainId,
    IssuerId,
    SubjectId,
    ApplicationId,
    Type,
    Name,
    Username,
    Metadata,
    CreatedAt,
    UpdatedAt,
}

impl Column for ContactColumn {
    const ALL: &'static [Self] = <Self as VariantArray>::VARIANTS;
    const CREATED_AT: Self = Self::CreatedAt;

    fn as_sql(self) -> &'static str {
        self.into()
    }

    fn parse(name: &str) -> Option<Self> {
        Self::from_str(name).ok()
    }
}

/// Columns of the `bots` table that callers may select or sort by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, IntoStaticStr, VariantArray)]
#[strum(serialize_all = "snake_case")]
pub enum BotColumn {
    Id,
    DomainId,
    FlowId,
    DisplayName,
    CreatedAt,
    UpdatedAt,
}

impl Column for BotColumn {
    const ALL: &'static [Self] = <Self as VariantArray>::VARIANTS;
    const CREATED_AT: Self = Self::CreatedAt;

    fn as_sql(self) -> &'static str {
        self.into()
    }

    fn parse(name: &str) -> Option<Self> {
        Self::from_str(name).ok()
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// A validated `ORDER BY` clause body, e.g. `created_at desc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortClause<C: Column> {
    pub column: C,
    pub direction: Direction,
}

impl<C: Column> SortClause<C> {
    /// The fallback ordering: newest first.
    pub fn default_clause() -> Self {
        Self {
            column: C::CREATED_AT,
            direction: Direction::Desc,
        }
    }
}

impl<C: Column> Default for SortClause<C> {
    fn default() -> Self {
        Self::default_clause()
    }
}

impl<C: Column> fmt::Display for SortClause<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.column.as_sql(), self.direction.as_sql())
    }
}

/// Resolves a `±column` sort expression against the allowlist of `C`.
///
/// A leading `+` sorts ascending, `-` descending. Anything else (too short,
/// missing sign, unknown column) yields [`SortClause::default_clause`].
pub fn validate_and_format_sort<C: Column>(sort: &str) -> SortClause<C> {
    let direction = match sort.as_bytes().first() {
        Some(b'+') => Direction::Asc,
        Some(b'-') => Direction::Desc,
        _ => return SortClause::default_clause(),
    };

    // The sign is a single ASCII byte, so slicing after it stays on a char boundary.
    match C::parse(&sort[1..]) {
        Some(column) => SortClause { column, direction },
        None => SortClause::default_clause(),
    }
}

/// Drops every requested field that is not an allowlisted column of `C`.
///
/// Order and duplicates of the surviving entries are preserved.
pub fn sanitize_fields<C: Column, S: AsRef<str>>(fields: &[S]) -> Vec<C> {
    fields
        .iter()
        .filter_map(|field| C::parse(field.as_ref()))
        .collect()
}

/// The set of columns a search selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection<C: Column> {
    columns: Vec<C>,
}

impl<C: Column> Projection<C> {
    /// Every allowlisted column.
    pub fn all() -> Self {
        Self {
            columns: C::ALL.to_vec(),
        }
    }

    /// Builds a projection from caller-requested field names.
    ///
    /// Selects every column when nothing was requested or nothing survived
    /// sanitisation.
    pub fn from_requested<S: AsRef<str>>(fields: &[S]) -> Self {
        let columns = sanitize_fields::<C, S>(fields);
        if columns.is_empty() {
            Self::all()
        } else {
            Self { columns }
        }
    }

    pub fn columns(&self) -> &[C] {
        &self.columns
    }

    pub fn contains(&self, column: C) -> bool {
        self.columns.contains(&column)
    }

    /// Comma-separated SQL select list.
    pub fn to_sql(&self) -> String {
        self.columns
            .iter()
            .map(|c| c.as_sql())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
