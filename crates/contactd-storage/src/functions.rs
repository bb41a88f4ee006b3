// SPDX-FileCopyrightText: 2026 Contactd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Application-defined SQL functions registered on every connection.

use rusqlite::functions::FunctionFlags;

/// `fold_case(text)`: Unicode lowercase. SQLite's own `lower()` and `LIKE`
/// only fold ASCII.
pub(crate) const FOLD_CASE: &str = "fold_case";

pub(crate) fn register(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        FOLD_CASE,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|t| t.to_lowercase()))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_non_ascii_text() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        register(&conn).unwrap();

        let folded: String = conn
            .query_row("SELECT fold_case('АНГЕЛИНА Ölz')", [], |row| row.get(0))
            .unwrap();
        assert_eq!(folded, "ангелина ölz");

        let null: Option<String> = conn
            .query_row("SELECT fold_case(NULL)", [], |row| row.get(0))
            .unwrap();
        assert_eq!(null, None);
    }
}
