// 🔎 Query Layer - establishment search
//
// One filter for both sources (the establishments table and the
// connectivity view):
// - blank term      → unfiltered page
// - integer term    → exact business code OR text match
// - anything else   → text match only
// Text match is a Unicode case-insensitive substring of name, alias,
// district or city. Results are capped at SEARCH_LIMIT.

use crate::db::{
    row_to_connectivity, row_to_establishment, CONNECTIVITY_COLUMNS, ESTABLISHMENT_COLUMNS,
};
use crate::entities::{BusinessCode, ConnectivityRecord, Establishment};
use crate::error::{RegistryError, Result};
use rusqlite::{params, Connection, Row};

/// Hard page size. There is no cursor; refine the term to see other rows.
pub const SEARCH_LIMIT: usize = 50;

/// Parsed search term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilter {
    /// LIKE pattern over folded text, `None` for a blank term
    pub pattern: Option<String>,
    /// Exact code to match, when the whole term is an integer
    pub code: Option<BusinessCode>,
}

impl SearchFilter {
    pub fn parse(term: &str) -> Self {
        let term = term.trim();
        if term.is_empty() {
            return SearchFilter {
                pattern: None,
                code: None,
            };
        }

        SearchFilter {
            pattern: Some(format!("%{}%", escape_like(&term.to_lowercase()))),
            code: term.parse::<BusinessCode>().ok(),
        }
    }
}

/// Escape LIKE wildcards so they match literally (ESCAPE '\').
fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Search the establishments table.
pub fn search_establishments(conn: &Connection, term: &str) -> Result<Vec<Establishment>> {
    run_search(conn, "establishments", ESTABLISHMENT_COLUMNS, term, row_to_establishment)
}

/// Same search over the connectivity view, with each row's category.
pub fn search_connectivity(conn: &Connection, term: &str) -> Result<Vec<ConnectivityRecord>> {
    run_search(conn, "connectivity_view", CONNECTIVITY_COLUMNS, term, row_to_connectivity)
}

fn run_search<T>(
    conn: &Connection,
    source: &str,
    columns: &str,
    term: &str,
    map: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Vec<T>> {
    let filter = SearchFilter::parse(term);
    log::debug!("search {} for {:?} -> {:?}", source, term, filter);

    // Exact code hit sorts first so the limit can never push it out.
    let sql = format!(
        "SELECT {columns} FROM {source}
         WHERE ?1 IS NULL
            OR code = ?2
            OR fold_case(name) LIKE ?1 ESCAPE '\\'
            OR fold_case(alias) LIKE ?1 ESCAPE '\\'
            OR fold_case(district) LIKE ?1 ESCAPE '\\'
            OR fold_case(city) LIKE ?1 ESCAPE '\\'
         ORDER BY (code IS ?2) DESC, name IS NULL, fold_case(name), code
         LIMIT ?3"
    );

    let result = conn.prepare(&sql).and_then(|mut stmt| {
        stmt.query_map(
            params![filter.pattern, filter.code, SEARCH_LIMIT as i64],
            map,
        )?
        .collect::<rusqlite::Result<Vec<T>>>()
    });

    result.map_err(|e| {
        log::error!("search over {} failed: {}", source, e);
        RegistryError::SearchFailed(e)
    })
}
