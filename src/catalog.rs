//! Catalog storage abstraction.
//!
//! The [`CatalogStore`] trait defines the single read operation the matching
//! pipeline needs, enabling pluggable backends (SQLite in production, an
//! in-memory store for tests and embedding).
//!
//! Every backend applies the same data-quality filter: a row is eligible
//! only when its identifier is fully numeric with exactly the configured
//! number of digits. Implementations must be `Send + Sync`.

use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use crate::models::CatalogRow;
use crate::strategy::TermFilter;

/// Read-only view of the product catalog used by the matcher.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Return eligible rows whose name satisfies `filter`, up to `limit`.
    /// Ordering is backend-defined; scoring happens in application code.
    async fn search(&self, filter: &TermFilter, limit: i64) -> Result<Vec<CatalogRow>>;
}

/// True when `upc` is eligible for matching: fully numeric, exact length.
pub fn eligible_upc(upc: &str, upc_length: usize) -> bool {
    upc.len() == upc_length && upc.chars().all(|c| c.is_ascii_digit())
}

/// SQLite-backed catalog.
///
/// Predicates are built with [`QueryBuilder`] so every term is a bound
/// parameter; user input never reaches the SQL text.
pub struct SqliteCatalog {
    pool: SqlitePool,
    upc_length: usize,
}

impl SqliteCatalog {
    pub fn new(pool: SqlitePool, upc_length: usize) -> Self {
        Self { pool, upc_length }
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalog {
    async fn search(&self, filter: &TermFilter, limit: i64) -> Result<Vec<CatalogRow>> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT upc, name, brand FROM products WHERE length(upc) = ");
        qb.push_bind(self.upc_length as i64);
        qb.push(" AND upc NOT GLOB '*[^0-9]*'");

        for term in &filter.all_of {
            qb.push(" AND instr(lower(name), ");
            qb.push_bind(term.as_str());
            qb.push(") > 0");
        }

        if !filter.any_of.is_empty() {
            qb.push(" AND (");
            for (i, term) in filter.any_of.iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                qb.push("instr(lower(name), ");
                qb.push_bind(term.as_str());
                qb.push(") > 0");
            }
            qb.push(")");
        }

        qb.push(" LIMIT ");
        qb.push_bind(limit);

        let rows = qb.build().fetch_all(&self.pool).await?;

        Ok(rows
            .iter()
            .map(|row| CatalogRow {
                upc: row.get("upc"),
                name: row.get("name"),
                brand: row.get("brand"),
            })
            .collect())
    }
}

/// In-memory catalog for tests and library embedding.
///
/// Evaluates the same filter semantics as [`SqliteCatalog`] in Rust, over
/// a `RwLock`-guarded row list. Rows are returned in insertion order.
pub struct MemoryCatalog {
    rows: RwLock<Vec<CatalogRow>>,
    upc_length: usize,
}

impl MemoryCatalog {
    pub fn new(upc_length: usize) -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            upc_length,
        }
    }

    pub fn with_rows(upc_length: usize, rows: Vec<CatalogRow>) -> Self {
        Self {
            rows: RwLock::new(rows),
            upc_length,
        }
    }

    pub fn insert(&self, row: CatalogRow) {
        self.rows.write().unwrap().push(row);
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn search(&self, filter: &TermFilter, limit: i64) -> Result<Vec<CatalogRow>> {
        let rows = self.rows.read().unwrap();
        Ok(rows
            .iter()
            .filter(|r| eligible_upc(&r.upc, self.upc_length) && filter.matches(&r.name))
            .take(limit as usize)
            .cloned()
            .collect())
    }
}
