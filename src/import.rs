//! Catalog seeding from JSON-lines files.
//!
//! Each line is one product: `{"upc": "...", "name": "...", "brand": "..."}`.
//! Rows are upserted by UPC; malformed lines are skipped with a warning so a
//! partially bad export still loads.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::config::Config;
use crate::db;

#[derive(Debug, Deserialize)]
struct ImportRow {
    upc: String,
    name: String,
    #[serde(default)]
    brand: Option<String>,
}

pub async fn run_import(config: &Config, path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read import file: {}", path.display()))?;

    let pool = db::connect(config).await?;
    let now = chrono::Utc::now().timestamp();

    let mut imported = 0usize;
    let mut skipped = 0usize;

    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<ImportRow>(line) {
            Ok(row) => {
                sqlx::query(
                    r#"
                    INSERT INTO products (upc, name, brand, updated_at)
                    VALUES (?, ?, ?, ?)
                    ON CONFLICT(upc) DO UPDATE SET
                        name = excluded.name,
                        brand = excluded.brand,
                        updated_at = excluded.updated_at
                    "#,
                )
                .bind(&row.upc)
                .bind(&row.name)
                .bind(&row.brand)
                .bind(now)
                .execute(&pool)
                .await?;
                imported += 1;
            }
            Err(e) => {
                eprintln!("Warning: skipping line {}: {}", lineno + 1, e);
                skipped += 1;
            }
        }
    }

    pool.close().await;
    println!("Imported {} products ({} skipped).", imported, skipped);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DbConfig;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_import_upserts_and_skips_malformed() {
        let tmp = TempDir::new().unwrap();
        let mut cfg = Config::minimal();
        cfg.db = DbConfig {
            path: tmp.path().join("catalog.sqlite"),
        };
        crate::migrate::run_migrations(&cfg).await.unwrap();

        let file = tmp.path().join("products.jsonl");
        std::fs::write(
            &file,
            concat!(
                r#"{"upc":"12345678","name":"Tnuva Milk","brand":"Tnuva"}"#,
                "\n",
                "not json\n",
                r#"{"upc":"12345678","name":"Tnuva Milk 3% Fat","brand":"Tnuva"}"#,
                "\n",
                r#"{"upc":"11112222","name":"Osem Chopped Tomatoes"}"#,
                "\n",
            ),
        )
        .unwrap();

        run_import(&cfg, &file).await.unwrap();

        let pool = db::connect(&cfg).await.unwrap();
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 2);

        let (name,): (String,) =
            sqlx::query_as("SELECT name FROM products WHERE upc = '12345678'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(name, "Tnuva Milk 3% Fat");
        pool.close().await;
    }
}
