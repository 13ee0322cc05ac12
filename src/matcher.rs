//! The matching pipeline: normalize, generate strategies, execute them
//! against the catalog, merge candidates, and select the winner.
//!
//! Strategies run sequentially in priority order. Each strategy's rows are
//! scored in application code and capped to its best few; weighted scores
//! are merged per UPC by taking the maximum (never the sum), so the highest
//! confidence signal wins regardless of execution order. Once enough
//! distinct candidates exist after a high-weight strategy, the remaining
//! lower-weight strategies are skipped to save catalog round-trips.
//!
//! A strategy whose catalog query fails or times out is logged and skipped;
//! the request only fails outright when every strategy failed.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::time::Duration;

use anyhow::{bail, Result};

use crate::catalog::{CatalogStore, SqliteCatalog};
use crate::config::{Config, MatchingConfig, Vocab};
use crate::db;
use crate::models::{Candidate, CatalogRow, MatchOutcome, TopMatch};
use crate::normalize::normalize_query;
use crate::strategy::generate_strategies;

/// Run the full pipeline and produce the externally visible outcome.
pub async fn run_match(
    catalog: &dyn CatalogStore,
    matching: &MatchingConfig,
    vocab: &Vocab,
    raw_query: &str,
) -> Result<MatchOutcome> {
    let candidates = collect_candidates(catalog, matching, vocab, raw_query).await?;
    Ok(select(candidates))
}

/// Execute all applicable strategies and return merged candidates, sorted
/// by score descending (stable on first-discovery order for ties).
pub async fn collect_candidates(
    catalog: &dyn CatalogStore,
    matching: &MatchingConfig,
    vocab: &Vocab,
    raw_query: &str,
) -> Result<Vec<Candidate>> {
    let query = normalize_query(raw_query, vocab, matching.max_product_terms)?;
    let strategies = generate_strategies(&query);
    let budget = Duration::from_secs(matching.query_timeout_secs);

    let mut merged = CandidateSet::new();
    let mut executed = 0usize;
    let mut failed = 0usize;

    for strategy in &strategies {
        let fetch = catalog.search(&strategy.filter, matching.scan_limit);
        let rows = match tokio::time::timeout(budget, fetch).await {
            Ok(Ok(rows)) => rows,
            Ok(Err(e)) => {
                eprintln!("Warning: strategy '{}' failed: {}", strategy.name, e);
                failed += 1;
                continue;
            }
            Err(_) => {
                eprintln!(
                    "Warning: strategy '{}' timed out after {}s",
                    strategy.name, matching.query_timeout_secs
                );
                failed += 1;
                continue;
            }
        };
        executed += 1;

        let mut scored: Vec<(CatalogRow, f64)> = rows
            .into_iter()
            .map(|row| {
                let raw = strategy.score(&query, vocab, &row.name);
                (row, raw)
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(matching.per_strategy_limit);

        for (row, raw) in scored {
            let weighted = raw * f64::from(strategy.weight) / 100.0;
            let brand_match = row.name.to_lowercase().contains(&query.brand);
            merged.observe(row, weighted, brand_match);
        }

        if merged.len() >= matching.min_candidates && strategy.weight >= matching.early_stop_weight
        {
            break;
        }
    }

    if executed == 0 && failed > 0 {
        bail!("catalog unavailable: all {} match strategies failed", failed);
    }

    Ok(merged.into_sorted())
}

/// Result Selector: top identifier, distinct count, best three.
fn select(candidates: Vec<Candidate>) -> MatchOutcome {
    MatchOutcome {
        upc: candidates.first().map(|c| c.upc.clone()),
        total_matches: candidates.len(),
        top_matches: candidates
            .iter()
            .take(3)
            .map(|c| TopMatch {
                upc: c.upc.clone(),
                name: c.name.clone(),
                score: c.score,
            })
            .collect(),
    }
}

/// Merge map from UPC to the best candidate seen so far, preserving
/// first-discovery order for deterministic tie-breaks.
struct CandidateSet {
    by_upc: HashMap<String, usize>,
    items: Vec<Candidate>,
}

impl CandidateSet {
    fn new() -> Self {
        Self {
            by_upc: HashMap::new(),
            items: Vec::new(),
        }
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    /// Record one strategy hit. A repeated UPC keeps its first-seen entry;
    /// only the score is raised, and only when the new signal is stronger.
    fn observe(&mut self, row: CatalogRow, weighted_score: f64, brand_match: bool) {
        match self.by_upc.get(&row.upc) {
            Some(&idx) => {
                let existing = &mut self.items[idx];
                existing.score = existing.score.max(weighted_score);
            }
            None => {
                self.by_upc.insert(row.upc.clone(), self.items.len());
                self.items.push(Candidate {
                    upc: row.upc,
                    name: row.name,
                    score: weighted_score,
                    brand_match,
                });
            }
        }
    }

    fn into_sorted(self) -> Vec<Candidate> {
        let mut items = self.items;
        // Vec::sort_by is stable, so ties keep insertion order.
        items.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        items
    }
}

/// CLI entry point for `upcm match`.
pub async fn run_match_command(config: &Config, query: &str, json: bool) -> Result<()> {
    let pool = db::connect(config).await?;
    let catalog = SqliteCatalog::new(pool.clone(), config.matching.upc_length);
    let result = run_match(&catalog, &config.matching, &config.vocab, query).await;
    pool.close().await;
    let outcome = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    match &outcome.upc {
        Some(upc) => println!("match: {}", upc),
        None => println!("No match."),
    }
    println!("total matches: {}", outcome.total_matches);
    for (i, m) in outcome.top_matches.iter().enumerate() {
        println!("  {}. [{:.2}] {}  {}", i + 1, m.score, m.upc, m.name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;
    use crate::strategy::TermFilter;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    fn fixture_vocab() -> Vocab {
        Vocab {
            brands: vec!["tnuva".to_string(), "osem".to_string()],
            processing_words: vec!["chopped".to_string()],
            bonus_words: vec![],
            penalty_words: vec![],
        }
    }

    fn fixture_matching() -> MatchingConfig {
        MatchingConfig {
            upc_length: 8,
            ..MatchingConfig::default()
        }
    }

    fn row(upc: &str, name: &str) -> CatalogRow {
        CatalogRow {
            upc: upc.to_string(),
            name: name.to_string(),
            brand: None,
        }
    }

    /// Wraps a [`MemoryCatalog`] and counts queries; optionally fails a
    /// chosen set of calls to exercise partial-failure handling.
    struct CountingCatalog {
        inner: MemoryCatalog,
        calls: AtomicUsize,
        fail_calls: Vec<usize>,
        fail_all: bool,
    }

    impl CountingCatalog {
        fn new(inner: MemoryCatalog) -> Self {
            Self {
                inner,
                calls: AtomicUsize::new(0),
                fail_calls: Vec::new(),
                fail_all: false,
            }
        }

        fn failing_calls(inner: MemoryCatalog, fail_calls: Vec<usize>) -> Self {
            Self {
                inner,
                calls: AtomicUsize::new(0),
                fail_calls,
                fail_all: false,
            }
        }

        fn failing_all(inner: MemoryCatalog) -> Self {
            Self {
                inner,
                calls: AtomicUsize::new(0),
                fail_calls: Vec::new(),
                fail_all: true,
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(AtomicOrdering::SeqCst)
        }
    }

    #[async_trait]
    impl CatalogStore for CountingCatalog {
        async fn search(&self, filter: &TermFilter, limit: i64) -> Result<Vec<CatalogRow>> {
            let call = self.calls.fetch_add(1, AtomicOrdering::SeqCst) + 1;
            if self.fail_all || self.fail_calls.contains(&call) {
                bail!("simulated store error");
            }
            self.inner.search(filter, limit).await
        }
    }

    #[tokio::test]
    async fn test_end_to_end_brand_and_prefix_match() {
        let catalog = MemoryCatalog::with_rows(
            8,
            vec![
                row("12345678", "Tnuva Milk 3% Fat"),
                row("87654321", "Strauss Pudding"),
            ],
        );
        let candidates = collect_candidates(
            &catalog,
            &fixture_matching(),
            &fixture_vocab(),
            "tnuva milk 3%",
        )
        .await
        .unwrap();

        assert_eq!(candidates[0].upc, "12345678");
        assert!(candidates[0].brand_match);
        assert!(candidates[0].score > 0.0);
    }

    #[tokio::test]
    async fn test_empty_query_makes_no_catalog_call() {
        let catalog = CountingCatalog::new(MemoryCatalog::new(8));
        let err = run_match(&catalog, &fixture_matching(), &fixture_vocab(), "   ")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
        assert_eq!(catalog.call_count(), 0);
    }

    #[tokio::test]
    async fn test_no_rows_yields_no_match_outcome() {
        let catalog = MemoryCatalog::new(8);
        let outcome = run_match(&catalog, &fixture_matching(), &fixture_vocab(), "tnuva milk")
            .await
            .unwrap();
        assert_eq!(outcome.upc, None);
        assert_eq!(outcome.total_matches, 0);
        assert!(outcome.top_matches.is_empty());
    }

    #[tokio::test]
    async fn test_single_strategy_failure_is_recovered() {
        let inner = MemoryCatalog::with_rows(8, vec![row("12345678", "Tnuva Milk")]);
        // Fail the first (highest-weight) strategy; later ones still find
        // the row and the request succeeds.
        let catalog = CountingCatalog::failing_calls(inner, vec![1]);
        let outcome = run_match(&catalog, &fixture_matching(), &fixture_vocab(), "tnuva milk")
            .await
            .unwrap();
        assert_eq!(outcome.upc.as_deref(), Some("12345678"));
        assert!(catalog.call_count() > 1);
    }

    #[tokio::test]
    async fn test_all_strategies_failing_surfaces_error() {
        let catalog = CountingCatalog::failing_all(MemoryCatalog::new(8));
        let err = run_match(&catalog, &fixture_matching(), &fixture_vocab(), "tnuva milk")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("catalog unavailable"));
    }

    #[tokio::test]
    async fn test_early_stop_after_high_weight_strategy() {
        let rows: Vec<CatalogRow> = (0..6)
            .map(|i| row(&format!("{:08}", i), &format!("Tnuva Milk {}", i)))
            .collect();
        let catalog = CountingCatalog::new(MemoryCatalog::with_rows(8, rows));
        let outcome = run_match(&catalog, &fixture_matching(), &fixture_vocab(), "tnuva milk")
            .await
            .unwrap();
        // Strategy 1 (weight 150) already collects >= 5 distinct candidates,
        // so nothing after it runs.
        assert_eq!(catalog.call_count(), 1);
        assert_eq!(outcome.total_matches, 6);
    }

    #[tokio::test]
    async fn test_no_early_stop_below_threshold() {
        let catalog = CountingCatalog::new(MemoryCatalog::with_rows(
            8,
            vec![row("12345678", "Tnuva Milk")],
        ));
        run_match(&catalog, &fixture_matching(), &fixture_vocab(), "tnuva milk")
            .await
            .unwrap();
        // One candidate is not enough to stop; all five strategies run.
        assert_eq!(catalog.call_count(), 5);
    }

    #[test]
    fn test_merge_takes_max_not_sum() {
        let mut set = CandidateSet::new();
        set.observe(row("12345678", "Tnuva Milk"), 30.0, true);
        set.observe(row("12345678", "Tnuva Milk"), 50.0, true);
        set.observe(row("12345678", "Tnuva Milk"), 20.0, true);
        let items = set.into_sorted();
        assert_eq!(items.len(), 1);
        assert!((items[0].score - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_merge_is_order_independent() {
        let scores = [12.0, 80.0, 45.5, 80.0, 3.0];
        let mut forward = CandidateSet::new();
        for s in scores {
            forward.observe(row("12345678", "Tnuva Milk"), s, true);
        }
        let mut reverse = CandidateSet::new();
        for s in scores.iter().rev() {
            reverse.observe(row("12345678", "Tnuva Milk"), *s, true);
        }
        let a = forward.into_sorted();
        let b = reverse.into_sorted();
        assert_eq!(a.len(), 1);
        assert!((a[0].score - b[0].score).abs() < 1e-9);
    }

    #[test]
    fn test_ties_keep_first_discovery_order() {
        let mut set = CandidateSet::new();
        set.observe(row("11111111", "First"), 10.0, false);
        set.observe(row("22222222", "Second"), 10.0, false);
        set.observe(row("33333333", "Third"), 25.0, false);
        let items = set.into_sorted();
        let order: Vec<&str> = items.iter().map(|c| c.upc.as_str()).collect();
        assert_eq!(order, vec!["33333333", "11111111", "22222222"]);
    }

    #[test]
    fn test_select_returns_top_three() {
        let candidates: Vec<Candidate> = (0..5)
            .map(|i| Candidate {
                upc: format!("{:08}", i),
                name: format!("Item {}", i),
                score: (100 - i) as f64,
                brand_match: false,
            })
            .collect();
        let outcome = select(candidates);
        assert_eq!(outcome.upc.as_deref(), Some("00000000"));
        assert_eq!(outcome.total_matches, 5);
        assert_eq!(outcome.top_matches.len(), 3);
    }
}
