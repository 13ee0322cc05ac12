//! Core data types used throughout the matching pipeline.

use serde::Serialize;

/// A single retail item record from the product catalog.
///
/// Read-only from this crate's perspective; the catalog is owned and
/// mutated by an external catalog-management process (or `upcm import`).
#[derive(Debug, Clone)]
pub struct CatalogRow {
    /// Barcode-like identifier. Only fully numeric identifiers of the
    /// configured length are eligible for matching.
    pub upc: String,
    /// Display name; the searched text field.
    pub name: String,
    /// Brand field, when the catalog knows it.
    pub brand: Option<String>,
}

/// A free-text query decomposed by the normalizer.
#[derive(Debug, Clone)]
pub struct NormalizedQuery {
    /// Brand token: either matched against the known-brand list or the
    /// first query token as a fallback heuristic.
    pub brand: String,
    /// Whether `brand` came from the known-brand list.
    pub brand_known: bool,
    /// Mandatory match terms, capped for query-cost reasons.
    pub product_terms: Vec<String>,
    /// Processing adjectives; minor scoring bonus only, never required.
    pub processing_terms: Vec<String>,
}

/// A catalog row matched by at least one strategy, with its aggregated score.
///
/// When the same UPC is produced by multiple strategies, the highest
/// weighted score wins; scores are never summed.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub upc: String,
    pub name: String,
    pub score: f64,
    /// True when the query's brand token appears in the row name.
    /// Informational; brand bonuses are already folded into the score.
    pub brand_match: bool,
}

/// One entry of [`MatchOutcome::top_matches`].
#[derive(Debug, Clone, Serialize)]
pub struct TopMatch {
    pub upc: String,
    pub name: String,
    pub score: f64,
}

/// The externally visible result of a match request.
///
/// Computed fresh per request, never persisted. Scores are a ranking
/// signal only and are not bounded to any particular range.
#[derive(Debug, Clone, Serialize)]
pub struct MatchOutcome {
    /// Top candidate's identifier, or `None` when nothing matched.
    pub upc: Option<String>,
    /// Count of distinct candidates across all executed strategies.
    pub total_matches: usize,
    /// The best three candidates, for diagnostics.
    pub top_matches: Vec<TopMatch>,
}
