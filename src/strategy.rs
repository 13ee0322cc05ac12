//! Search strategies.
//!
//! Each strategy is a typed, weighted rule over catalog rows: a term filter
//! (which terms must appear in the row name) plus a scoring formula applied
//! in application code. Strategies are stateless, built fresh per request,
//! and ordered by descending specificity; the order doubles as the
//! execution priority used by the early-stop policy.

use crate::config::Vocab;
use crate::models::NormalizedQuery;

// Shared by the two first-word strategies.
const PHRASE_PREFIX_BONUS: f64 = 80.0;
const TERM_PREFIX_BONUS: f64 = 40.0;
const TERM_SUBSTRING_BONUS: f64 = 5.0;
const BRAND_SUBSTRING_BONUS: f64 = 8.0;
const KNOWN_BRAND_BONUS: f64 = 3.0;
const DESCRIPTIVE_BONUS: f64 = 4.0;
const DESCRIPTIVE_PENALTY: f64 = -10.0;
const PROCESSING_BONUS: f64 = 3.0;

// Brand+product priority strategy.
const PRIORITY_PHRASE_PREFIX_BONUS: f64 = 50.0;
const PRIORITY_BRAND_SUBSTRING_BONUS: f64 = 10.0;
const PRIORITY_TERM_SUBSTRING_BONUS: f64 = 3.0;
const PRIORITY_KNOWN_BRAND_BONUS: f64 = 5.0;

// Product-terms-only strategy.
const GENERIC_TERM_SUBSTRING_BONUS: f64 = 3.0;
const GENERIC_ANY_BRAND_BONUS: f64 = 8.0;

/// A text predicate over catalog row names: every `all_of` term must appear
/// as a case-insensitive substring, and at least one `any_of` term must
/// appear when that list is non-empty. Terms are already lowercased.
#[derive(Debug, Clone, Default)]
pub struct TermFilter {
    pub all_of: Vec<String>,
    pub any_of: Vec<String>,
}

impl TermFilter {
    pub fn matches(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.all_of.iter().all(|t| lower.contains(t.as_str()))
            && (self.any_of.is_empty() || self.any_of.iter().any(|t| lower.contains(t.as_str())))
    }
}

/// Scoring formula selector for a [`Strategy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// Brand must appear plus at least one product term; richest formula.
    BrandFirstWord,
    /// Same formula, no brand requirement; recall-oriented fallback.
    FirstWordOnly,
    /// Brand plus any product term with a simpler formula.
    BrandProduct,
    /// Product terms only, with a flat bonus for rows naming a known brand.
    ProductTerms,
    /// Any term at all; last resort, scores by matched-term count.
    AnyTerm,
}

#[derive(Debug, Clone)]
pub struct Strategy {
    pub name: &'static str,
    pub kind: StrategyKind,
    /// Weight applied to raw scores (`raw * weight / 100`); also governs
    /// whether the early-stop policy may fire after this strategy.
    pub weight: u32,
    pub filter: TermFilter,
}

/// Build the ordered strategy list for a normalized query.
///
/// Strategies whose required terms are empty are skipped (a query with no
/// product terms, for example, yields only the any-term fallback).
pub fn generate_strategies(query: &NormalizedQuery) -> Vec<Strategy> {
    let mut strategies = Vec::new();
    let has_brand = !query.brand.is_empty();
    let has_terms = !query.product_terms.is_empty();

    if has_brand && has_terms {
        strategies.push(Strategy {
            name: "brand+first-word",
            kind: StrategyKind::BrandFirstWord,
            weight: 150,
            filter: TermFilter {
                all_of: vec![query.brand.clone()],
                any_of: query.product_terms.clone(),
            },
        });
    }

    if let Some(first) = query.product_terms.first() {
        strategies.push(Strategy {
            name: "first-word-only",
            kind: StrategyKind::FirstWordOnly,
            weight: 120,
            filter: TermFilter {
                all_of: vec![first.clone()],
                any_of: Vec::new(),
            },
        });
    }

    if has_brand && has_terms {
        strategies.push(Strategy {
            name: "brand+product",
            kind: StrategyKind::BrandProduct,
            weight: 100,
            filter: TermFilter {
                all_of: vec![query.brand.clone()],
                any_of: query.product_terms.clone(),
            },
        });
    }

    if has_terms {
        strategies.push(Strategy {
            name: "product-terms",
            kind: StrategyKind::ProductTerms,
            weight: 90,
            filter: TermFilter {
                all_of: Vec::new(),
                any_of: query.product_terms.clone(),
            },
        });
    }

    let mut any_terms = Vec::new();
    if has_brand {
        any_terms.push(query.brand.clone());
    }
    any_terms.extend(query.product_terms.iter().cloned());
    if !any_terms.is_empty() {
        strategies.push(Strategy {
            name: "any-term",
            kind: StrategyKind::AnyTerm,
            weight: 50,
            filter: TermFilter {
                all_of: Vec::new(),
                any_of: any_terms,
            },
        });
    }

    strategies
}

impl Strategy {
    /// Score a catalog row name against the query. The row is assumed to
    /// have already passed this strategy's filter.
    pub fn score(&self, query: &NormalizedQuery, vocab: &Vocab, name: &str) -> f64 {
        let lower = name.to_lowercase();
        match self.kind {
            StrategyKind::BrandFirstWord | StrategyKind::FirstWordOnly => {
                self.score_first_word(query, vocab, &lower)
            }
            StrategyKind::BrandProduct => {
                let mut score = 0.0;
                if phrase_prefix(query, &lower) {
                    score += PRIORITY_PHRASE_PREFIX_BONUS;
                }
                if lower.contains(&query.brand) {
                    score += PRIORITY_BRAND_SUBSTRING_BONUS;
                }
                for term in &query.product_terms {
                    if lower.contains(term.as_str()) {
                        score += PRIORITY_TERM_SUBSTRING_BONUS;
                    }
                }
                if query.brand_known {
                    score += PRIORITY_KNOWN_BRAND_BONUS;
                }
                score
            }
            StrategyKind::ProductTerms => {
                let mut score = 0.0;
                for term in &query.product_terms {
                    if lower.contains(term.as_str()) {
                        score += GENERIC_TERM_SUBSTRING_BONUS;
                    }
                }
                if vocab.brands.iter().any(|b| lower.contains(b.as_str())) {
                    score += GENERIC_ANY_BRAND_BONUS;
                }
                score
            }
            StrategyKind::AnyTerm => self
                .filter
                .any_of
                .iter()
                .filter(|t| lower.contains(t.as_str()))
                .count() as f64,
        }
    }

    fn score_first_word(&self, query: &NormalizedQuery, vocab: &Vocab, lower: &str) -> f64 {
        let mut score = 0.0;
        if phrase_prefix(query, lower) {
            score += PHRASE_PREFIX_BONUS;
        }
        for term in &query.product_terms {
            if lower.starts_with(term.as_str()) {
                score += TERM_PREFIX_BONUS;
            } else if lower.contains(term.as_str()) {
                score += TERM_SUBSTRING_BONUS;
            }
        }
        if lower.contains(&query.brand) {
            score += BRAND_SUBSTRING_BONUS;
        }
        if query.brand_known {
            score += KNOWN_BRAND_BONUS;
        }
        for word in &vocab.bonus_words {
            if lower.contains(word.as_str()) {
                score += DESCRIPTIVE_BONUS;
            }
        }
        for word in &vocab.penalty_words {
            if lower.contains(word.as_str()) {
                score += DESCRIPTIVE_PENALTY;
            }
        }
        for term in &query.processing_terms {
            if lower.contains(term.as_str()) {
                score += PROCESSING_BONUS;
            }
        }
        score
    }
}

/// True when the row name starts with the query's product phrase, with or
/// without the brand token in front.
fn phrase_prefix(query: &NormalizedQuery, lower: &str) -> bool {
    if query.product_terms.is_empty() {
        return false;
    }
    let phrase = query.product_terms.join(" ");
    if lower.starts_with(&phrase) {
        return true;
    }
    !query.brand.is_empty() && lower.starts_with(&format!("{} {}", query.brand, phrase))
}
