//! Query normalization.
//!
//! Splits a free-text query into a brand token, mandatory product terms,
//! and processing adjectives. Pure function of the input string and the
//! configured vocabulary.

use anyhow::{bail, Result};

use crate::config::Vocab;
use crate::models::NormalizedQuery;

/// Normalize a raw query string.
///
/// - Lowercases, splits on whitespace, strips non-alphanumeric characters
///   per token, and drops empty tokens.
/// - The brand is the first token found in the known-brand list; if none
///   matches, the first token is taken as the brand (unconfirmed heuristic).
///   Either way the token is removed from the remaining terms.
/// - Remaining tokens are partitioned into processing adjectives and
///   product terms; only the first `max_product_terms` product terms are
///   kept, the rest are dropped silently.
pub fn normalize_query(raw: &str, vocab: &Vocab, max_product_terms: usize) -> Result<NormalizedQuery> {
    if raw.trim().is_empty() {
        bail!("query must not be empty");
    }

    let mut tokens: Vec<String> = raw
        .split_whitespace()
        .map(|t| {
            t.chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(|c| c.to_lowercase())
                .collect::<String>()
        })
        .filter(|t| !t.is_empty())
        .collect();

    if tokens.is_empty() {
        bail!("query contains no searchable terms");
    }

    let (brand, brand_known) = match tokens.iter().position(|t| vocab.is_brand(t)) {
        Some(i) => (tokens.remove(i), true),
        None => (tokens.remove(0), false),
    };

    let mut product_terms = Vec::new();
    let mut processing_terms = Vec::new();
    for token in tokens {
        if vocab.is_processing_word(&token) {
            processing_terms.push(token);
        } else if product_terms.len() < max_product_terms {
            product_terms.push(token);
        }
        // further product terms are dropped to bound query cost
    }

    Ok(NormalizedQuery {
        brand,
        brand_known,
        product_terms,
        processing_terms,
    })
}
