use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub vocab: Vocab,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

/// Tuning knobs for the matching pipeline.
#[derive(Debug, Deserialize, Clone)]
pub struct MatchingConfig {
    /// Maximum number of mandatory product terms kept from a query.
    /// Extra terms are dropped to bound query cost.
    #[serde(default = "default_max_product_terms")]
    pub max_product_terms: usize,

    /// How many scored rows each strategy may contribute.
    #[serde(default = "default_per_strategy_limit")]
    pub per_strategy_limit: usize,

    /// Upper bound on rows fetched from the catalog per strategy before
    /// scoring happens in application code.
    #[serde(default = "default_scan_limit")]
    pub scan_limit: i64,

    /// Distinct-candidate count at which execution may stop early.
    #[serde(default = "default_min_candidates")]
    pub min_candidates: usize,

    /// Early stop only applies after a strategy of at least this weight.
    #[serde(default = "default_early_stop_weight")]
    pub early_stop_weight: u32,

    /// Required identifier length. Rows whose UPC is not exactly this many
    /// digits are never eligible.
    #[serde(default = "default_upc_length")]
    pub upc_length: usize,

    /// Time budget for a single catalog query, in seconds.
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            max_product_terms: default_max_product_terms(),
            per_strategy_limit: default_per_strategy_limit(),
            scan_limit: default_scan_limit(),
            min_candidates: default_min_candidates(),
            early_stop_weight: default_early_stop_weight(),
            upc_length: default_upc_length(),
            query_timeout_secs: default_query_timeout_secs(),
        }
    }
}

fn default_max_product_terms() -> usize {
    3
}
fn default_per_strategy_limit() -> usize {
    10
}
fn default_scan_limit() -> i64 {
    500
}
fn default_min_candidates() -> usize {
    5
}
fn default_early_stop_weight() -> u32 {
    80
}
fn default_upc_length() -> usize {
    13
}
fn default_query_timeout_secs() -> u64 {
    10
}

/// Domain vocabulary used by the normalizer and the scoring formulas.
///
/// These lists are tuning data, not behavior: deployments supply their own
/// lexicon, and tests substitute small fixtures. The defaults are a modest
/// starter set for an Israeli retail catalog.
#[derive(Debug, Deserialize, Clone)]
pub struct Vocab {
    /// Known brand names (matched as whole query tokens).
    #[serde(default = "default_brands")]
    pub brands: Vec<String>,

    /// Processing adjectives excluded from mandatory matching.
    #[serde(default = "default_processing_words")]
    pub processing_words: Vec<String>,

    /// Descriptive words that nudge a row's score up.
    #[serde(default = "default_bonus_words")]
    pub bonus_words: Vec<String>,

    /// Descriptive words that push less relevant rows down.
    #[serde(default = "default_penalty_words")]
    pub penalty_words: Vec<String>,
}

impl Default for Vocab {
    fn default() -> Self {
        Self {
            brands: default_brands(),
            processing_words: default_processing_words(),
            bonus_words: default_bonus_words(),
            penalty_words: default_penalty_words(),
        }
    }
}

fn default_brands() -> Vec<String> {
    [
        "tnuva",
        "osem",
        "elite",
        "strauss",
        "telma",
        "yotvata",
        "tara",
        "wissotzky",
        "prigat",
        "sano",
    ]
    .map(String::from)
    .to_vec()
}

fn default_processing_words() -> Vec<String> {
    [
        "chopped", "sliced", "diced", "frozen", "organic", "ground", "smoked", "pickled",
        "canned", "dried",
    ]
    .map(String::from)
    .to_vec()
}

fn default_bonus_words() -> Vec<String> {
    ["raw", "fresh", "sliced", "mini"].map(String::from).to_vec()
}

fn default_penalty_words() -> Vec<String> {
    ["with", "drink", "yoghurt", "milk", "fat"]
        .map(String::from)
        .to_vec()
}

impl Vocab {
    pub fn is_brand(&self, token: &str) -> bool {
        self.brands.iter().any(|b| b == token)
    }

    pub fn is_processing_word(&self, token: &str) -> bool {
        self.processing_words.iter().any(|w| w == token)
    }

    /// Lowercase all lists so lookups can assume normalized entries.
    fn normalize(&mut self) {
        for list in [
            &mut self.brands,
            &mut self.processing_words,
            &mut self.bonus_words,
            &mut self.penalty_words,
        ] {
            for w in list.iter_mut() {
                *w = w.to_lowercase();
            }
        }
    }
}

impl Config {
    /// A minimal config for tests and tooling that does not read a file.
    pub fn minimal() -> Self {
        Self {
            db: DbConfig {
                path: PathBuf::from("./data/upcm.sqlite"),
            },
            server: ServerConfig {
                bind: "127.0.0.1:7332".to_string(),
            },
            matching: MatchingConfig::default(),
            vocab: Vocab::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.matching.max_product_terms == 0 {
        anyhow::bail!("matching.max_product_terms must be >= 1");
    }
    if config.matching.per_strategy_limit == 0 {
        anyhow::bail!("matching.per_strategy_limit must be >= 1");
    }
    if config.matching.scan_limit < 1 {
        anyhow::bail!("matching.scan_limit must be >= 1");
    }
    if config.matching.min_candidates == 0 {
        anyhow::bail!("matching.min_candidates must be >= 1");
    }
    if config.matching.upc_length == 0 {
        anyhow::bail!("matching.upc_length must be >= 1");
    }
    if config.matching.query_timeout_secs == 0 {
        anyhow::bail!("matching.query_timeout_secs must be >= 1");
    }

    config.vocab.normalize();

    Ok(config)
}
