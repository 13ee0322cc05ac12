//! # UPC Match
//!
//! A fuzzy product-to-UPC matching service for a nutrition-coaching backend.
//!
//! Given a free-text product description (e.g. `"tnuva milk 3%"`), the
//! pipeline decomposes it into a brand token and product terms, runs an
//! ordered list of weighted search strategies against a SQLite product
//! catalog, merges candidates per UPC by best weighted score, and returns
//! the top identifier plus the best three alternates.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌────────────┐   ┌────────────────┐   ┌──────────┐
//! │ Normalizer │──▶│ Strategies │──▶│ Scorer / Merge │──▶│ Selector │
//! └────────────┘   └────────────┘   └───────┬────────┘   └──────────┘
//!                                           │
//!                                     ┌─────┴─────┐
//!                                     │  Catalog  │  (SQLite / memory)
//!                                     └───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! upcm init                          # create the catalog database
//! upcm import ./products.jsonl       # seed it
//! upcm match "tnuva milk 3%"         # match from the CLI
//! upcm serve                         # GET /match?query=... over HTTP
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and vocabulary lists |
//! | [`models`] | Core data types |
//! | [`normalize`] | Query normalization |
//! | [`strategy`] | Weighted search strategies and scoring |
//! | [`catalog`] | Catalog store trait, SQLite and in-memory backends |
//! | [`matcher`] | Strategy execution, merging, and selection |
//! | [`server`] | HTTP API |
//! | [`import`] | JSONL catalog seeding |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod catalog;
pub mod config;
pub mod db;
pub mod import;
pub mod matcher;
pub mod migrate;
pub mod models;
pub mod normalize;
pub mod server;
pub mod strategy;
