//! Two-way sports surebet scanner.
//!
//! A surebet exists when the best decimal odds for the two outcomes of an
//! event, taken from different bookmakers, satisfy `1/a + 1/b < 1`. Staking
//! in proportion to the inverse odds then returns the same amount whichever
//! side wins:
//!
//! ```text
//! Home @ 2.10 (Pinnacle):  stake 49.40 -> 103.74
//! Away @ 2.05 (Smarkets):  stake 50.60 -> 103.73
//! ─────────────────────────────────────────────
//! 1/2.10 + 1/2.05 = 0.9640 < 1   ROI 3.73%
//! ```
//!
//! # Modules
//!
//! - [`arbitrage`]: Best prices, arbitrage math, filtering and ranking
//! - [`odds`]: Odds API client, normalization and caching
//! - [`scanner`]: Scan service tying the feed to the engine
//! - [`notify`]: Message formatting and Telegram delivery
//! - [`api`]: HTTP API for surebets, health and metrics
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod arbitrage;
pub mod config;
pub mod error;
pub mod metrics;
pub mod notify;
pub mod odds;
pub mod scanner;
pub mod utils;

pub use config::Config;
pub use error::{Result, SurebetError};
