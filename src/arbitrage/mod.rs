//! Surebet engine: best-price aggregation, arbitrage math and ranking.
//!
//! Everything in this module is synchronous and side-effect free apart from
//! logging, so it can be called concurrently from any number of requests.
//!
//! - Best price per outcome across bookmakers
//! - Inverse-sum test, ROI and stake split
//! - Filtering, ranking and truncation

pub mod aggregator;
pub mod calculator;
pub mod detector;
pub mod ranking;

pub use aggregator::{best_prices, BestPrice, BestPrices, BookmakerFilter, FallbackPolicy};
pub use calculator::{
    calculate, ArbitrageCheck, EventSummary, Leg, Opportunity, StakePlan, MAX_TOTAL_STAKE,
};
pub use detector::{
    detect, evaluate_event, find_opportunities, find_opportunities_on, Detection, ScanParams,
    SkippedEvent,
};
pub use ranking::{rank, OpportunityFilter, RankOrder, MAX_DAYS_WINDOW};
