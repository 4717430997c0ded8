//! Integration tests for the surebet scanner.
//!
//! Fixture-driven tests run by default. The live test needs a valid
//! THE_ODDS_API_KEY environment variable.
//! Run it with: cargo test --test integration -- --ignored

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use time::macros::datetime;
use time::OffsetDateTime;
use tower::ServiceExt;

use surebet::api::{create_router, AppState};
use surebet::arbitrage::{
    detect, find_opportunities_on, BookmakerFilter, FallbackPolicy, RankOrder, ScanParams,
};
use surebet::config::Config;
use surebet::error::ArbitrageError;
use surebet::odds::{Event, EventBuilder, OddsFeed, OddsSource, Side, StaticSource};
use surebet::scanner::Scanner;

const NOW: OffsetDateTime = datetime!(2026-10-18 12:00 UTC);

/// Get a live config from environment.
fn live_config() -> Option<Config> {
    dotenvy::dotenv().ok();

    let key = std::env::var("THE_ODDS_API_KEY").ok()?;
    if key.trim().is_empty() {
        return None;
    }

    envy::from_iter(vec![
        ("THE_ODDS_API_KEY".to_string(), key),
        ("SPORTS".to_string(), "basketball_nba".to_string()),
    ])
    .ok()
}

/// A slate mixing a surebet, a fair market, a three-way market and bad odds.
fn slate() -> Vec<Event> {
    vec![
        EventBuilder::new("celtics-knicks", "Boston Celtics", "New York Knicks")
            .starts_at(datetime!(2026-10-20 23:30 UTC))
            .prices("pinnacle", dec!(2.10), dec!(1.80))
            .prices("smarkets", dec!(1.85), dec!(2.05))
            .prices("williamhill", dec!(1.95), dec!(1.90))
            .build(),
        EventBuilder::new("yankees-redsox", "Yankees", "Red Sox")
            .sport("baseball_mlb", "MLB")
            .starts_at(datetime!(2026-10-19 17:05 UTC))
            .prices("pinnacle", dec!(2.20), dec!(1.75))
            .prices("betfair_ex_eu", dec!(1.70), dec!(2.00))
            .build(),
        EventBuilder::new("bulls-heat", "Bulls", "Heat")
            .starts_at(datetime!(2026-10-19 00:00 UTC))
            .prices("pinnacle", dec!(1.90), dec!(1.90))
            .prices("smarkets", dec!(1.92), dec!(1.88))
            .build(),
        EventBuilder::new("arsenal-chelsea", "Arsenal", "Chelsea")
            .sport("soccer_epl", "EPL")
            .starts_at(datetime!(2026-10-19 14:00 UTC))
            .prices("pinnacle", dec!(3.50), dec!(3.60))
            .outcome_quote("pinnacle", "Draw", dec!(3.40))
            .build(),
        EventBuilder::new("bad-feed", "Spurs", "Suns")
            .starts_at(datetime!(2026-10-19 02:00 UTC))
            .quote("pinnacle", Side::Home, dec!(0.95))
            .quote("smarkets", Side::Away, dec!(3.00))
            .build(),
        EventBuilder::new("next-season", "Lakers", "Warriors")
            .starts_at(datetime!(2027-03-01 03:00 UTC))
            .prices("pinnacle", dec!(2.50), dec!(1.60))
            .prices("smarkets", dec!(1.60), dec!(2.50))
            .build(),
    ]
}

fn ids(opportunities: &[surebet::arbitrage::Opportunity]) -> Vec<&str> {
    opportunities.iter().map(|o| o.event.id.as_str()).collect()
}

#[test]
fn end_to_end_scan_ranks_and_skips() {
    let params = ScanParams::new(dec!(100), dec!(0), 7, 10);
    let detection = detect(&slate(), &params, NOW).unwrap();

    assert_eq!(
        ids(&detection.opportunities),
        vec!["yankees-redsox", "celtics-knicks"]
    );
    assert_eq!(detection.evaluated, 5);
    assert_eq!(detection.skipped.len(), 2);
    assert!(detection.skipped.iter().any(|s| matches!(
        s.error,
        ArbitrageError::TooManyOutcomes { .. }
    )));
    assert!(detection
        .skipped
        .iter()
        .any(|s| matches!(s.error, ArbitrageError::InvalidOdds { .. })));

    for opportunity in &detection.opportunities {
        assert_eq!(
            opportunity.home.stake + opportunity.away.stake,
            opportunity.total_stake
        );
        assert_ne!(opportunity.home.bookmaker, opportunity.away.bookmaker);
        assert!(opportunity.inverse_sum < Decimal::ONE);
    }
}

#[test]
fn celtics_knicks_matches_the_reference_split() {
    let params = ScanParams::new(dec!(100), dec!(0), 7, 10);
    let found = find_opportunities_on(&slate(), &params, NOW).unwrap();
    let celtics = found
        .iter()
        .find(|o| o.event.id == "celtics-knicks")
        .unwrap();

    assert_eq!(celtics.roi, dec!(3.73));
    assert_eq!(celtics.home.bookmaker, "pinnacle");
    assert_eq!(celtics.home.stake, dec!(49.40));
    assert_eq!(celtics.away.bookmaker, "smarkets");
    assert_eq!(celtics.away.stake, dec!(50.60));
    assert_eq!(celtics.home.payout(), dec!(103.7400));
    assert_eq!(celtics.away.payout(), dec!(103.7300));
}

#[test]
fn fine_precision_keeps_payouts_within_a_cent() {
    let params = ScanParams::new(dec!(1000), dec!(0), 7, 10).with_stake_precision(8);
    let found = find_opportunities_on(&slate(), &params, NOW).unwrap();

    assert!(!found.is_empty());
    for opportunity in &found {
        let spread = (opportunity.home.payout() - opportunity.away.payout()).abs();
        assert!(spread < dec!(0.01), "{} spread {}", opportunity.event.id, spread);
    }
}

#[test]
fn filters_narrow_the_result() {
    let base = ScanParams::new(dec!(100), dec!(0), 7, 10);

    let mlb = base.clone().with_sports(vec!["mlb".to_string()]);
    assert_eq!(
        ids(&find_opportunities_on(&slate(), &mlb, NOW).unwrap()),
        vec!["yankees-redsox"]
    );

    let high_roi = ScanParams::new(dec!(100), dec!(4), 7, 10);
    assert_eq!(
        ids(&find_opportunities_on(&slate(), &high_roi, NOW).unwrap()),
        vec!["yankees-redsox"]
    );

    let one = ScanParams::new(dec!(100), dec!(0), 7, 1);
    assert_eq!(find_opportunities_on(&slate(), &one, NOW).unwrap().len(), 1);

    let clamped = ScanParams::new(dec!(100), dec!(0), 365, 10);
    assert!(!ids(&find_opportunities_on(&slate(), &clamped, NOW).unwrap()).contains(&"next-season"));

    let by_start = base.with_order(RankOrder::StartThenRoi);
    assert_eq!(
        ids(&find_opportunities_on(&slate(), &by_start, NOW).unwrap()),
        vec!["yankees-redsox", "celtics-knicks"]
    );
}

#[test]
fn friendly_bookmakers_and_fallback() {
    let base = ScanParams::new(dec!(100), dec!(0), 7, 10);

    let strict = base.clone().with_bookmakers(BookmakerFilter::allow_list(
        vec!["pinnacle".to_string(), "smarkets".to_string()],
        FallbackPolicy::Skip,
    ));
    let found = find_opportunities_on(&slate(), &strict, NOW).unwrap();
    assert_eq!(ids(&found), vec!["celtics-knicks"]);

    let fallback = base.with_bookmakers(BookmakerFilter::allow_list(
        vec!["pinnacle".to_string(), "smarkets".to_string()],
        FallbackPolicy::UseAll,
    ));
    let found = find_opportunities_on(&slate(), &fallback, NOW).unwrap();
    assert_eq!(ids(&found), vec!["yankees-redsox", "celtics-knicks"]);
}

#[test]
fn invalid_stake_fails_the_whole_call() {
    let params = ScanParams::new(dec!(-5), dec!(0), 7, 10);
    assert_eq!(
        find_opportunities_on(&slate(), &params, NOW).unwrap_err(),
        ArbitrageError::InvalidStake(dec!(-5))
    );
}

#[tokio::test]
async fn scanner_feeds_the_http_api() {
    let events: Vec<Event> = slate()
        .into_iter()
        .map(|mut e| {
            e.commence_time = time::OffsetDateTime::now_utc() + time::Duration::hours(6);
            e
        })
        .collect();
    let scanner = Scanner::new(
        StaticSource::new(events),
        ScanParams::new(dec!(100), dec!(0), 7, 10),
    );
    let state = AppState::new(scanner.params().clone());

    let report = scanner.scan().await.unwrap();
    state.record_scan(&report).await;
    assert_eq!(report.events_considered, 6);

    let app = create_router(state.clone());
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/surebets?sport=nba")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["events_available"], 6);
    assert_eq!(body["count"], 2);
    assert_eq!(body["opportunities"][0]["event_id"], "next-season");
    let top_roi: Decimal = body["opportunities"][0]["roi"].as_str().unwrap().parse().unwrap();
    assert_eq!(top_roi, dec!(25));
    assert_eq!(body["opportunities"][1]["event_id"], "celtics-knicks");
    assert_eq!(body["opportunities"][1]["legs"][0]["side"], "home");

    let response = app
        .oneshot(Request::builder().uri("/api/v1/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "running");
    assert_eq!(body["scans"], 1);
    assert_eq!(body["last_opportunities"], 3);
}

/// Fetch live odds and run a scan.
#[tokio::test]
#[ignore = "requires THE_ODDS_API_KEY"]
async fn test_live_scan() {
    let config = match live_config() {
        Some(c) => c,
        None => {
            println!("Skipping: THE_ODDS_API_KEY not set");
            return;
        }
    };

    let feed = OddsFeed::from_config(&config).expect("feed");
    let snapshot = feed.snapshot().await.expect("live snapshot");
    println!("Fetched {} events", snapshot.len());

    for event in snapshot.events.iter() {
        assert_ne!(event.home, event.away);
        assert!(event.quotes.iter().all(|q| q.odds > Decimal::ZERO));
    }

    let scanner = Scanner::new(feed, config.scan_params());
    let report = scanner.scan().await.expect("live scan");
    println!(
        "{} surebets out of {} events",
        report.opportunities.len(),
        report.events_considered
    );
    for opportunity in &report.opportunities {
        assert_eq!(
            opportunity.home.stake + opportunity.away.stake,
            opportunity.total_stake
        );
    }
}
