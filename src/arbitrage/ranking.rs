//! Filtering and ordering of detected opportunities.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::Deserialize;
use strum::{Display, EnumString};
use time::{Date, Duration};

use super::calculator::Opportunity;
use crate::odds::Event;

/// Largest accepted look-ahead window in days. Larger values are clamped.
pub const MAX_DAYS_WINDOW: u32 = 60;

/// Ordering applied to the final opportunity list.
///
/// Both orders fall back to the stable input order for full ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RankOrder {
    /// ROI descending, then start time ascending.
    #[default]
    RoiThenStart,
    /// Start time ascending, then ROI descending.
    StartThenRoi,
}

impl RankOrder {
    /// Compare two opportunities under this order.
    pub fn compare(&self, a: &Opportunity, b: &Opportunity) -> Ordering {
        let by_roi = b.roi.cmp(&a.roi);
        let by_start = a.event.commence_time.cmp(&b.event.commence_time);
        match self {
            RankOrder::RoiThenStart => by_roi.then(by_start),
            RankOrder::StartThenRoi => by_start.then(by_roi),
        }
    }
}

/// Caller filters. Every field is optional and they combine independently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpportunityFilter {
    /// Minimum ROI in percent, inclusive.
    pub min_roi: Option<Decimal>,
    /// Sport allow-list. An entry matches when it is a case-insensitive
    /// substring of the sport key or title.
    pub sports: Option<Vec<String>>,
    /// Accept events starting between today and today + N days (UTC, inclusive).
    pub days_window: Option<u32>,
}

impl OpportunityFilter {
    /// Days window after clamping to `1..=MAX_DAYS_WINDOW`.
    pub fn effective_days_window(&self) -> Option<u32> {
        self.days_window.map(|d| d.clamp(1, MAX_DAYS_WINDOW))
    }

    /// Whether the event's sport passes the allow-list.
    pub fn accepts_sport(&self, event: &Event) -> bool {
        match &self.sports {
            None => true,
            Some(sports) if sports.is_empty() => true,
            Some(sports) => {
                let key = event.sport_key.to_lowercase();
                let title = event.sport_title.to_lowercase();
                sports.iter().any(|s| {
                    let s = s.to_lowercase();
                    key.contains(&s) || title.contains(&s)
                })
            }
        }
    }

    /// Whether the event starts inside the window: `today <= start <= today + days`.
    pub fn accepts_start(&self, event: &Event, today: Date) -> bool {
        let Some(days) = self.effective_days_window() else {
            return true;
        };
        let start = event.start_date();
        let last = today
            .checked_add(Duration::days(i64::from(days)))
            .unwrap_or(Date::MAX);
        today <= start && start <= last
    }

    /// Event-level checks (sport and start window).
    pub fn accepts_event(&self, event: &Event, today: Date) -> bool {
        self.accepts_sport(event) && self.accepts_start(event, today)
    }

    /// Whether a ROI meets the minimum (inclusive).
    pub fn accepts_roi(&self, roi: Decimal) -> bool {
        self.min_roi.map_or(true, |min| roi >= min)
    }
}

/// Sort by `order` and then truncate to `max_results`.
///
/// Truncation always happens after the full sort.
pub fn rank(
    mut opportunities: Vec<Opportunity>,
    order: RankOrder,
    max_results: Option<usize>,
) -> Vec<Opportunity> {
    opportunities.sort_by(|a, b| order.compare(a, b));
    if let Some(max) = max_results {
        opportunities.truncate(max);
    }
    opportunities
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbitrage::aggregator::{best_prices, BookmakerFilter};
    use crate::arbitrage::calculator::calculate;
    use crate::odds::EventBuilder;
    use rust_decimal_macros::dec;
    use time::macros::{date, datetime};
    use time::OffsetDateTime;

    fn opportunity(id: &str, odds_a: Decimal, odds_b: Decimal, start: OffsetDateTime) -> Opportunity {
        let event = EventBuilder::new(id, "A", "B")
            .starts_at(start)
            .quote("pinnacle", crate::odds::Side::Home, odds_a)
            .quote("smarkets", crate::odds::Side::Away, odds_b)
            .build();
        let prices = best_prices(&event, &BookmakerFilter::All).unwrap();
        let (home, away) = prices.pair().unwrap();
        let plan = calculate(odds_a, odds_b, dec!(100), 2)
            .unwrap()
            .surebet()
            .unwrap();
        Opportunity::new(&event, home, away, &plan, datetime!(2026-10-18 12:00 UTC))
    }

    fn ids(list: &[Opportunity]) -> Vec<&str> {
        list.iter().map(|o| o.event.id.as_str()).collect()
    }

    #[test]
    fn ranks_by_roi_then_soonest_start() {
        let early = datetime!(2026-10-19 18:00 UTC);
        let late = datetime!(2026-10-20 18:00 UTC);
        let list = vec![
            opportunity("low", dec!(2.05), dec!(2.05), early),
            opportunity("high-late", dec!(2.30), dec!(2.05), late),
            opportunity("high-early", dec!(2.30), dec!(2.05), early),
        ];

        let ranked = rank(list, RankOrder::RoiThenStart, None);
        assert_eq!(ids(&ranked), vec!["high-early", "high-late", "low"]);
    }

    #[test]
    fn start_first_order_prefers_soonest() {
        let early = datetime!(2026-10-19 18:00 UTC);
        let late = datetime!(2026-10-20 18:00 UTC);
        let list = vec![
            opportunity("high-late", dec!(2.30), dec!(2.05), late),
            opportunity("low-early", dec!(2.05), dec!(2.05), early),
            opportunity("high-early", dec!(2.30), dec!(2.05), early),
        ];

        let ranked = rank(list, RankOrder::StartThenRoi, None);
        assert_eq!(ids(&ranked), vec!["high-early", "low-early", "high-late"]);
    }

    #[test]
    fn truncates_after_sorting() {
        let start = datetime!(2026-10-19 18:00 UTC);
        let list = vec![
            opportunity("c", dec!(2.05), dec!(2.05), start),
            opportunity("b", dec!(2.20), dec!(2.05), start),
            opportunity("a", dec!(2.40), dec!(2.05), start),
        ];

        let ranked = rank(list, RankOrder::RoiThenStart, Some(2));
        assert_eq!(ids(&ranked), vec!["a", "b"]);
    }

    #[test]
    fn full_ties_keep_input_order() {
        let start = datetime!(2026-10-19 18:00 UTC);
        let list = vec![
            opportunity("first", dec!(2.10), dec!(2.05), start),
            opportunity("second", dec!(2.10), dec!(2.05), start),
        ];
        let ranked = rank(list, RankOrder::RoiThenStart, None);
        assert_eq!(ids(&ranked), vec!["first", "second"]);
    }

    #[test]
    fn min_roi_is_inclusive() {
        let filter = OpportunityFilter {
            min_roi: Some(dec!(3.73)),
            ..Default::default()
        };
        assert!(filter.accepts_roi(dec!(3.73)));
        assert!(filter.accepts_roi(dec!(3.74)));
        assert!(!filter.accepts_roi(dec!(3.72)));

        let negative = OpportunityFilter {
            min_roi: Some(dec!(-10)),
            ..Default::default()
        };
        assert!(negative.accepts_roi(dec!(0.01)));
    }

    #[test]
    fn day_window_is_inclusive_on_both_ends() {
        let today = date!(2026 - 10 - 18);
        let filter = OpportunityFilter {
            days_window: Some(2),
            ..Default::default()
        };
        let at = |start: OffsetDateTime| EventBuilder::new("e", "A", "B").starts_at(start).build();

        assert!(filter.accepts_start(&at(datetime!(2026-10-18 00:00 UTC)), today));
        assert!(filter.accepts_start(&at(datetime!(2026-10-20 23:59 UTC)), today));
        assert!(!filter.accepts_start(&at(datetime!(2026-10-21 00:00 UTC)), today));
        assert!(!filter.accepts_start(&at(datetime!(2026-10-17 23:59 UTC)), today));
    }

    #[test]
    fn day_window_uses_utc_dates() {
        let today = date!(2026 - 10 - 18);
        let filter = OpportunityFilter {
            days_window: Some(1),
            ..Default::default()
        };
        // 01:00 on the 20th in UTC+3 is still the 19th in UTC.
        let event = EventBuilder::new("e", "A", "B")
            .starts_at(datetime!(2026-10-20 01:00 +03:00))
            .build();
        assert!(filter.accepts_start(&event, today));
    }

    #[test]
    fn day_window_is_clamped() {
        let zero = OpportunityFilter {
            days_window: Some(0),
            ..Default::default()
        };
        let huge = OpportunityFilter {
            days_window: Some(365),
            ..Default::default()
        };
        assert_eq!(zero.effective_days_window(), Some(1));
        assert_eq!(huge.effective_days_window(), Some(MAX_DAYS_WINDOW));
        assert_eq!(OpportunityFilter::default().effective_days_window(), None);
    }

    #[test]
    fn sport_filter_matches_key_or_title() {
        let nba = EventBuilder::new("e", "A", "B")
            .sport("basketball_nba", "NBA")
            .build();
        let ufc = EventBuilder::new("e", "A", "B")
            .sport("mma_mixed_martial_arts", "MMA")
            .build();
        let filter = OpportunityFilter {
            sports: Some(vec!["Basketball".to_string()]),
            ..Default::default()
        };

        assert!(filter.accepts_sport(&nba));
        assert!(!filter.accepts_sport(&ufc));

        let by_title = OpportunityFilter {
            sports: Some(vec!["mma".to_string()]),
            ..Default::default()
        };
        assert!(by_title.accepts_sport(&ufc));
        assert!(OpportunityFilter::default().accepts_sport(&ufc));
    }
}
