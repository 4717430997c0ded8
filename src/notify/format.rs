//! Plain-text rendering of opportunities.

use std::fmt::Write;

use time::macros::format_description;
use time::OffsetDateTime;

use crate::arbitrage::Opportunity;

/// Text shown when a scan found nothing to report.
pub fn no_data_message() -> &'static str {
    "No surebets match the current filters (or no odds data is available right now)."
}

/// Render one opportunity.
///
/// ```text
/// NBA - basketball_nba
/// Boston Celtics vs New York Knicks
/// Kick-off: 2026-10-20 23:30 UTC
///
/// Pinnacle @ 2.10 -> stake 49.40
/// Smarkets @ 2.05 -> stake 50.60
///
/// ROI: 3.73%  Expected profit: 3.73
/// ```
pub fn format_opportunity(opportunity: &Opportunity) -> String {
    let event = &opportunity.event;
    let mut out = String::new();

    let _ = writeln!(out, "{} - {}", event.sport_title, event.sport_key);
    let _ = writeln!(out, "{} vs {}", event.home, event.away);
    let _ = writeln!(out, "Kick-off: {}", kick_off(event.commence_time));
    out.push('\n');

    for leg in opportunity.legs() {
        let _ = writeln!(
            out,
            "{} @ {} -> stake {}",
            leg.bookmaker_title, leg.odds, leg.stake
        );
    }
    out.push('\n');

    let _ = write!(
        out,
        "ROI: {}%  Expected profit: {}",
        opportunity.roi, opportunity.profit
    );
    out
}

/// Render a ranked list, separated by blank lines.
pub fn format_opportunities(opportunities: &[Opportunity]) -> String {
    if opportunities.is_empty() {
        return no_data_message().to_string();
    }
    opportunities
        .iter()
        .map(format_opportunity)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Escape text for Telegram's HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

fn kick_off(at: OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute] UTC");
    at.format(&format).unwrap_or_else(|_| at.to_string())
}
