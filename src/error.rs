//! Unified error types for the surebet scanner.

use rust_decimal::Decimal;
use thiserror::Error;

/// Unified error type for the surebet scanner.
#[derive(Error, Debug)]
pub enum SurebetError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration loaded but failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Arbitrage calculation error.
    #[error("arbitrage error: {0}")]
    Arbitrage(#[from] ArbitrageError),

    /// Odds feed error.
    #[error("odds feed error: {0}")]
    Feed(#[from] FeedError),

    /// Notification delivery error.
    #[error("notification error: {0}")]
    Notify(#[from] NotifyError),
}

/// Errors raised by the arbitrage engine.
///
/// `InvalidStake` and `InvalidParameter` fail a whole scan. The remaining
/// variants only disqualify the event they were raised for.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArbitrageError {
    /// Decimal odds must be strictly greater than 1.0.
    #[error("invalid odds {odds}: decimal odds must be greater than 1.0")]
    InvalidOdds {
        /// The offending odds value.
        odds: Decimal,
    },

    /// Total stake must be positive, within the stake limit and no finer
    /// than the stake precision.
    #[error("invalid total stake {0}: must be greater than zero, within the stake limit and no finer than the stake precision")]
    InvalidStake(Decimal),

    /// A scan parameter is out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Not enough allowed bookmakers quote the event.
    #[error("event {event_id}: only {found} allowed bookmaker(s) quote this event")]
    InsufficientBookmakers {
        /// Event identifier.
        event_id: String,
        /// Distinct allowed bookmakers found.
        found: usize,
    },

    /// The event is not a two-way market.
    #[error("event {event_id}: {outcomes} distinct outcomes quoted, only two-way markets are supported")]
    TooManyOutcomes {
        /// Event identifier.
        event_id: String,
        /// Number of distinct outcome labels seen.
        outcomes: usize,
    },

    /// The odds are too extreme to compute with.
    #[error("arithmetic overflow computing {0}")]
    Overflow(&'static str),
}

impl ArbitrageError {
    /// Short label used for metrics and log fields.
    pub fn reason(&self) -> &'static str {
        match self {
            ArbitrageError::InvalidOdds { .. } => "invalid_odds",
            ArbitrageError::InvalidStake(_) => "invalid_stake",
            ArbitrageError::InvalidParameter(_) => "invalid_parameter",
            ArbitrageError::InsufficientBookmakers { .. } => "insufficient_bookmakers",
            ArbitrageError::TooManyOutcomes { .. } => "too_many_outcomes",
            ArbitrageError::Overflow(_) => "overflow",
        }
    }

    /// Whether the error only disqualifies a single event.
    pub fn is_per_event(&self) -> bool {
        !matches!(
            self,
            ArbitrageError::InvalidStake(_) | ArbitrageError::InvalidParameter(_)
        )
    }
}

/// Odds feed errors.
#[derive(Error, Debug)]
pub enum FeedError {
    /// Fetching a sport's odds failed.
    #[error("failed to fetch odds for {sport}: {reason}")]
    FetchFailed {
        /// Sport key that failed.
        sport: String,
        /// Reason for failure.
        reason: String,
    },

    /// The API key was rejected.
    #[error("odds API rejected the API key")]
    Unauthorized,

    /// The request quota is used up.
    #[error("odds API quota exhausted")]
    QuotaExhausted,

    /// Failed to parse the odds payload.
    #[error("failed to parse odds data: {0}")]
    ParseError(String),

    /// No sport returned any data.
    #[error("no odds data available for {}", sports.join(", "))]
    NoData {
        /// Sports that were requested.
        sports: Vec<String>,
    },

    /// HTTP request failed.
    #[error("http request failed: {0}")]
    HttpError(#[from] reqwest::Error),
}

/// Notification delivery errors.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Bot token or chat id missing.
    #[error("telegram notifier is not configured")]
    NotConfigured,

    /// The Telegram API refused the message.
    #[error("telegram sendMessage failed: {0}")]
    SendFailed(String),

    /// HTTP request failed.
    #[error("http request failed: {0}")]
    HttpError(#[from] reqwest::Error),
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, SurebetError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn per_event_errors_are_distinguished_from_call_errors() {
        assert!(ArbitrageError::InvalidOdds { odds: dec!(0.9) }.is_per_event());
        assert!(ArbitrageError::TooManyOutcomes {
            event_id: "e1".to_string(),
            outcomes: 3
        }
        .is_per_event());
        assert!(ArbitrageError::Overflow("roi").is_per_event());
        assert!(!ArbitrageError::InvalidStake(dec!(0)).is_per_event());
        assert!(!ArbitrageError::InvalidParameter("x".to_string()).is_per_event());
    }

    #[test]
    fn config_errors_convert() {
        let err: SurebetError = envy::from_iter::<_, crate::config::Config>(Vec::<(String, String)>::new())
            .unwrap_err()
            .into();
        assert!(matches!(err, SurebetError::Config(_)));
        assert_eq!(
            SurebetError::InvalidConfig("SPORTS must list at least one sport key".to_string()).to_string(),
            "invalid configuration: SPORTS must list at least one sport key"
        );
    }

    #[test]
    fn no_data_lists_requested_sports() {
        let err = FeedError::NoData {
            sports: vec!["basketball_nba".to_string(), "baseball_mlb".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "no odds data available for basketball_nba, baseball_mlb"
        );
    }
}
