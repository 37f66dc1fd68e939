//! Token expiry classification.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use crate::config::config::SessionConfig;
use crate::security::claims::PeekedClaims;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryThresholds {
    /// Remaining seconds at or below which the caller should be warned.
    pub warning_secs: i64,
    /// Remaining seconds at or below which a refresh should be attempted.
    pub refresh_secs: i64,
}

impl Default for ExpiryThresholds {
    fn default() -> Self {
        Self {
            warning_secs: 5 * 60,
            refresh_secs: 2 * 60,
        }
    }
}

impl From<&SessionConfig> for ExpiryThresholds {
    fn from(config: &SessionConfig) -> Self {
        Self {
            warning_secs: config.warning_threshold_secs,
            refresh_secs: config.refresh_threshold_secs,
        }
    }
}

/// Where a token sits relative to its `exp` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenExpiry {
    Valid { remaining: i64 },
    Expiring { remaining: i64 },
    RefreshDue { remaining: i64 },
    Expired,
    /// Not a three-part token, or no `exp` claim.
    Unknown,
}

impl TokenExpiry {
    pub fn classify(exp: Option<i64>, now: DateTime<Utc>, thresholds: &ExpiryThresholds) -> Self {
        let Some(exp) = exp else {
            return TokenExpiry::Unknown;
        };

        let remaining = exp - now.timestamp();
        if remaining <= 0 {
            TokenExpiry::Expired
        } else if remaining <= thresholds.refresh_secs {
            TokenExpiry::RefreshDue { remaining }
        } else if remaining <= thresholds.warning_secs {
            TokenExpiry::Expiring { remaining }
        } else {
            TokenExpiry::Valid { remaining }
        }
    }

    /// Reads `exp` from an unverified token and classifies it.
    pub fn inspect(token: &str, now: DateTime<Utc>, thresholds: &ExpiryThresholds) -> Self {
        let exp = PeekedClaims::peek(token).and_then(|claims| claims.exp);
        Self::classify(exp, now, thresholds)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenExpiry::Valid { .. } => "valid",
            TokenExpiry::Expiring { .. } => "expiring",
            TokenExpiry::RefreshDue { .. } => "refresh_due",
            TokenExpiry::Expired => "expired",
            TokenExpiry::Unknown => "unknown",
        }
    }

    pub fn remaining(&self) -> Option<i64> {
        match self {
            TokenExpiry::Valid { remaining }
            | TokenExpiry::Expiring { remaining }
            | TokenExpiry::RefreshDue { remaining } => Some(*remaining),
            TokenExpiry::Expired => Some(0),
            TokenExpiry::Unknown => None,
        }
    }

    pub fn show_warning(&self) -> bool {
        matches!(
            self,
            TokenExpiry::Expiring { .. } | TokenExpiry::RefreshDue { .. }
        )
    }

    pub fn refresh_recommended(&self) -> bool {
        matches!(self, TokenExpiry::RefreshDue { .. })
    }
}

/// Body of `GET /api/session/status`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub status: &'static str,
    pub expires_at: Option<DateTime<Utc>>,
    pub seconds_remaining: Option<i64>,
    pub show_warning: bool,
    pub refresh_recommended: bool,
}

impl SessionStatus {
    pub fn for_token(token: &str, now: DateTime<Utc>, thresholds: &ExpiryThresholds) -> Self {
        let exp = PeekedClaims::peek(token).and_then(|claims| claims.exp);
        let expiry = TokenExpiry::classify(exp, now, thresholds);

        Self {
            status: expiry.as_str(),
            expires_at: exp.and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
            seconds_remaining: expiry.remaining(),
            show_warning: expiry.show_warning(),
            refresh_recommended: expiry.refresh_recommended(),
        }
    }
}
