use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of the remote API quota, as reported by the last response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    pub limit: u32,
    pub remaining: u32,
    /// Epoch second at which the quota refills.
    pub reset: u64,
}

impl RateLimit {
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// The refill time as a UTC timestamp, if representable.
    pub fn reset_at(&self) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.reset).ok()?;
        Utc.timestamp_opt(secs, 0).single()
    }

    /// Parse the `x-ratelimit-*` header triple.
    ///
    /// Returns `None` unless all three headers are present and numeric.
    pub fn from_headers(limit: Option<&str>, remaining: Option<&str>, reset: Option<&str>) -> Option<Self> {
        Some(Self {
            limit: limit?.trim().parse().ok()?,
            remaining: remaining?.trim().parse().ok()?,
            reset: reset?.trim().parse().ok()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_complete_headers() {
        let rl = RateLimit::from_headers(Some("60"), Some("0"), Some("1700000000")).unwrap();
        assert_eq!(rl.limit, 60);
        assert!(rl.is_exhausted());
        assert_eq!(rl.reset_at().unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn missing_header_yields_none() {
        assert!(RateLimit::from_headers(Some("60"), None, Some("1")).is_none());
        assert!(RateLimit::from_headers(Some("x"), Some("1"), Some("1")).is_none());
    }
}
