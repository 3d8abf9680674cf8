//! Types for the `/health/` endpoint

/// Result of a liveness check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiHealth {
    /// The API answered 200
    Healthy,
    /// Any other status, or no answer at all
    Unhealthy,
}

impl ApiHealth {
    /// True when healthy
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Healthy)
    }
}

impl std::fmt::Display for ApiHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Healthy => "ok",
            Self::Unhealthy => "fail",
        })
    }
}
