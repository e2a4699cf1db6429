use thiserror::Error;

/// Errors raised while building an [`EvictionMap`](crate::EvictionMap).
///
/// Map operations themselves never fail: expiration is silent and only
/// observable through the absence of a key afterwards.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvictionError {
    /// A TTL given in milliseconds was negative.
    #[error("invalid ttl: {millis}ms is negative")]
    InvalidTtl { millis: i64 },

    /// A TTL of zero would make every entry due the moment it is written.
    #[error("invalid ttl: zero")]
    ZeroTtl,

    /// An environment variable held a value that could not be parsed.
    #[error("invalid value for {var}: {value:?}")]
    InvalidConfig { var: &'static str, value: String },
}

impl EvictionError {
    /// Returns `true` if this error is about the TTL value itself.
    pub fn is_invalid_ttl(&self) -> bool {
        matches!(self, EvictionError::InvalidTtl { .. } | EvictionError::ZeroTtl)
    }
}
