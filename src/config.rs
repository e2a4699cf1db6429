use std::time::Duration;

use crate::error::EvictionError;

/// Environment variable read by [`EvictionConfig::from_env`].
pub const TTL_ENV_VAR: &str = "EVICTION_TTL_MS";

/// Describes how long entries of an [`EvictionMap`](crate::EvictionMap) live.
///
/// # Example
///
/// ```rust
/// use evicting_map::{EvictionConfig, EvictionMap};
/// use std::time::Duration;
///
/// let config = EvictionConfig::default().with_ttl(Duration::from_secs(30));
/// let map: EvictionMap<String, u32> = EvictionMap::with_config(config).unwrap();
/// assert_eq!(map.ttl(), Some(Duration::from_secs(30)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EvictionConfig {
    ttl: TtlSetting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum TtlSetting {
    #[default]
    Never,
    Duration(Duration),
    Millis(i64),
}

impl EvictionConfig {
    /// Creates a configuration whose entries never expire.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the time-to-live measured from an entry's last write.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = TtlSetting::Duration(ttl);
        self
    }

    /// Sets the time-to-live in milliseconds.
    ///
    /// Negative values are accepted here and rejected by [`validate`](Self::validate).
    pub fn with_ttl_millis(mut self, millis: i64) -> Self {
        self.ttl = TtlSetting::Millis(millis);
        self
    }

    /// Disables expiration.
    pub fn never_expire(mut self) -> Self {
        self.ttl = TtlSetting::Never;
        self
    }

    /// Reads the TTL from `EVICTION_TTL_MS`. An unset variable means entries
    /// never expire.
    pub fn from_env() -> Result<Self, EvictionError> {
        match std::env::var(TTL_ENV_VAR) {
            Ok(raw) => Self::parse_ttl_millis(&raw),
            Err(_) => Ok(Self::default()),
        }
    }

    fn parse_ttl_millis(raw: &str) -> Result<Self, EvictionError> {
        let millis = raw
            .trim()
            .parse::<i64>()
            .map_err(|_| EvictionError::InvalidConfig {
                var: TTL_ENV_VAR,
                value: raw.to_string(),
            })?;
        let config = Self::default().with_ttl_millis(millis);
        config.validate()?;
        Ok(config)
    }

    /// Checks that the TTL is positive.
    pub fn validate(&self) -> Result<(), EvictionError> {
        self.ttl().map(|_| ())
    }

    /// The validated TTL, `None` if entries never expire.
    pub fn ttl(&self) -> Result<Option<Duration>, EvictionError> {
        match self.ttl {
            TtlSetting::Never => Ok(None),
            TtlSetting::Duration(ttl) if ttl.is_zero() => Err(EvictionError::ZeroTtl),
            TtlSetting::Duration(ttl) => Ok(Some(ttl)),
            TtlSetting::Millis(millis) if millis < 0 => Err(EvictionError::InvalidTtl { millis }),
            TtlSetting::Millis(0) => Err(EvictionError::ZeroTtl),
            TtlSetting::Millis(millis) => Ok(Some(Duration::from_millis(millis.unsigned_abs()))),
        }
    }
}
