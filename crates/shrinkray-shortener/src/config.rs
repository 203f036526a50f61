use std::num::NonZeroU32;
use std::time::Duration;
use typed_builder::TypedBuilder;

pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 16;

/// Tunables of the shortening protocol.
#[derive(Debug, Clone, TypedBuilder)]
pub struct ShortenerConfig {
    /// Upper bound on the duration of one `shorten` or `resolve` call,
    /// storage round trips included.
    #[builder(default = DEFAULT_DEADLINE)]
    pub deadline: Duration,
    /// How many candidate tokens to try before giving up with
    /// `TooManyCollisions`. `None` retries until the deadline expires.
    #[builder(default = NonZeroU32::new(DEFAULT_MAX_ATTEMPTS))]
    pub max_attempts: Option<NonZeroU32>,
}

impl Default for ShortenerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
