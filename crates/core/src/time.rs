use chrono::{DateTime, Duration, Utc};

/// Source of "now" for progress timestamps.
///
/// Services hold a `Clock` instead of calling `Utc::now()` so tests can pin time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Clock {
    #[default]
    System,
    Fixed(DateTime<Utc>),
}

impl Clock {
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Fixed(at) => *at,
        }
    }

    /// Moves a fixed clock forward. No effect on the system clock.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(at) = self {
            *at += delta;
        }
    }
}

/// Deterministic timestamp for tests (2024-09-25T00:00:00Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_727_222_400;

/// Returns the deterministic test timestamp.
///
/// # Panics
///
/// Panics if the constant cannot be represented, which it always can.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}
