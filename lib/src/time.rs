//! Simulation time.

use std::{fmt, ops};

use serde::{Deserialize, Serialize};
use time::Duration;

/// Length of a Kerbin solar day (`sec`). Spawn rates and warning times
/// are expressed in these days.
pub const KERBIN_DAY: f64 = 6.0 * 60.0 * 60.0;

/// Universal time, measured from the start of the game.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct UT(Duration);

impl UT {
    pub const ZERO: UT = UT(Duration::ZERO);

    pub fn new_dhms(days: u32, hours: u8, minutes: u8, seconds: u8, millis: u16) -> Self {
        Self(Duration::new(
            seconds as i64
                + 60 * minutes as i64
                + 60 * 60 * hours as i64
                + (KERBIN_DAY as i64) * days as i64,
            millis as i32 * 1_000_000,
        ))
    }

    pub fn new_seconds(sec: f64) -> UT {
        UT::from_duration(Duration::seconds_f64(sec))
    }

    pub fn new_days(days: f64) -> UT {
        UT::new_seconds(days * KERBIN_DAY)
    }

    /// Like [`UT::new_seconds`], but `None` when `sec` is not finite or
    /// does not fit.
    pub fn checked_seconds(sec: f64) -> Option<UT> {
        Duration::checked_seconds_f64(sec).map(UT::from_duration)
    }

    pub fn checked_add(self, rhs: Duration) -> Option<UT> {
        self.0.checked_add(rhs).map(UT)
    }

    pub fn is_negative(self) -> bool {
        self.0.is_negative()
    }

    pub fn as_seconds(self) -> f64 {
        self.0.as_seconds_f64()
    }

    pub fn as_days(self) -> f64 {
        self.as_seconds() / KERBIN_DAY
    }

    pub fn into_duration(self) -> Duration {
        self.0
    }

    pub fn from_duration(duration: Duration) -> Self {
        Self(duration)
    }
}

/// A span of Kerbin days as a [`Duration`].
pub fn days(days: f64) -> Duration {
    Duration::seconds_f64(days * KERBIN_DAY)
}

/// A span of Kerbin days, or `None` if it does not fit in a [`Duration`].
pub fn checked_days(days: f64) -> Option<Duration> {
    Duration::checked_seconds_f64(days * KERBIN_DAY)
}

impl ops::Sub<UT> for UT {
    type Output = Duration;

    fn sub(self, rhs: UT) -> Self::Output {
        self.0 - rhs.0
    }
}

impl ops::Sub<Duration> for UT {
    type Output = UT;

    fn sub(self, rhs: Duration) -> Self::Output {
        UT(self.0 - rhs)
    }
}

impl ops::Add<Duration> for UT {
    type Output = UT;

    fn add(self, rhs: Duration) -> Self::Output {
        UT(self.0 + rhs)
    }
}

impl ops::AddAssign<Duration> for UT {
    fn add_assign(&mut self, rhs: Duration) {
        self.0 += rhs;
    }
}

impl fmt::Display for UT {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UT({}s)", self.0.as_seconds_f64())
    }
}

impl fmt::Debug for UT {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}
