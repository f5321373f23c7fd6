//! The fundamental unit of time in the emulator.

use std::fmt;

/// A count of CPU clock ticks (T-states).
///
/// The counter only moves forward during emulation. Subtraction saturates
/// so that measuring an interval can never underflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ticks(pub u64);

impl Ticks {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn new(count: u64) -> Self {
        Self(count)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for Ticks {
    fn from(count: u64) -> Self {
        Self(count)
    }
}

impl fmt::Display for Ticks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}T", self.0)
    }
}

impl core::ops::Add for Ticks {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl core::ops::AddAssign for Ticks {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl core::ops::AddAssign<u64> for Ticks {
    fn add_assign(&mut self, rhs: u64) {
        self.0 += rhs;
    }
}

impl core::ops::Sub for Ticks {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

#[cfg(test)]
mod tests {
    use super::Ticks;

    #[test]
    fn interval_never_underflows() {
        assert_eq!(Ticks::new(3) - Ticks::new(10), Ticks::ZERO);
        assert_eq!(Ticks::new(10) - Ticks::new(3), Ticks::new(7));
    }

    #[test]
    fn accumulates_raw_counts() {
        let mut t = Ticks::ZERO;
        t += 4;
        t += Ticks::new(7);
        assert_eq!(t.get(), 11);
        assert_eq!(t.to_string(), "11T");
    }
}
