//! Direction transform
//!
//! Stepper wiring decides which way "positive" turns the motor. A joint
//! configures the physical direction it considers positive; every position,
//! velocity, target and offset crossing the hardware boundary is multiplied
//! by the same sign, in both directions.

/// Logical motion direction relative to the hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Logical and hardware conventions agree
    #[default]
    Normal,
    /// Logical positive is hardware negative
    Inverted,
}

impl Direction {
    /// Direction for an `invert_direction` config flag
    pub const fn from_inverted(inverted: bool) -> Self {
        if inverted {
            Direction::Inverted
        } else {
            Direction::Normal
        }
    }

    /// Sign multiplier (+1 or -1)
    pub const fn sign(self) -> f64 {
        match self {
            Direction::Normal => 1.0,
            Direction::Inverted => -1.0,
        }
    }

    /// Convert a signed quantity between conventions
    ///
    /// The transform is its own inverse, so the same call maps logical to
    /// hardware and hardware to logical.
    #[inline]
    pub fn apply(self, value: f64) -> f64 {
        match self {
            Direction::Normal => value,
            Direction::Inverted => -value,
        }
    }

    pub const fn is_inverted(self) -> bool {
        matches!(self, Direction::Inverted)
    }
}
