use ordered_float::NotNan;
use serde::{Serialize, Serializer};

/// A non-NaN f64 value in the range [0, 1].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Normalized(NotNan<f64>);

impl Normalized {
    pub const ZERO: Self = Self(unsafe { NotNan::new_unchecked(0.0) });
    pub const ONE: Self = Self(unsafe { NotNan::new_unchecked(1.0) });

    pub fn new(value: f64) -> Option<Self> {
        let value = NotNan::new(value).ok()?;
        if *value < 0.0 || *value > 1.0 {
            return None;
        }
        // -0.0 is stored as 0.0
        Some(Self(value + 0.0))
    }

    /// Clamp `value` into [0, 1]. NaN maps to zero.
    pub fn saturating(value: f64) -> Self {
        if value.is_nan() {
            return Self::ZERO;
        }
        Self::new(value.clamp(0.0, 1.0)).unwrap_or(Self::ZERO)
    }

    pub fn as_f64(&self) -> f64 {
        self.0.into_inner()
    }

    pub fn is_zero(&self) -> bool {
        self == &Self::ZERO
    }
}

impl std::cmp::PartialOrd for Normalized {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl std::cmp::Ord for Normalized {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl std::fmt::Debug for Normalized {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Normalized {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

/// A non-negative, finite f64 value
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Weight(NotNan<f64>);

impl Weight {
    pub const ZERO: Self = Self(unsafe { NotNan::new_unchecked(0.0) });

    pub fn new(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let value = NotNan::new(value).ok()?;
        if value.is_sign_negative() && *value != 0.0 {
            return None;
        }
        Some(Self(value))
    }

    /// Negative, NaN and infinite inputs all map to zero.
    pub fn clamped(value: f64) -> Self {
        Self::new(value.max(0.0)).unwrap_or(Self::ZERO)
    }

    pub fn as_f64(&self) -> f64 {
        self.0.into_inner()
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }
}

impl std::fmt::Debug for Weight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Treat NaN and infinities as absent.
pub fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}
