//! Positive line-item quantities.

use serde::{Deserialize, Deserializer, Serialize};

/// Quantity of a line item. Always in `1..=i32::MAX`.
///
/// The upper bound is the largest value the remote tables can store, so an
/// in-memory quantity always persists unchanged. Deserialization rejects
/// zero and anything above the bound, so a malformed snapshot can never
/// smuggle an empty or unstorable line into a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    /// The smallest valid quantity, and the implicit quantity of wishlist entries.
    pub const ONE: Self = Self(1);

    /// The largest storable quantity (`i32::MAX`).
    pub const MAX: Self = Self(i32::MAX.unsigned_abs());

    /// Create a quantity, returning `None` for zero or values above [`MAX`](Self::MAX).
    #[must_use]
    pub const fn new(n: u32) -> Option<Self> {
        if n == 0 || n > Self::MAX.0 {
            None
        } else {
            Some(Self(n))
        }
    }

    /// Clamp a requested quantity into `[1, max]`.
    ///
    /// Anything below 1 (including negative input from a form) becomes 1,
    /// anything above `max` becomes `max`.
    #[must_use]
    pub fn clamped(requested: i64, max: Self) -> Self {
        let n = requested.clamp(1, i64::from(max.0));
        // n is within [1, i32::MAX] here
        Self(u32::try_from(n).unwrap_or(max.0))
    }

    /// Add two quantities, saturating at [`MAX`](Self::MAX).
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        let sum = self.0.saturating_add(other.0);
        if sum > Self::MAX.0 { Self::MAX } else { Self(sum) }
    }

    /// Get the underlying value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Value as `i32` for storage. Exact, since quantities never exceed `i32::MAX`.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        i32::try_from(self.0).unwrap_or(i32::MAX)
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i32> for Quantity {
    type Error = i32;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        u32::try_from(value)
            .ok()
            .and_then(Self::new)
            .ok_or(value)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let n = u32::deserialize(deserializer)?;
        Self::new(n).ok_or_else(|| {
            serde::de::Error::custom("quantity must be between 1 and 2147483647")
        })
    }
}
