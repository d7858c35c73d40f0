/// A selection weight: a finite, non-negative `f64`.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
#[repr(transparent)]
pub(crate) struct Weight(f64);

impl Weight {
    pub(crate) const ZERO: Self = Self(0.0);
    pub(crate) const ONE: Self = Self(1.0);

    /// Returns `None` for negative, NaN or infinite values.
    #[inline]
    pub(crate) fn new(weight: f64) -> Option<Self> {
        (weight.is_finite() && weight >= 0.0).then_some(Self(weight))
    }

    #[inline]
    pub(crate) const fn get(self) -> f64 {
        self.0
    }

    #[inline]
    pub(crate) fn is_positive(self) -> bool {
        self.0 > 0.0
    }
}

impl Default for Weight {
    fn default() -> Self {
        Self::ONE
    }
}
