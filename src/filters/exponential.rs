use crate::constants::{SMOOTHING_ALPHA, SMOOTHING_ALPHA_MAX, SMOOTHING_ALPHA_MIN};

/// Output of one filter update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterStep {
    /// New filtered value
    pub filtered: f64,
    /// `filtered - previous filtered`
    pub delta: f64,
}

/// Single-axis exponential smoothing filter.
///
/// The state is seeded with an explicit initial value (zero for a fresh
/// session), so the first sample is already smoothed against it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialFilter {
    alpha: f64,
    initial: f64,
    previous: f64,
}

impl Default for ExponentialFilter {
    fn default() -> Self {
        Self::new(SMOOTHING_ALPHA)
    }
}

impl ExponentialFilter {
    /// Create a filter seeded at zero
    pub fn new(alpha: f64) -> Self {
        Self::with_initial(alpha, 0.0)
    }

    /// Create a filter seeded at `initial`
    pub fn with_initial(alpha: f64, initial: f64) -> Self {
        assert!(
            alpha > SMOOTHING_ALPHA_MIN && alpha <= SMOOTHING_ALPHA_MAX,
            "Alpha must be in (0, 1]"
        );
        assert!(initial.is_finite(), "Initial value must be finite");
        Self {
            alpha,
            initial,
            previous: initial,
        }
    }

    /// Feed one raw value.
    ///
    /// Non-finite input leaves the state untouched and returns `None`.
    pub fn apply(&mut self, raw: f64) -> Option<FilterStep> {
        if !raw.is_finite() {
            return None;
        }
        let filtered = self.alpha * raw + (1.0 - self.alpha) * self.previous;
        let delta = filtered - self.previous;
        self.previous = filtered;
        Some(FilterStep { filtered, delta })
    }

    /// Last filtered value
    pub const fn value(&self) -> f64 {
        self.previous
    }

    /// Smoothing coefficient
    pub const fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Return to the seed value
    pub fn reset(&mut self) {
        self.previous = self.initial;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_filter() {
        let mut filter = ExponentialFilter::new(0.5);

        // First value is smoothed against the zero seed
        let step = filter.apply(10.0).unwrap();
        assert_eq!(step.filtered, 5.0);
        assert_eq!(step.delta, 5.0);

        let step = filter.apply(20.0).unwrap();
        assert_eq!(step.filtered, 12.5); // 0.5 * 20 + 0.5 * 5
        assert_eq!(step.delta, 7.5);
    }

    #[test]
    fn test_alpha_bounds() {
        // High alpha = less smoothing
        let mut filter1 = ExponentialFilter::with_initial(0.9, 10.0);
        let step = filter1.apply(20.0).unwrap();
        assert!((step.filtered - 19.0).abs() < 0.001); // 0.9 * 20 + 0.1 * 10

        // Low alpha = more smoothing
        let mut filter2 = ExponentialFilter::with_initial(0.1, 10.0);
        let step = filter2.apply(20.0).unwrap();
        assert!((step.filtered - 11.0).abs() < 0.001); // 0.1 * 20 + 0.9 * 10
    }

    #[test]
    fn test_default_alpha() {
        let filter = ExponentialFilter::default();
        assert_eq!(filter.alpha(), 0.2);
        assert_eq!(filter.value(), 0.0);
    }

    #[test]
    fn test_non_finite_input_is_ignored() {
        let mut filter = ExponentialFilter::default();
        filter.apply(10.0);
        let before = filter.value();

        assert!(filter.apply(f64::NAN).is_none());
        assert!(filter.apply(f64::INFINITY).is_none());
        assert_eq!(filter.value(), before);
    }

    #[test]
    fn test_reset_returns_to_seed() {
        let mut filter = ExponentialFilter::with_initial(0.2, 3.0);
        filter.apply(50.0);
        filter.reset();
        assert_eq!(filter.value(), 3.0);
    }
}
