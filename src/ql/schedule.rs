/// Decaying rate schedule over the 0-based episode index.
///
/// `rate(e) = clamp(1 - log10((e + 1) / 25), min_rate, 1.0)`
///
/// Yields 1.0 for the first 25 episodes, then decays logarithmically down to
/// the configured floor. Used for both the learning rate and the exploration
/// rate; the exact shape directly affects convergence speed.
#[derive(Clone, Copy, Debug)]
pub struct DecayingRate {
    min_rate: f64,
}

impl DecayingRate {
    pub fn new(min_rate: f64) -> Self {
        assert!((0.0..=1.0).contains(&min_rate));
        Self { min_rate }
    }

    pub fn at(
        &self,
        episode: usize,
    ) -> f64 {
        let rate = 1.0 - ((episode as f64 + 1.0) / 25.0).log10();
        rate.min(1.0).max(self.min_rate)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0, 1.0)]
    #[case(10, 1.0)]
    #[case(24, 1.0)]
    #[case(49, 0.698_970_004_336_018_8)]
    #[case(249, 0.001)]
    #[case(100_000, 0.001)]
    fn test_rate_values(
        #[case] episode: usize,
        #[case] expected: f64,
    ) {
        let rate = DecayingRate::new(0.001);
        assert!((rate.at(episode) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_rate_monotonically_non_increasing_within_limits() {
        let rate = DecayingRate::new(0.01);
        let mut previous = rate.at(0);
        assert_eq!(previous, 1.0);
        for episode in 1..10_000 {
            let current = rate.at(episode);
            assert!(current <= previous);
            assert!((0.01..=1.0).contains(&current));
            previous = current;
        }
    }
}
