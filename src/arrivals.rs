use rand::Rng;
use rand_distr::{Distribution, Poisson};

/// Draws the number of new arrivals each minute from a Poisson
/// distribution with the configured intensity.
#[derive(Clone, Debug)]
pub struct ArrivalGenerator {
    poisson: Option<Poisson<f64>>,
}

impl ArrivalGenerator {
    /// Creates a generator for the given intensity in aircraft per minute.
    /// A zero intensity generates no traffic at all.
    pub(crate) fn new(rate_per_minute: f64) -> Self {
        let poisson = (rate_per_minute > 0.0)
            .then(|| Poisson::new(rate_per_minute).expect("rate was validated"));
        Self { poisson }
    }

    /// The number of aircraft arriving this minute.
    pub(crate) fn sample(&self, rng: &mut impl Rng) -> u32 {
        self.poisson.as_ref().map_or(0, |p| p.sample(rng) as u32)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn zero_intensity_generates_nothing() {
        let arrivals = ArrivalGenerator::new(0.0);
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            assert_eq!(arrivals.sample(&mut rng), 0);
        }
    }

    #[test]
    fn sample_mean_tracks_the_intensity() {
        let arrivals = ArrivalGenerator::new(2.0);
        let mut rng = StdRng::seed_from_u64(42);
        let total: u32 = (0..10_000).map(|_| arrivals.sample(&mut rng)).sum();
        let mean = total as f64 / 10_000.0;
        assert!((1.9..=2.1).contains(&mean), "mean was {}", mean);
    }

    #[test]
    fn low_intensity_still_generates_eventually() {
        let arrivals = ArrivalGenerator::new(0.02);
        let mut rng = StdRng::seed_from_u64(42);
        let total: u32 = (0..10_000).map(|_| arrivals.sample(&mut rng)).sum();
        assert!(total > 0);
    }
}
