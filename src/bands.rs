use crate::config::ConfigError;
use crate::util::{minutes_to_fly, Interval};
use once_cell::sync::Lazy;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// The band table applied when a configuration does not supply its own.
static DEFAULT_BANDS: Lazy<SpeedBandTable> = Lazy::new(|| {
    SpeedBandTable::new(vec![
        SpeedBand::new(0.0, 5.0, 120.0, 150.0),
        SpeedBand::new(5.0, 15.0, 150.0, 200.0),
        SpeedBand::new(15.0, 50.0, 200.0, 250.0),
        SpeedBand::new(50.0, 100.0, 250.0, 300.0),
        SpeedBand::new(100.0, f64::INFINITY, 300.0, 500.0),
    ])
});

/// A contiguous distance-to-runway interval with its permitted speeds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeedBand {
    /// The distances covered by the band in nautical miles.
    /// The upper bound is exclusive, except that the outermost band is unbounded.
    pub distances: Interval<f64>,
    /// The permitted speeds within the band in knots.
    pub speeds: Interval<f64>,
}

impl SpeedBand {
    /// Creates a new band.
    pub const fn new(min_nm: f64, max_nm: f64, min_kt: f64, max_kt: f64) -> Self {
        Self {
            distances: Interval::new(min_nm, max_nm),
            speeds: Interval::new(min_kt, max_kt),
        }
    }
}

/// The permitted speed intervals over the whole approach, ordered by
/// ascending distance and partitioning `[0, ∞)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeedBandTable {
    bands: Vec<SpeedBand>,
}

impl Default for SpeedBandTable {
    fn default() -> Self {
        DEFAULT_BANDS.clone()
    }
}

impl SpeedBandTable {
    /// Creates a table from bands ordered by ascending distance.
    /// Call [validate](Self::validate) before simulating with it.
    pub fn new(bands: Vec<SpeedBand>) -> Self {
        Self { bands }
    }

    /// The bands, by ascending distance.
    pub fn bands(&self) -> &[SpeedBand] {
        &self.bands
    }

    /// Index of the band containing the given distance.
    /// A linear scan is plenty at this table size.
    pub fn index_of(&self, distance: f64) -> usize {
        self.bands
            .iter()
            .position(|b| distance >= b.distances.min && distance < b.distances.max)
            .unwrap_or(self.bands.len() - 1)
    }

    /// The permitted speed interval at the given distance.
    pub fn speeds_at(&self, distance: f64) -> Interval<f64> {
        self.bands[self.index_of(distance)].speeds
    }

    /// Draws a uniformly random permitted speed for the given distance.
    pub fn sample_speed(&self, distance: f64, rng: &mut impl Rng) -> f64 {
        let speeds = self.speeds_at(distance);
        rng.gen_range(speeds.min..=speeds.max)
    }

    /// The fastest possible transit of `[from, to]`, in minutes, flying
    /// each band at its maximum speed.
    pub fn min_transit_minutes(&self, from: f64, to: f64) -> f64 {
        self.bands
            .iter()
            .map(|b| {
                let lo = f64::max(from, b.distances.min);
                let hi = f64::min(to, b.distances.max);
                if hi > lo {
                    minutes_to_fly(b.speeds.max, hi - lo)
                } else {
                    0.0
                }
            })
            .sum()
    }

    /// Estimated minutes to the runway from `distance`: the remainder of
    /// the current band at the current speed, every band below it at its
    /// maximum speed.
    pub fn estimate_minutes(&self, distance: f64, speed: f64) -> f64 {
        let idx = self.index_of(distance);
        let mut minutes = minutes_to_fly(speed, distance - self.bands[idx].distances.min);
        for band in &self.bands[..idx] {
            minutes += minutes_to_fly(band.speeds.max, band.distances.length());
        }
        minutes
    }

    /// Checks that the bands partition `[0, ∞)` with sane speed bounds.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let first = self.bands.first().ok_or(ConfigError::EmptyBandTable)?;
        if first.distances.min != 0.0 {
            return Err(ConfigError::DiscontiguousBands(first.distances.min));
        }
        let mut expected = 0.0;
        for band in &self.bands {
            if band.distances.min != expected || band.distances.max <= band.distances.min {
                return Err(ConfigError::DiscontiguousBands(band.distances.min));
            }
            if !(band.speeds.min > 0.0 && band.speeds.min < band.speeds.max) {
                return Err(ConfigError::InvalidBandSpeeds(band.distances.min));
            }
            expected = band.distances.max;
        }
        if expected.is_finite() {
            return Err(ConfigError::DiscontiguousBands(expected));
        }
        Ok(())
    }
}
