use crate::aircraft::ENTRY_DISTANCE_NM;
use crate::bands::SpeedBandTable;
use crate::MINUTES_PER_DAY;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A configuration the simulation refuses to run with.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("arrival intensity must be finite and non-negative, got {0}")]
    InvalidArrivalRate(f64),
    #[error("number of days to simulate must be positive")]
    NoDays,
    #[error("{name} must be a probability in [0, 1], got {value}")]
    ProbabilityOutOfRange { name: &'static str, value: f64 },
    #[error("storm duration must be between 1 and 1440 minutes, got {0}")]
    InvalidStormDuration(u32),
    #[error("operating hours must satisfy open < close <= 1440, got {open}..{close}")]
    InvalidOperatingHours { open: u32, close: u32 },
    #[error("band table must not be empty")]
    EmptyBandTable,
    #[error("band table must partition distances contiguously from zero, broken at {0} nm")]
    DiscontiguousBands(f64),
    #[error("band speed bounds must satisfy 0 < min < max, broken in band starting at {0} nm")]
    InvalidBandSpeeds(f64),
    #[error("metering {name} must be positive and finite, got {value}")]
    InvalidMeteringParameter { name: &'static str, value: f64 },
    #[error("meter fix must lie inside the track, got {0} nm")]
    MeterFixOutOfRange(f64),
}

/// The daily window during which the runway accepts arrivals,
/// in minutes after midnight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingHours {
    /// First open minute of the day.
    pub open: u32,
    /// First minute of the overnight closure.
    pub close: u32,
}

impl OperatingHours {
    /// Whether the runway is inside its scheduled hours at this minute.
    pub fn is_open(&self, minute_of_day: u32) -> bool {
        minute_of_day >= self.open && minute_of_day < self.close
    }
}

impl Default for OperatingHours {
    /// 06:00 to midnight.
    fn default() -> Self {
        Self { open: 360, close: 1440 }
    }
}

/// Parameters of the scheduled time of arrival metering protocol.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct MeteringConfig {
    /// Distance of the meter fix from the runway in nautical miles.
    pub fix_distance: f64,
    /// Minimum spacing between consecutive scheduled times at the fix, in minutes.
    pub target_spacing: f64,
    /// Schedule error tolerated before the speed is nudged, in minutes.
    pub deadband: f64,
    /// Size of one speed nudge in knots.
    pub speed_step: f64,
}

impl Default for MeteringConfig {
    fn default() -> Self {
        Self {
            fix_distance: 15.0,
            target_spacing: 5.0,
            deadband: 1.0,
            speed_step: 10.0,
        }
    }
}

/// Immutable construction-time configuration of one simulation instance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Expected arrivals per minute while the runway is open.
    pub arrival_rate: f64,
    /// Number of 1440-minute days to simulate.
    pub days: u32,
    /// Whether landing attempts can be blown into a go-around.
    pub wind_enabled: bool,
    /// Probability of a go-around on each landing attempt while windy.
    pub go_around_probability: f64,
    /// Whether storms can close the runway.
    pub storm_enabled: bool,
    /// Probability of a storm on any given day.
    pub storm_probability: f64,
    /// Duration of a storm in minutes.
    pub storm_duration: u32,
    /// Whether the metering protocol governs speeds.
    pub metering_enabled: bool,
    /// Parameters of the metering protocol.
    pub metering: MeteringConfig,
    /// Scheduled operating hours.
    pub hours: OperatingHours,
    /// Permitted speeds by distance to the runway.
    pub bands: SpeedBandTable,
    /// Seed of the per-instance random source.
    pub seed: u64,
}

impl SimulationConfig {
    /// Creates a configuration with the given traffic intensity and
    /// length, everything else at its defaults.
    pub fn new(arrival_rate: f64, days: u32) -> Self {
        Self {
            arrival_rate,
            days,
            wind_enabled: false,
            go_around_probability: 0.0,
            storm_enabled: false,
            storm_probability: 0.0,
            storm_duration: 30,
            metering_enabled: false,
            metering: MeteringConfig::default(),
            hours: OperatingHours::default(),
            bands: SpeedBandTable::default(),
            seed: 0,
        }
    }

    /// Rejects configurations the simulation must never run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.arrival_rate.is_finite() || self.arrival_rate < 0.0 {
            return Err(ConfigError::InvalidArrivalRate(self.arrival_rate));
        }
        if self.days == 0 {
            return Err(ConfigError::NoDays);
        }
        check_probability("go-around probability", self.go_around_probability)?;
        check_probability("storm probability", self.storm_probability)?;
        if self.storm_enabled && !(1..=MINUTES_PER_DAY as u32).contains(&self.storm_duration) {
            return Err(ConfigError::InvalidStormDuration(self.storm_duration));
        }
        if self.hours.open >= self.hours.close || self.hours.close > MINUTES_PER_DAY as u32 {
            return Err(ConfigError::InvalidOperatingHours {
                open: self.hours.open,
                close: self.hours.close,
            });
        }
        self.bands.validate()?;
        if self.metering_enabled {
            let m = &self.metering;
            check_metering_parameter("target spacing", m.target_spacing)?;
            check_metering_parameter("deadband", m.deadband)?;
            check_metering_parameter("speed step", m.speed_step)?;
            if !m.fix_distance.is_finite()
                || m.fix_distance <= 0.0
                || m.fix_distance >= ENTRY_DISTANCE_NM
            {
                return Err(ConfigError::MeterFixOutOfRange(m.fix_distance));
            }
        }
        Ok(())
    }
}

fn check_probability(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ProbabilityOutOfRange { name, value })
    }
}

fn check_metering_parameter(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidMeteringParameter { name, value })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SimulationConfig::new(0.1, 1).validate().is_ok());
    }

    #[test]
    fn negative_rate_is_rejected() {
        let config = SimulationConfig::new(-0.1, 1);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidArrivalRate(_))
        ));
    }

    #[test]
    fn zero_days_is_rejected() {
        let config = SimulationConfig::new(0.1, 0);
        assert!(matches!(config.validate(), Err(ConfigError::NoDays)));
    }

    #[test]
    fn out_of_range_probability_is_rejected() {
        let mut config = SimulationConfig::new(0.1, 1);
        config.go_around_probability = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ProbabilityOutOfRange { .. })
        ));

        let mut config = SimulationConfig::new(0.1, 1);
        config.storm_probability = -0.2;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ProbabilityOutOfRange { .. })
        ));
    }

    #[test]
    fn degenerate_storm_duration_is_rejected() {
        let mut config = SimulationConfig::new(0.1, 1);
        config.storm_enabled = true;
        config.storm_duration = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidStormDuration(0))
        ));
        config.storm_duration = 2000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn inverted_hours_are_rejected() {
        let mut config = SimulationConfig::new(0.1, 1);
        config.hours = OperatingHours { open: 1200, close: 600 };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidOperatingHours { .. })
        ));
    }

    #[test]
    fn meter_fix_beyond_entry_is_rejected() {
        let mut config = SimulationConfig::new(0.1, 1);
        config.metering_enabled = true;
        config.metering.fix_distance = 150.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MeterFixOutOfRange(_))
        ));
    }

    #[test]
    fn metering_parameters_are_ignored_while_disabled() {
        let mut config = SimulationConfig::new(0.1, 1);
        config.metering.speed_step = -10.0;
        assert!(config.validate().is_ok());
        config.metering_enabled = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn errors_describe_themselves() {
        let message = ConfigError::InvalidStormDuration(0).to_string();
        assert!(message.contains("storm duration"));
    }
}
