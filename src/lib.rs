pub use aircraft::{Aircraft, Status};
pub use bands::{SpeedBand, SpeedBandTable};
pub use batch::{run_batch, BatchSummary, SampleStat};
pub use config::{ConfigError, MeteringConfig, OperatingHours, SimulationConfig};
pub use simulation::{AircraftState, Simulation, Snapshot};
pub use stats::{LandingRecord, Statistics};
pub use util::{format_hhmm, Interval};
pub use weather::{ClosureReason, WeatherScheduler};
use slotmap::{new_key_type, SlotMap};
pub use slotmap::{Key, KeyData};

mod aircraft;
mod arrivals;
mod bands;
mod batch;
mod config;
mod metering;
mod simulation;
mod stats;
mod util;
mod weather;

new_key_type! {
    /// Unique ID of an [Aircraft].
    pub struct AircraftId;
}

type AircraftSet = SlotMap<AircraftId, Aircraft>;

/// The simulation time step in minutes.
pub(crate) const TICK_MINUTES: f64 = 1.0;

/// Minutes in one simulated day.
pub(crate) const MINUTES_PER_DAY: u64 = 1440;
