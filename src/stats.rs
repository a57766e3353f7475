use serde::{Deserialize, Serialize};

/// Cumulative counters of one simulation instance.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// Aircraft generated over the whole run.
    pub total_generated: u64,
    /// Aircraft that landed.
    pub landed: u64,
    /// Diversions forced by a deceleration target below the band minimum.
    pub diverted_congestion: u64,
    /// Go-arounds blown by wind on an otherwise open runway.
    pub diverted_wind: u64,
    /// Diversions caused by a storm closure.
    pub diverted_storm: u64,
    /// Diversions caused by a scheduled-hours closure.
    pub diverted_closure: u64,
    /// Diverted aircraft that left the track for the alternate airport.
    pub diverted_to_alternate: u64,
    /// Diverted aircraft that successfully rejoined the queue.
    pub successful_reinsertions: u64,
    /// Fully simulated days.
    pub days_completed: u64,
    /// Running mean of minutes from spawn to landing.
    pub mean_flight_minutes: f64,
}

impl Statistics {
    /// Folds one landed flight into the counters and the running mean.
    pub(crate) fn record_landing(&mut self, flight_minutes: f64) {
        self.landed += 1;
        self.mean_flight_minutes +=
            (flight_minutes - self.mean_flight_minutes) / self.landed as f64;
    }
}

/// Per-flight record of a completed landing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandingRecord {
    /// The aircraft's ID as stable 64-bit data.
    pub id: u64,
    /// The minute the flight appeared on the track.
    pub spawn_minute: u64,
    /// The minute the flight landed.
    pub landing_minute: u64,
    /// Minutes spent between the two.
    pub flight_minutes: u64,
}
