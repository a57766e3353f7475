use crate::aircraft::{Aircraft, Neighbor, Status, ENTRY_DISTANCE_NM};
use crate::arrivals::ArrivalGenerator;
use crate::config::{ConfigError, SimulationConfig};
use crate::metering::MeteringController;
use crate::stats::{LandingRecord, Statistics};
use crate::weather::{ClosureReason, WeatherScheduler};
use crate::{AircraftId, AircraftSet, MINUTES_PER_DAY};
use itertools::Itertools;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use slotmap::{Key, SlotMap};
use smallvec::SmallVec;

/// A single-runway final approach simulation.
///
/// Owns the active aircraft, drives the per-minute pipeline and keeps
/// the books on landings and diversions.
pub struct Simulation {
    /// The immutable configuration of this instance.
    config: SimulationConfig,
    /// The aircraft being simulated.
    aircraft: AircraftSet,
    /// Active aircraft in ascending distance order, rebuilt every tick.
    /// This ordering defines each aircraft's leader and follower for the
    /// whole pass and is never recomputed mid-pass.
    order: Vec<AircraftId>,
    /// Aircraft that landed, in landing order.
    landed: Vec<Aircraft>,
    /// Diverted aircraft that left the track for the alternate airport.
    alternates: Vec<Aircraft>,
    /// Cumulative counters.
    stats: Statistics,
    /// Storm scheduling and closure resolution.
    weather: WeatherScheduler,
    /// Poisson arrival counts.
    arrivals: ArrivalGenerator,
    /// The metering controller, when the protocol is enabled.
    metering: Option<MeteringController>,
    /// Minutes since the start of the run.
    clock: u64,
    /// Closure reason of the previous tick, for storm-onset detection.
    prev_closure: Option<ClosureReason>,
    /// The per-instance random source.
    rng: StdRng,
}

/// A read-only view of one active aircraft for display layers.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct AircraftState {
    /// The aircraft's ID as stable 64-bit data.
    pub id: u64,
    /// Distance to the runway in nautical miles.
    pub distance: f64,
    /// Current speed in knots.
    pub speed: f64,
    /// The flight status.
    pub status: Status,
}

/// A read-only per-frame view of the simulation for display layers.
#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    /// Minutes since the start of the run.
    pub clock: u64,
    /// The day the clock is in.
    pub day: u64,
    /// Why the runway is closed, if it is.
    pub closure: Option<ClosureReason>,
    /// Cumulative counters.
    pub statistics: Statistics,
    /// Active aircraft in ascending distance order.
    pub aircraft: Vec<AircraftState>,
}

impl Simulation {
    /// Creates a new simulation instance, rejecting invalid configurations.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut weather = WeatherScheduler::new(
            config.hours,
            config.storm_enabled,
            config.storm_probability,
            config.storm_duration,
        );
        weather.reschedule(&mut rng);
        let arrivals = ArrivalGenerator::new(config.arrival_rate);
        let metering = config
            .metering_enabled
            .then(|| MeteringController::new(config.metering));
        Ok(Self {
            aircraft: SlotMap::with_key(),
            order: vec![],
            landed: vec![],
            alternates: vec![],
            stats: Statistics::default(),
            weather,
            arrivals,
            metering,
            clock: 0,
            prev_closure: None,
            rng,
            config,
        })
    }

    /// Runs the simulation to completion.
    pub fn run(&mut self) {
        let end = self.config.days as u64 * MINUTES_PER_DAY;
        while self.clock < end {
            self.tick();
        }
    }

    /// Advances the simulation by one minute.
    pub fn tick(&mut self) {
        let minute = self.minute_of_day();
        let closure = self.weather.closure_reason(minute);
        if closure == Some(ClosureReason::Storm) && self.prev_closure != Some(ClosureReason::Storm)
        {
            self.divert_all_for_storm(minute);
        }
        self.prev_closure = closure;

        if closure.is_none() {
            self.generate_arrivals();
        }
        self.sort_by_distance();
        self.advance_aircraft(closure, minute);
        self.clock += 1;
        self.handle_day_rollover();
    }

    /// Minutes since the start of the run.
    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// The day the clock is in.
    pub fn day(&self) -> u64 {
        self.clock / MINUTES_PER_DAY
    }

    /// The minute of the current day.
    pub fn minute_of_day(&self) -> u32 {
        (self.clock % MINUTES_PER_DAY) as u32
    }

    /// The cumulative counters. Unchanged between ticks.
    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    /// The storm scheduling and closure state.
    pub fn weather(&self) -> &WeatherScheduler {
        &self.weather
    }

    /// Returns an iterator over all the active aircraft.
    pub fn iter_aircraft(&self) -> impl Iterator<Item = &Aircraft> {
        self.aircraft.values()
    }

    /// Gets a reference to the active aircraft with the given ID.
    pub fn get_aircraft(&self, id: AircraftId) -> Option<&Aircraft> {
        self.aircraft.get(id)
    }

    /// One record per landed aircraft, in landing order.
    pub fn landing_records(&self) -> Vec<LandingRecord> {
        self.landed
            .iter()
            .filter_map(|aircraft| {
                let landing_minute = aircraft.landing_minute()?;
                Some(LandingRecord {
                    id: aircraft.id.data().as_ffi(),
                    spawn_minute: aircraft.spawn_minute(),
                    landing_minute,
                    flight_minutes: landing_minute - aircraft.spawn_minute(),
                })
            })
            .collect()
    }

    /// Captures a read-only view of the current frame for display layers.
    pub fn snapshot(&self) -> Snapshot {
        let mut aircraft: Vec<AircraftState> = self
            .aircraft
            .values()
            .map(|a| AircraftState {
                id: a.id.data().as_ffi(),
                distance: a.distance(),
                speed: a.speed(),
                status: a.status(),
            })
            .collect();
        aircraft.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        Snapshot {
            clock: self.clock,
            day: self.day(),
            closure: self.weather.closure_reason(self.minute_of_day()),
            statistics: self.stats.clone(),
            aircraft,
        }
    }

    /// Spawns this minute's arrivals at the track entry.
    fn generate_arrivals(&mut self) {
        let count = self.arrivals.sample(&mut self.rng);
        for _ in 0..count {
            let bands = &self.config.bands;
            let speed = bands.sample_speed(ENTRY_DISTANCE_NM, &mut self.rng);
            let spawn = self.clock;
            let metered = self.config.metering_enabled;
            let id = self.aircraft.insert_with_key(|id| {
                Aircraft::new(id, spawn, ENTRY_DISTANCE_NM, speed, metered, bands)
            });
            if let Some(metering) = self.metering.as_mut() {
                metering.assign(&mut self.aircraft[id], spawn, bands);
            }
            self.stats.total_generated += 1;
        }
    }

    /// Sorts the active aircraft by ascending distance to the runway.
    fn sort_by_distance(&mut self) {
        self.order.clear();
        self.order.extend(self.aircraft.keys());
        let aircraft = &self.aircraft;
        self.order
            .sort_by(|a, b| aircraft[*a].distance().total_cmp(&aircraft[*b].distance()));
        debug_assert!(self
            .order
            .iter()
            .tuple_windows()
            .all(|(a, b)| aircraft[*a].distance() <= aircraft[*b].distance()));
    }

    /// Runs the per-minute pipeline over every aircraft, nearest first.
    /// Neighbour states are captured as updated by earlier aircraft in
    /// the same pass. Terminal transitions are collected and applied
    /// after the pass.
    fn advance_aircraft(&mut self, closure: Option<ClosureReason>, minute: u32) {
        let mut landed: SmallVec<[AircraftId; 4]> = SmallVec::new();
        let mut escaped: SmallVec<[AircraftId; 4]> = SmallVec::new();

        for i in 0..self.order.len() {
            let id = self.order[i];
            let leader = (i > 0).then(|| self.neighbor(self.order[i - 1]));
            let follower = self.order.get(i + 1).map(|next| self.neighbor(*next));

            if let Some(metering) = &self.metering {
                metering.control(&mut self.aircraft[id], self.clock, &self.config.bands);
            }

            let before = self.aircraft[id].status();
            self.aircraft[id].advance(leader, follower, &self.config.bands, &mut self.rng);

            match self.aircraft[id].status() {
                Status::LandingAttempt => {
                    self.resolve_landing(id, closure, minute);
                    if self.aircraft[id].status() == Status::Landed {
                        landed.push(id);
                    }
                }
                Status::Diverted => {
                    if before != Status::Diverted {
                        // The advance itself only diverts when a deceleration
                        // target undercuts the band minimum.
                        self.stats.diverted_congestion += 1;
                        debug!("aircraft {:?} diverted by congestion", id.data());
                    }
                    if self.aircraft[id].distance() > ENTRY_DISTANCE_NM {
                        escaped.push(id);
                    }
                }
                Status::Queued | Status::Decelerating => {
                    if before == Status::Reinserting {
                        self.stats.successful_reinsertions += 1;
                    }
                }
                _ => {}
            }
        }

        for id in landed {
            if let Some(aircraft) = self.aircraft.remove(id) {
                self.landed.push(aircraft);
            }
        }
        for id in escaped {
            if let Some(aircraft) = self.aircraft.remove(id) {
                debug!("aircraft {:?} escaped to the alternate", id.data());
                self.stats.diverted_to_alternate += 1;
                self.alternates.push(aircraft);
            }
        }
    }

    /// Decides the disposition of an aircraft that reached the threshold:
    /// go around on a closed runway or on wind, land otherwise.
    fn resolve_landing(&mut self, id: AircraftId, closure: Option<ClosureReason>, minute: u32) {
        match closure {
            Some(reason) => {
                let block = self.weather.minutes_until_reopen(minute);
                self.aircraft[id].divert_with_block(block);
                match reason {
                    ClosureReason::Storm => self.stats.diverted_storm += 1,
                    ClosureReason::ScheduledHours => self.stats.diverted_closure += 1,
                }
                debug!(
                    "aircraft {:?} went around: runway closed ({:?})",
                    id.data(),
                    reason
                );
            }
            None => {
                if self.config.wind_enabled && self.rng.gen_bool(self.config.go_around_probability)
                {
                    self.aircraft[id].divert();
                    self.stats.diverted_wind += 1;
                    debug!("aircraft {:?} went around on wind", id.data());
                } else {
                    let clock = self.clock;
                    let aircraft = &mut self.aircraft[id];
                    aircraft.land(clock);
                    let flight_minutes = (clock - aircraft.spawn_minute()) as f64;
                    self.stats.record_landing(flight_minutes);
                }
            }
        }
    }

    /// A storm just hit: everything still inbound goes around at once,
    /// blocked off the track until the window passes.
    fn divert_all_for_storm(&mut self, minute: u32) {
        let block = self.weather.minutes_until_reopen(minute);
        let mut count = 0;
        for (_, aircraft) in &mut self.aircraft {
            if matches!(
                aircraft.status(),
                Status::Queued | Status::Decelerating | Status::Reinserting
            ) {
                aircraft.divert_with_block(block);
                count += 1;
            }
        }
        self.stats.diverted_storm += count;
        if count > 0 {
            debug!("storm onset diverted {} aircraft", count);
        }
    }

    /// Handles day boundaries crossed by the last clock advance.
    fn handle_day_rollover(&mut self) {
        let before = (self.clock - 1) / MINUTES_PER_DAY;
        let after = self.clock / MINUTES_PER_DAY;
        for _ in before..after {
            self.stats.days_completed += 1;
            self.weather.reschedule(&mut self.rng);
            if let Some(metering) = self.metering.as_mut() {
                metering.reset_baseline();
            }
        }
    }

    fn neighbor(&self, id: AircraftId) -> Neighbor {
        let aircraft = &self.aircraft[id];
        Neighbor {
            distance: aircraft.distance(),
            speed: aircraft.speed(),
            diverted: aircraft.status() == Status::Diverted,
        }
    }
}
