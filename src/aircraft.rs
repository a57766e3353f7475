use crate::bands::SpeedBandTable;
use crate::util::{knots_to_nm_per_min, minutes_to_fly};
use crate::{AircraftId, TICK_MINUTES};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Distance at which new arrivals join the inbound track, in nm.
pub(crate) const ENTRY_DISTANCE_NM: f64 = 100.0;

/// Fixed speed flown on the holding track while diverted, in knots.
pub(crate) const DIVERSION_SPEED_KT: f64 = 200.0;

/// Knots taken off the leader's speed by a deceleration instruction.
const DECELERATION_CUT_KT: f64 = 20.0;

/// Decelerate when the in-trail spacing drops strictly below this, in minutes.
const DECELERATE_BELOW_MIN: f64 = 4.0;

/// Resume a freely chosen speed when the spacing grows strictly above this, in minutes.
const RESUME_ABOVE_MIN: f64 = 5.0;

/// In-trail room a reinsertion gap must offer at the diverted speed, in minutes.
const REINSERTION_GAP_MIN: f64 = 10.0;

/// No reinsertion lands inside the stabilized final zone, in nm.
const STABILIZED_FINAL_NM: f64 = 5.0;

/// The flight status of an aircraft.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// Flying the inbound track at a freely chosen speed.
    Queued,
    /// Holding a controller-imposed speed behind a slower leader.
    Decelerating,
    /// Rejoined the queue from the holding track this minute.
    Reinserting,
    /// Flying away from the runway on the holding track.
    Diverted,
    /// Reached the runway threshold; disposition pending.
    LandingAttempt,
    /// On the ground.
    Landed,
}

/// Position and speed of a neighbouring aircraft, captured from the
/// tick's sort order before the owner advances.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Neighbor {
    pub distance: f64,
    pub speed: f64,
    pub diverted: bool,
}

/// A simulated aircraft.
#[derive(Clone, Debug)]
pub struct Aircraft {
    /// The aircraft's ID.
    pub(crate) id: AircraftId,
    /// The minute the aircraft appeared on the track.
    spawn_minute: u64,
    /// Distance to the runway in nautical miles.
    /// Exceeds the track entry only while diverted.
    distance: f64,
    /// Current speed in knots.
    speed: f64,
    /// The flight status.
    status: Status,
    /// Estimated minutes to the runway. -1 while diverted, where no
    /// estimate exists.
    eta: f64,
    /// Minutes the aircraft must still hold before it may reinsert.
    block_minutes: u32,
    /// The minute the aircraft landed, once it has.
    landing_minute: Option<u64>,
    /// Scheduled time of arrival at the meter fix, when metering assigned one.
    metering_target: Option<f64>,
    /// Whether the metering protocol governs this aircraft's band entries.
    metered: bool,
}

impl Aircraft {
    /// Creates a new aircraft at the given distance and speed.
    pub(crate) fn new(
        id: AircraftId,
        spawn_minute: u64,
        distance: f64,
        speed: f64,
        metered: bool,
        bands: &SpeedBandTable,
    ) -> Self {
        let mut aircraft = Self {
            id,
            spawn_minute,
            distance,
            speed,
            status: Status::Queued,
            eta: 0.0,
            block_minutes: 0,
            landing_minute: None,
            metering_target: None,
            metered,
        };
        aircraft.update_eta(bands);
        aircraft
    }

    /// Gets the aircraft's ID.
    pub fn id(&self) -> AircraftId {
        self.id
    }

    /// The minute the aircraft appeared on the track.
    pub fn spawn_minute(&self) -> u64 {
        self.spawn_minute
    }

    /// Distance to the runway in nautical miles.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Current speed in knots.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// The flight status.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Estimated minutes to the runway; -1 while diverted.
    pub fn eta(&self) -> f64 {
        self.eta
    }

    /// Minutes the aircraft must still hold before it may reinsert.
    pub fn block_minutes(&self) -> u32 {
        self.block_minutes
    }

    /// The minute the aircraft landed, once it has.
    pub fn landing_minute(&self) -> Option<u64> {
        self.landing_minute
    }

    /// Scheduled time of arrival at the meter fix, when metering assigned one.
    pub fn metering_target(&self) -> Option<f64> {
        self.metering_target
    }

    pub(crate) fn set_metering_target(&mut self, target: Option<f64>) {
        self.metering_target = target;
    }

    /// Advances the aircraft by one minute, given its immediate
    /// neighbours in the distance-ordered queue.
    pub(crate) fn advance(
        &mut self,
        leader: Option<Neighbor>,
        follower: Option<Neighbor>,
        bands: &SpeedBandTable,
        rng: &mut impl Rng,
    ) {
        if self.status == Status::Landed {
            return;
        }
        // Reaching the threshold this minute ends the approach; the
        // scheduler decides whether the landing sticks.
        if self.status != Status::Diverted
            && self.distance <= knots_to_nm_per_min(self.speed) * TICK_MINUTES
        {
            self.status = Status::LandingAttempt;
            self.eta = 0.0;
            return;
        }
        if self.status == Status::Diverted {
            self.fly_holding_track(leader, follower, bands, rng);
            return;
        }
        if self.status == Status::Reinserting {
            self.status = Status::Queued;
        }

        let band_before = bands.index_of(self.distance);
        self.distance -= knots_to_nm_per_min(self.speed) * TICK_MINUTES;
        if bands.index_of(self.distance) != band_before {
            // On band entry the baseline protocol draws a fresh speed;
            // metering keeps the current speed, clamped into the new bounds.
            if self.metered {
                self.speed = bands.speeds_at(self.distance).clamp(self.speed);
            } else {
                self.speed = bands.sample_speed(self.distance, rng);
            }
        }

        if let Some(leader) = leader {
            if !leader.diverted
                && leader.distance < self.distance
                && self.time_to_close(&leader) < DECELERATE_BELOW_MIN
            {
                self.decelerate_behind(&leader, bands);
                return;
            }
        }
        if self.status == Status::Decelerating && self.is_clear_of(leader) {
            self.speed = bands.sample_speed(self.distance, rng);
            self.status = Status::Queued;
        }
        self.update_eta(bands);
    }

    /// Minutes of in-trail spacing to the leader at the current speed.
    /// A stopped aircraft, or one whose leader is not strictly ahead,
    /// never closes the gap.
    fn time_to_close(&self, leader: &Neighbor) -> f64 {
        if leader.distance >= self.distance {
            return f64::INFINITY;
        }
        minutes_to_fly(self.speed, self.distance - leader.distance)
    }

    /// Adopts a speed 20 kt under the leader's, or diverts when that
    /// would undercut the band minimum.
    fn decelerate_behind(&mut self, leader: &Neighbor, bands: &SpeedBandTable) {
        let candidate = leader.speed - DECELERATION_CUT_KT;
        if candidate < bands.speeds_at(self.distance).min {
            self.divert();
        } else {
            self.speed = candidate;
            self.status = Status::Decelerating;
            self.update_eta(bands);
        }
    }

    /// Whether a decelerating aircraft may resume a freely chosen speed.
    fn is_clear_of(&self, leader: Option<Neighbor>) -> bool {
        match leader {
            Some(leader) => {
                leader.diverted
                    || leader.distance >= self.distance
                    || self.time_to_close(&leader) > RESUME_ABOVE_MIN
            }
            None => true,
        }
    }

    /// One minute on the holding track: fly away from the runway, then
    /// look for a queue gap to drop into unless still blocked.
    fn fly_holding_track(
        &mut self,
        leader: Option<Neighbor>,
        follower: Option<Neighbor>,
        bands: &SpeedBandTable,
        rng: &mut impl Rng,
    ) {
        self.distance += knots_to_nm_per_min(self.speed) * TICK_MINUTES;
        if self.block_minutes > 0 {
            self.block_minutes -= 1;
            return;
        }
        // Positions the aircraft would slot between if it rejoined now;
        // the runway and the track entry stand in for missing neighbours.
        let ahead = leader.map_or(0.0, |l| l.distance);
        let behind = follower.map_or(ENTRY_DISTANCE_NM, |f| f.distance);
        let gap = behind - ahead;
        if gap < knots_to_nm_per_min(self.speed) * REINSERTION_GAP_MIN {
            return;
        }
        let midpoint = ahead + gap / 2.0;
        if self.distance > ahead && self.distance <= midpoint && midpoint > STABILIZED_FINAL_NM {
            self.distance = midpoint;
            self.status = Status::Reinserting;
            self.speed = bands.sample_speed(self.distance, rng);
            self.update_eta(bands);
        }
    }

    /// Leaves the inbound track for the holding track.
    pub(crate) fn divert(&mut self) {
        self.status = Status::Diverted;
        self.speed = DIVERSION_SPEED_KT;
        self.eta = -1.0;
    }

    /// Diverts and holds the aircraft off the track for `minutes`.
    pub(crate) fn divert_with_block(&mut self, minutes: u32) {
        self.divert();
        self.block_minutes = minutes;
    }

    /// Confirms the landing.
    pub(crate) fn land(&mut self, minute: u64) {
        self.status = Status::Landed;
        self.landing_minute = Some(minute);
        self.eta = 0.0;
    }

    /// Applies a metering speed nudge, entering Decelerating when the
    /// speed actually drops.
    pub(crate) fn apply_metered_speed(&mut self, speed: f64) {
        if speed < self.speed {
            self.status = Status::Decelerating;
        }
        self.speed = speed;
    }

    fn update_eta(&mut self, bands: &SpeedBandTable) {
        self.eta = bands.estimate_minutes(self.distance, self.speed);
    }
}
