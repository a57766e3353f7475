use crate::aircraft::{Aircraft, Status};
use crate::bands::SpeedBandTable;
use crate::config::MeteringConfig;
use crate::util::minutes_to_fly;

/// Assigns each new arrival a scheduled time of arrival at the meter fix
/// and nudges cruise speeds toward it, one fixed step at a time.
#[derive(Clone, Debug)]
pub struct MeteringController {
    config: MeteringConfig,
    /// The most recently assigned scheduled time; spacing baseline for the next.
    last_sta: Option<f64>,
}

impl MeteringController {
    pub(crate) fn new(config: MeteringConfig) -> Self {
        Self { config, last_sta: None }
    }

    /// Assigns a scheduled time of arrival to a freshly spawned aircraft:
    /// the earliest physically possible fix crossing, pushed back to keep
    /// the configured spacing behind the previous assignment.
    pub(crate) fn assign(&mut self, aircraft: &mut Aircraft, now: u64, bands: &SpeedBandTable) {
        if aircraft.distance() <= self.config.fix_distance {
            return;
        }
        let fastest = bands.min_transit_minutes(self.config.fix_distance, aircraft.distance());
        let mut sta = now as f64 + fastest;
        if let Some(last) = self.last_sta {
            sta = f64::max(sta, last + self.config.target_spacing);
        }
        self.last_sta = Some(sta);
        aircraft.set_metering_target(Some(sta));
    }

    /// Nudges the aircraft's speed toward its scheduled fix crossing:
    /// slower when it would cross early, faster when late, never outside
    /// the current band and never while the error sits in the deadband.
    pub(crate) fn control(&self, aircraft: &mut Aircraft, now: u64, bands: &SpeedBandTable) {
        if matches!(aircraft.status(), Status::Diverted | Status::Landed) {
            return;
        }
        if aircraft.distance() <= self.config.fix_distance {
            return;
        }
        let sta = match aircraft.metering_target() {
            Some(sta) => sta,
            None => return,
        };
        let to_fix = aircraft.distance() - self.config.fix_distance;
        let eta = now as f64 + minutes_to_fly(aircraft.speed(), to_fix);
        let error = sta - eta;
        if error.abs() <= self.config.deadband {
            return;
        }
        let step = if error > 0.0 {
            // Crossing early: bleed speed off.
            -self.config.speed_step
        } else {
            // Running late: add speed.
            self.config.speed_step
        };
        let speeds = bands.speeds_at(aircraft.distance());
        aircraft.apply_metered_speed(speeds.clamp(aircraft.speed() + step));
    }

    /// Forgets the spacing baseline at the start of a new day.
    pub(crate) fn reset_baseline(&mut self) {
        self.last_sta = None;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::aircraft::ENTRY_DISTANCE_NM;
    use crate::AircraftId;
    use assert_approx_eq::assert_approx_eq;
    use slotmap::Key;

    fn controller() -> MeteringController {
        MeteringController::new(MeteringConfig::default())
    }

    fn spawn(distance: f64, speed: f64) -> Aircraft {
        Aircraft::new(
            AircraftId::null(),
            0,
            distance,
            speed,
            true,
            &SpeedBandTable::default(),
        )
    }

    #[test]
    fn first_assignment_is_the_fastest_transit() {
        let bands = SpeedBandTable::default();
        let mut metering = controller();
        let mut a = spawn(ENTRY_DISTANCE_NM, 400.0);
        metering.assign(&mut a, 0, &bands);
        // 15..50 at 250 kt plus 50..100 at 300 kt.
        let fastest = 35.0 / 250.0 * 60.0 + 50.0 / 300.0 * 60.0;
        assert_approx_eq!(a.metering_target().expect("assigned"), fastest);
    }

    #[test]
    fn later_assignments_keep_the_spacing() {
        let bands = SpeedBandTable::default();
        let mut metering = controller();
        let mut first = spawn(ENTRY_DISTANCE_NM, 400.0);
        let mut second = spawn(ENTRY_DISTANCE_NM, 400.0);
        metering.assign(&mut first, 0, &bands);
        metering.assign(&mut second, 0, &bands);
        let gap = second.metering_target().expect("assigned")
            - first.metering_target().expect("assigned");
        assert_approx_eq!(gap, MeteringConfig::default().target_spacing);
    }

    #[test]
    fn baseline_reset_forgets_the_spacing() {
        let bands = SpeedBandTable::default();
        let mut metering = controller();
        let mut first = spawn(ENTRY_DISTANCE_NM, 400.0);
        metering.assign(&mut first, 0, &bands);
        metering.reset_baseline();
        let mut second = spawn(ENTRY_DISTANCE_NM, 400.0);
        metering.assign(&mut second, 0, &bands);
        assert_approx_eq!(
            second.metering_target().expect("assigned"),
            first.metering_target().expect("assigned")
        );
    }

    #[test]
    fn early_aircraft_are_slowed() {
        let bands = SpeedBandTable::default();
        let metering = controller();
        let mut a = spawn(ENTRY_DISTANCE_NM, 400.0);
        // 85 nm to the fix at 400 kt is 12.75 min; an STA of 30 is far later.
        a.set_metering_target(Some(30.0));
        metering.control(&mut a, 0, &bands);
        assert_eq!(a.speed(), 390.0);
        assert_eq!(a.status(), Status::Decelerating);
    }

    #[test]
    fn late_aircraft_are_hurried_within_the_band() {
        let bands = SpeedBandTable::default();
        let metering = controller();
        let mut a = spawn(ENTRY_DISTANCE_NM, 300.0);
        // 85 nm at 300 kt is 17 min; an STA of 5 is unreachable, so push
        // to the band ceiling step by step.
        a.set_metering_target(Some(5.0));
        metering.control(&mut a, 0, &bands);
        assert_eq!(a.speed(), 310.0);
        assert_eq!(a.status(), Status::Queued);
        for _ in 0..30 {
            metering.control(&mut a, 0, &bands);
        }
        assert_eq!(a.speed(), 500.0);
    }

    #[test]
    fn errors_inside_the_deadband_are_left_alone() {
        let bands = SpeedBandTable::default();
        let metering = controller();
        let mut a = spawn(ENTRY_DISTANCE_NM, 400.0);
        let eta = 85.0 / 400.0 * 60.0;
        a.set_metering_target(Some(eta + 0.5));
        metering.control(&mut a, 0, &bands);
        assert_eq!(a.speed(), 400.0);
        assert_eq!(a.status(), Status::Queued);
    }

    #[test]
    fn aircraft_past_the_fix_are_not_touched() {
        let bands = SpeedBandTable::default();
        let metering = controller();
        let mut a = spawn(10.0, 180.0);
        a.set_metering_target(Some(0.0));
        metering.control(&mut a, 100, &bands);
        assert_eq!(a.speed(), 180.0);
    }
}
