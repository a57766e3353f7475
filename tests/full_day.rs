//! Tests that drive whole simulated days through the public interface.

use approach_sim::{Simulation, SimulationConfig, Status};

/// A quiet day: no arrivals, no landings, no diversions, no panics.
#[test]
fn zero_intensity_day_is_uneventful() {
    let mut sim = Simulation::new(SimulationConfig::new(0.0, 1)).expect("valid config");
    sim.run();
    let stats = sim.statistics();
    assert_eq!(stats.total_generated, 0);
    assert_eq!(stats.landed, 0);
    assert_eq!(stats.diverted_congestion, 0);
    assert_eq!(stats.diverted_to_alternate, 0);
    assert_eq!(stats.days_completed, 1);
    assert_eq!(sim.iter_aircraft().count(), 0);
    assert_eq!(sim.clock(), 1440);
}

/// A busy day lands traffic, and every generated aircraft is accounted
/// for: still active, landed, or escaped to the alternate.
#[test]
fn busy_day_conserves_aircraft() {
    let mut sim = Simulation::new(SimulationConfig::new(0.2, 2)).expect("valid config");
    sim.run();
    let stats = sim.statistics();
    assert!(stats.total_generated > 0);
    assert!(stats.landed > 0);
    let active = sim.iter_aircraft().count() as u64;
    assert_eq!(
        stats.total_generated,
        stats.landed + stats.diverted_to_alternate + active
    );
    assert_eq!(stats.landed, sim.landing_records().len() as u64);
}

/// The statistics accessor is pure: reading twice without a tick in
/// between yields identical results.
#[test]
fn statistics_are_stable_between_ticks() {
    let mut sim = Simulation::new(SimulationConfig::new(0.3, 1)).expect("valid config");
    for _ in 0..800 {
        sim.tick();
    }
    assert_eq!(sim.statistics(), &sim.statistics().clone());
    assert_eq!(sim.landing_records(), sim.landing_records());
}

/// Identical configurations and seeds replay identical runs.
#[test]
fn equal_seeds_reproduce_the_run() {
    let config = SimulationConfig::new(0.25, 2);
    let mut a = Simulation::new(config.clone()).expect("valid config");
    let mut b = Simulation::new(config).expect("valid config");
    a.run();
    b.run();
    assert_eq!(a.statistics(), b.statistics());
    assert_eq!(a.landing_records(), b.landing_records());
}

/// Different seeds diverge.
#[test]
fn different_seeds_diverge() {
    let mut config = SimulationConfig::new(0.25, 2);
    let mut a = Simulation::new(config.clone()).expect("valid config");
    config.seed = 1;
    let mut b = Simulation::new(config).expect("valid config");
    a.run();
    b.run();
    assert_ne!(a.landing_records(), b.landing_records());
}

/// Snapshots list aircraft by ascending distance and serialize to JSON.
#[test]
fn snapshots_are_ordered_and_serializable() {
    let mut sim = Simulation::new(SimulationConfig::new(0.5, 1)).expect("valid config");
    for _ in 0..500 {
        sim.tick();
    }
    let snapshot = sim.snapshot();
    assert_eq!(snapshot.clock, 500);
    assert!(snapshot
        .aircraft
        .windows(2)
        .all(|pair| pair[0].distance <= pair[1].distance));
    let json = serde_json::to_string(&snapshot).expect("snapshot serializes");
    assert!(json.contains("\"statistics\""));
}

/// Aircraft in the queue always fly a speed their band permits.
#[test]
fn queued_speeds_stay_inside_their_bands() {
    let config = SimulationConfig::new(0.4, 1);
    let bands = config.bands.clone();
    let mut sim = Simulation::new(config).expect("valid config");
    for _ in 0..1440 {
        sim.tick();
        for aircraft in sim.iter_aircraft() {
            if matches!(aircraft.status(), Status::Queued | Status::Reinserting) {
                let speeds = bands.speeds_at(aircraft.distance());
                assert!(
                    speeds.contains(aircraft.speed()),
                    "{} kt outside {:?} at {} nm",
                    aircraft.speed(),
                    speeds,
                    aircraft.distance()
                );
            }
        }
    }
}

/// A day with a guaranteed storm diverts inbound traffic and still
/// accounts for every aircraft.
#[test]
fn storm_days_divert_traffic() {
    let mut config = SimulationConfig::new(0.3, 3);
    config.storm_enabled = true;
    config.storm_probability = 1.0;
    config.storm_duration = 360;
    let mut sim = Simulation::new(config).expect("valid config");
    sim.run();
    let stats = sim.statistics();
    // A six-hour storm cannot hide inside the overnight closure, so
    // every day's storm reaches the open hours and diverts traffic.
    assert!(stats.diverted_storm > 0);
    let active = sim.iter_aircraft().count() as u64;
    assert_eq!(
        stats.total_generated,
        stats.landed + stats.diverted_to_alternate + active
    );
}

/// Windy days trade landings for go-arounds.
#[test]
fn windy_days_cause_go_arounds() {
    let mut config = SimulationConfig::new(0.2, 2);
    config.wind_enabled = true;
    config.go_around_probability = 0.3;
    let mut sim = Simulation::new(config).expect("valid config");
    sim.run();
    assert!(sim.statistics().diverted_wind > 0);
}

/// With metering enabled, every arrival gets a scheduled time at the
/// fix and speeds still respect the bands.
#[test]
fn metering_assigns_targets_and_respects_bands() {
    let mut config = SimulationConfig::new(0.3, 1);
    config.metering_enabled = true;
    let bands = config.bands.clone();
    let mut sim = Simulation::new(config).expect("valid config");
    for _ in 0..720 {
        sim.tick();
    }
    assert!(sim.statistics().total_generated > 0);
    for aircraft in sim.iter_aircraft() {
        // Every arrival spawns beyond the fix, so every one has a target.
        assert!(aircraft.metering_target().is_some());
        if aircraft.status() == Status::Diverted {
            continue;
        }
        let speeds = bands.speeds_at(aircraft.distance());
        assert!(aircraft.speed() <= speeds.max);
        assert!(aircraft.speed() >= speeds.min);
    }
}

/// Construction fails loudly on bad parameters; nothing ever runs.
#[test]
fn invalid_configurations_are_rejected_up_front() {
    assert!(Simulation::new(SimulationConfig::new(f64::NAN, 1)).is_err());
    assert!(Simulation::new(SimulationConfig::new(0.1, 0)).is_err());
    let mut config = SimulationConfig::new(0.1, 1);
    config.storm_enabled = true;
    config.storm_probability = 2.0;
    assert!(Simulation::new(config).is_err());
}
