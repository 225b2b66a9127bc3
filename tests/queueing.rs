//! Integration tests for the finite-buffer queue model.

use netdes::models::queueing::{BufferState, PacketProcess};
use netdes::{blocking_probability, Environment, QueueConfig, QueueSimulation};

#[test]
fn test_every_packet_is_classified_once() {
    for buffer in [0, 1, 3, 10] {
        let config = QueueConfig::new(0.9, buffer).with_packet_count(2_000);
        let report = QueueSimulation::new(config).unwrap().run();
        assert_eq!(report.dropped + report.served, 2_000, "B = {buffer}");
        assert!(report.peak_occupancy <= buffer);
    }
}

#[test]
fn test_zero_buffer_drops_everything() {
    let report = QueueSimulation::new(QueueConfig::new(0.5, 0).with_packet_count(100))
        .unwrap()
        .run();
    assert_eq!(report.dropped, 100);
    assert_eq!(report.served, 0);
}

#[test]
fn test_occupancy_stays_within_buffer() {
    let config = QueueConfig::new(0.99, 4).with_packet_count(3_000);
    let mut env = QueueSimulation::new(config).unwrap().build();

    while env.step() {
        assert!(env.state().occupancy() <= 4);
    }
    assert_eq!(env.state().occupancy(), 0);
    assert_eq!(env.state().peak_occupancy(), 4);
}

#[test]
fn test_same_seed_same_report() {
    let config = QueueConfig::new(0.8, 10).with_packet_count(5_000).with_seed(42);
    let a = QueueSimulation::new(config.clone()).unwrap().run();
    let b = QueueSimulation::new(config).unwrap().run();
    assert_eq!(a.dropped, b.dropped);
    assert_eq!(a.end_time, b.end_time);

    let c = QueueSimulation::new(QueueConfig::new(0.8, 10).with_packet_count(5_000).with_seed(43))
        .unwrap()
        .run();
    assert_ne!(a.end_time, c.end_time);
}

#[test]
fn test_light_load_matches_formula() {
    let report = QueueSimulation::new(QueueConfig::new(0.5, 10)).unwrap().run();
    assert_eq!(report.packet_count, 50_000);
    let formula = blocking_probability(0.5, 1.0, 10);
    assert!((report.formula_drop_ratio - formula).abs() < 1e-15);
    assert!(
        (report.drop_ratio() - formula).abs() < 0.001,
        "simulated {} vs formula {formula}",
        report.drop_ratio()
    );
}

#[test]
fn test_heavy_load_converges() {
    // B counts the packet in service, so the run behaves like B - 1 waiting slots
    let config = QueueConfig::new(0.8, 5).with_packet_count(200_000);
    let report = QueueSimulation::new(config).unwrap().run();
    let expected = blocking_probability(0.8, 1.0, 4);
    assert!(
        (report.drop_ratio() - expected).abs() < 0.01,
        "simulated {} vs {expected}",
        report.drop_ratio()
    );
}

#[test]
fn test_hand_built_scenario() {
    // Packets at 1, 2, 3 each needing 2.5 units; buffer of 2
    let mut env = Environment::new(BufferState::new(2));
    let server = env.add_resource(1);
    for (i, t) in [1.0, 2.0, 3.0].into_iter().enumerate() {
        env.spawn(PacketProcess::new(i as u64, t, 2.5, server));
    }
    env.run();

    // Third packet finds the first in service and the second waiting
    assert_eq!(env.state().dropped(), 1);
    assert_eq!(env.state().served(), 2);
    assert_eq!(env.now(), 6.0);
}
