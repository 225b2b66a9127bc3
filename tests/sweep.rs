//! Integration tests for parametric sweeps.

use netdes::sweep::{self, QUEUE_ARRIVAL_RATES};
use netdes::{BackoffAlgorithm, MacConfig, MacSimulation, QueueConfig, QueueSimulation};

#[test]
fn test_sweep_matches_individual_runs() {
    let configs: Vec<_> = QUEUE_ARRIVAL_RATES
        .iter()
        .map(|&l| QueueConfig::new(l, 10).with_packet_count(2_000))
        .collect();
    let reports = sweep::sweep_queue(&configs).unwrap();

    assert_eq!(reports.len(), configs.len());
    for (config, report) in configs.iter().zip(&reports) {
        let single = QueueSimulation::new(config.clone()).unwrap().run();
        assert_eq!(report.arrival_rate, config.arrival_rate);
        assert_eq!(report.dropped, single.dropped);
        assert_eq!(report.end_time, single.end_time);
    }
}

#[test]
fn test_mac_sweep_matches_individual_runs() {
    let configs: Vec<_> = [0.02, 0.06]
        .iter()
        .flat_map(|&l| {
            [BackoffAlgorithm::Exponential, BackoffAlgorithm::Linear]
                .map(|a| MacConfig::new(l, a).with_node_count(4).with_packets_per_node(50))
        })
        .collect();
    let reports = sweep::sweep_mac(&configs).unwrap();

    for (config, report) in configs.iter().zip(&reports) {
        let single = MacSimulation::new(config.clone()).unwrap().run().unwrap();
        assert_eq!(report.algorithm, config.algorithm);
        assert_eq!(report.slots, single.slots);
    }
}

#[test]
fn test_drop_ratio_grows_with_load() {
    let configs: Vec<_> = [0.4, 0.8, 0.99]
        .iter()
        .map(|&l| QueueConfig::new(l, 10).with_packet_count(20_000))
        .collect();
    let reports = sweep::sweep_queue(&configs).unwrap();
    assert!(reports[0].drop_ratio() < reports[1].drop_ratio());
    assert!(reports[1].drop_ratio() < reports[2].drop_ratio());
}

#[test]
fn test_queue_table_export() {
    let configs: Vec<_> = sweep::queue_grid()
        .into_iter()
        .map(|c| c.with_packet_count(1_000))
        .collect();
    let table = sweep::queue_table(&configs).unwrap();

    assert_eq!(table.len(), 12);
    assert_eq!(table.rows[0][0], "0.20");
    assert_eq!(table.rows[0][2], "10");
    assert_eq!(table.rows[11][0], "0.99");
    assert_eq!(table.rows[11][2], "50");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("queue.csv");
    table.to_csv_file(&path).unwrap();
    let csv = std::fs::read_to_string(&path).unwrap();
    assert!(csv.starts_with("lambda,mu,B,dropped,packets,sim_pct,formula_pct\n"));
    assert_eq!(csv.lines().count(), 13);
}
