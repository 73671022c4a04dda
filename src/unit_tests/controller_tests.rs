use num_traits::FromPrimitive;

use crate::adaptive::controller::{AdaptiveController, SizingDecision};
use crate::cache::victim::VictimCache;
use crate::cache::BLOCK_SIZE;
use crate::monitor::phase::{PhaseDetector, WorkloadPhase};

fn strided_addr(i: u64) -> u64 {
    i * 2 * BLOCK_SIZE
}

/// Fills `valid` ways and then drives `hits` hits out of `total` lookups so
/// the cached hit rate lands exactly at `hits / total`.
fn cache_with_observed_state(size: usize, valid: u64, hits: u64, total: u64) -> VictimCache {
    let mut cache = VictimCache::new(size);
    for i in 0..valid {
        cache.insert_smart(strided_addr(i), i, None, 2);
    }
    for _ in 0..hits {
        assert!(cache.lookup(0));
    }
    for i in 0..total - hits {
        assert!(!cache.lookup(0x0010_0000 + strided_addr(i)));
    }
    cache.refresh_rates();
    cache
}

fn memory_bound_detector() -> PhaseDetector {
    let mut detector = PhaseDetector::new();
    detector.update(50_000, 10_000, 2_000);
    detector.check_phase_change();
    assert_eq!(detector.current_phase(), WorkloadPhase::MemoryIntensive);
    detector
}

fn compute_bound_detector() -> PhaseDetector {
    let mut detector = PhaseDetector::new();
    detector.update(50_000, 1_000, 50);
    detector.check_phase_change();
    assert_eq!(detector.current_phase(), WorkloadPhase::ComputeIntensive);
    detector
}

#[test]
fn one_increase_vote_is_enough_to_grow() {
    // Half-full cache at a 3% hit rate: the hit-rate and occupancy policies
    // are both neutral, only the phase-aware policy votes to grow.
    let mut cache = cache_with_observed_state(64, 32, 3, 100);
    assert!((cache.stats().hit_rate - 0.03).abs() < 1e-9);
    assert!((cache.occupancy() - 0.5).abs() < 1e-9);

    let detector = memory_bound_detector();
    let mut controller = AdaptiveController::new();
    controller.update(50_000, &mut cache, &detector);

    assert_eq!(cache.current_size(), 96);
    let record = &controller.history()[0];
    assert_eq!(record.decision, SizingDecision::Increase);
    assert_eq!(record.victim_size, 96);
    assert_eq!(record.phase, WorkloadPhase::MemoryIntensive);
    assert_eq!(record.timestamp, 50_000);
}

#[test]
fn shrinking_requires_two_votes() {
    // Occupancy ~0.2 and a compute-bound phase both vote to shrink; the 5%
    // hit rate keeps the hit-rate policy neutral.
    let mut cache = cache_with_observed_state(96, 19, 5, 100);
    assert!((cache.stats().hit_rate - 0.05).abs() < 1e-9);
    assert!(cache.occupancy() < 0.30);

    let detector = compute_bound_detector();
    let mut controller = AdaptiveController::new();
    controller.update(50_000, &mut cache, &detector);

    assert_eq!(cache.current_size(), 64);
    let record = &controller.history()[0];
    assert_eq!(record.decision, SizingDecision::Decrease);
    assert_eq!(record.victim_size, 64);
}

#[test]
fn one_shrink_vote_alone_changes_nothing() {
    // Compute-bound phase votes to shrink, but occupancy is healthy and the
    // hit-rate policy stays neutral: one vote is not enough.
    let mut cache = cache_with_observed_state(64, 32, 5, 100);
    let detector = compute_bound_detector();
    let mut controller = AdaptiveController::new();
    controller.update(50_000, &mut cache, &detector);

    assert_eq!(cache.current_size(), 64);
    assert!(controller.history().is_empty());
}

#[test]
fn growth_saturates_at_the_cap_without_a_record() {
    // Hot, full cache: two policies vote to grow, but the cache is already
    // at its physical capacity.
    let mut cache = cache_with_observed_state(256, 200, 9, 10);
    assert!(cache.occupancy() > 0.75);

    let detector = PhaseDetector::new();
    let mut controller = AdaptiveController::new();
    controller.update(50_000, &mut cache, &detector);

    assert_eq!(cache.current_size(), 256);
    assert!(controller.history().is_empty());
}

#[test]
fn adaptation_waits_for_the_interval() {
    let mut cache = VictimCache::new(128);
    let detector = PhaseDetector::new();
    let mut controller = AdaptiveController::new();

    for _ in 0..9 {
        controller.update(5_000, &mut cache, &detector);
    }
    assert_eq!(cache.current_size(), 128);
    assert!(controller.history().is_empty());

    // The tenth push crosses 50k instructions. An untouched cache reads as
    // idle, so both the hit-rate and occupancy policies vote to shrink.
    controller.update(5_000, &mut cache, &detector);
    assert_eq!(cache.current_size(), 96);
    assert_eq!(controller.history().len(), 1);
    assert_eq!(controller.history()[0].timestamp, 50_000);

    // Next interval shrinks to the floor; the one after that changes
    // nothing and writes no record.
    for _ in 0..20 {
        controller.update(5_000, &mut cache, &detector);
    }
    assert_eq!(cache.current_size(), 64);
    assert_eq!(controller.history().len(), 2);
}

#[test]
fn csv_export_uses_integer_encodings() {
    let mut cache = VictimCache::new(128);
    let detector = PhaseDetector::new();
    let mut controller = AdaptiveController::new();
    for _ in 0..10 {
        controller.update(5_000, &mut cache, &detector);
    }
    assert_eq!(controller.history().len(), 1);

    let path = std::env::temp_dir().join(format!("vcsim_adaptations_{}.csv", std::process::id()));
    controller.export_csv(&path).expect("export must succeed");
    let contents = std::fs::read_to_string(&path).expect("file must be readable");
    std::fs::remove_file(&path).ok();

    let mut lines = contents.lines();
    assert_eq!(
        lines.next(),
        Some("timestamp,victim_size,hit_rate,occupancy,phase,decision")
    );
    let fields: Vec<&str> = lines.next().expect("one record").split(',').collect();
    assert_eq!(fields[0], "50000");
    assert_eq!(fields[1], "96");

    let phase = WorkloadPhase::from_u8(fields[4].parse().unwrap()).unwrap();
    assert_eq!(phase, WorkloadPhase::Unknown);
    let decision = SizingDecision::from_u8(fields[5].parse().unwrap()).unwrap();
    assert_eq!(decision, SizingDecision::Decrease);
    assert!(lines.next().is_none());
}
