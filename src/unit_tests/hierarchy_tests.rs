use crate::sim::config::SimConfig;
use crate::sim::hierarchy::{CacheHierarchy, HierarchyMode, L1_ASSOCIATIVITY, L1_SIZE};
use crate::workload;

/// Byte stride between blocks that share an L1 set.
const SET_STRIDE: u64 = (L1_SIZE / L1_ASSOCIATIVITY) as u64 * 64;

#[test]
fn freshly_evicted_block_hits_in_the_victim_cache() {
    let config = SimConfig::default();
    let mut sim = CacheHierarchy::new(HierarchyMode::StaticVictim, &config);

    // Nine conflicting blocks overflow one 8-way L1 set; the ninth access
    // displaces block 0 into the victim cache.
    for k in 0..9 {
        sim.access_memory(k * SET_STRIDE);
    }
    assert_eq!(sim.l2().stats().accesses, 9);

    // Re-requesting the displaced block must stop at the victim cache.
    sim.access_memory(0);
    let victim = sim.victim().expect("static configuration has a victim cache");
    assert_eq!(victim.stats().victim_hits, 1);
    assert_eq!(sim.l2().stats().accesses, 9);
}

#[test]
fn baseline_routes_every_l1_miss_to_l2() {
    let config = SimConfig::default();
    let mut sim = CacheHierarchy::new(HierarchyMode::Baseline, &config);
    assert!(sim.victim().is_none());
    assert!(sim.controller().is_none());

    for k in 0..9 {
        sim.access_memory(k * SET_STRIDE);
    }
    sim.access_memory(0);
    assert_eq!(sim.l2().stats().accesses, 10);
    // L2 kept block 0 and satisfies the re-request.
    assert_eq!(sim.l2().stats().hits, 1);
}

#[test]
fn adaptive_configuration_shrinks_an_idle_victim_cache() {
    let config = SimConfig::default();
    let mut sim = CacheHierarchy::new(HierarchyMode::Adaptive, &config);
    assert_eq!(sim.victim().unwrap().current_size(), config.adaptive_start_size);

    // A small compute-bound working set leaves the victim cache idle.
    for &address in &workload::compute_intensive(100_000, 1) {
        sim.access_memory(address);
        sim.simulate_instruction();
    }

    assert_eq!(sim.total_instructions(), 100_000);
    let detector = sim.detector().expect("adaptive configuration has a detector");
    assert_eq!(detector.history().len(), 2);

    let controller = sim.controller().expect("adaptive configuration has a controller");
    assert_eq!(controller.history().len(), 1);
    assert_eq!(sim.victim().unwrap().current_size(), 64);
}

#[test]
fn streaming_traffic_is_kept_out_of_the_victim_cache() {
    let config = SimConfig::default();
    let mut sim = CacheHierarchy::new(HierarchyMode::StaticVictim, &config);

    for &address in &workload::streaming(5_000) {
        sim.access_memory(address);
        sim.simulate_instruction();
    }

    let stats = sim.victim().unwrap().stats();
    assert!(stats.bypassed_insertions > stats.victim_insertions);
    assert_eq!(stats.victim_hits, 0);
    assert!(sim.mpki() > 0.0);
}

#[test]
fn instruction_ticks_are_counted() {
    let config = SimConfig::default();
    let mut sim = CacheHierarchy::new(HierarchyMode::Baseline, &config);
    for _ in 0..1234 {
        sim.simulate_instruction();
    }
    assert_eq!(sim.total_instructions(), 1234);
    assert_eq!(sim.mpki(), 0.0);
}
