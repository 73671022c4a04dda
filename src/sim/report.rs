use std::fs;
use std::path::Path;

use num_traits::FromPrimitive;
use serde::Serialize;

use crate::adaptive::controller::AdaptationRecord;
use crate::cache::set_assoc::SetAssociativeCache;
use crate::monitor::phase::WorkloadPhase;
use crate::sim::hierarchy::CacheHierarchy;

/// Headline numbers for one hierarchy configuration, in exportable form.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSummary {
    pub config: String,
    pub total_instructions: u64,
    pub l1_hit_rate: f64,
    pub l2_hit_rate: f64,
    pub l2_miss_rate: f64,
    pub memory_accesses: u64,
    pub mpki: f64,
    pub victim_hit_rate: Option<f64>,
    pub victim_size_final: Option<usize>,
    pub adaptations: usize,
}

impl ConfigSummary {
    pub fn from_hierarchy(sim: &CacheHierarchy) -> Self {
        Self {
            config: sim.mode().label().to_string(),
            total_instructions: sim.total_instructions(),
            l1_hit_rate: sim.l1_hit_rate(),
            l2_hit_rate: sim.l2_hit_rate(),
            l2_miss_rate: 1.0 - sim.l2_hit_rate(),
            memory_accesses: sim.memory_stats().accesses,
            mpki: sim.mpki(),
            victim_hit_rate: sim.victim().map(|v| v.stats().hit_rate),
            victim_size_final: sim.victim().map(|v| v.current_size()),
            adaptations: sim.controller().map_or(0, |c| c.history().len()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkloadReport {
    pub workload: String,
    pub configs: Vec<ConfigSummary>,
}

pub fn write_summary_json(path: &Path, reports: &[WorkloadReport]) -> std::io::Result<()> {
    let payload = serde_json::to_string_pretty(reports)
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
    fs::write(path, payload)
}

fn print_cache_stats(cache: &SetAssociativeCache) {
    let stats = cache.stats();
    println!(
        "{}: {} accesses, {} hits, {} misses ({:.2}% hit rate)",
        cache.name(),
        stats.accesses,
        stats.hits,
        stats.misses,
        stats.hit_rate() * 100.0
    );
}

pub fn print_summary(sim: &CacheHierarchy) {
    println!("\n--- {} configuration ---", sim.mode().label());

    print_cache_stats(sim.l1());

    if let Some(victim) = sim.victim() {
        let stats = victim.stats();
        println!(
            "Victim: {} entries, {:.2}% occupancy, {} accesses, {} hits ({:.2}% hit rate)",
            victim.current_size(),
            victim.occupancy() * 100.0,
            stats.total_accesses,
            stats.victim_hits,
            stats.hit_rate * 100.0
        );
        println!(
            "Victim insertion filter: {} admitted, {} bypassed, {} predicted reuses, {} evictions",
            stats.victim_insertions,
            stats.bypassed_insertions,
            stats.predicted_reuses,
            stats.victim_evictions
        );
    }

    print_cache_stats(sim.l2());

    println!(
        "Memory: {} accesses, {} instructions, {:.2} MPKI",
        sim.memory_stats().accesses,
        sim.total_instructions(),
        sim.mpki()
    );
}

pub fn print_comparison(workload: &str, summaries: &[ConfigSummary]) {
    println!("\n================ comparison: {workload} ================");
    println!(
        "{:<12} {:>12} {:>14} {:>10} {:>12}",
        "Config", "L1 hit", "L2 miss", "MPKI", "Victim hit"
    );
    for summary in summaries {
        let victim = summary
            .victim_hit_rate
            .map(|r| format!("{:.2}%", r * 100.0))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<12} {:>11.2}% {:>13.2}% {:>10.2} {:>12}",
            summary.config,
            summary.l1_hit_rate * 100.0,
            summary.l2_miss_rate * 100.0,
            summary.mpki,
            victim
        );
    }

    let baseline = summaries.iter().find(|s| s.config == "baseline");
    if let Some(baseline) = baseline {
        for summary in summaries.iter().filter(|s| s.config != "baseline") {
            let miss_reduction = (baseline.l2_miss_rate - summary.l2_miss_rate) * 100.0;
            let hit_gain = if baseline.l2_hit_rate > 0.0 {
                (summary.l2_hit_rate - baseline.l2_hit_rate) / baseline.l2_hit_rate * 100.0
            } else {
                0.0
            };
            println!(
                "{}: L2 hit rate {:+.2}% vs baseline, L2 miss reduction {:.2} pp",
                summary.config, hit_gain, miss_reduction
            );
        }
    }
}

/// How many adaptations fired under each observed phase, indexed by the
/// phase's integer encoding.
pub fn phase_breakdown(history: &[AdaptationRecord]) -> [usize; 4] {
    let mut counts = [0usize; 4];
    for record in history {
        counts[record.phase as usize] += 1;
    }
    counts
}

pub fn print_phase_breakdown(history: &[AdaptationRecord]) {
    let counts = phase_breakdown(history);
    println!("Adaptations by phase:");
    for (idx, count) in counts.iter().enumerate() {
        let phase = WorkloadPhase::from_usize(idx).unwrap_or(WorkloadPhase::Unknown);
        println!("  {phase:?}: {count}");
    }
}
