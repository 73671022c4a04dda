use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::{debug, info};
use num_derive::FromPrimitive;
use serde::Serialize;

use crate::cache::victim::{VictimCache, MAX_VICTIM_SIZE, MIN_VICTIM_SIZE};
use crate::monitor::phase::{PhaseDetector, WorkloadPhase};

pub const ADAPTATION_INTERVAL: u64 = 50_000;
pub const SIZE_ADJUSTMENT_STEP: usize = 32;

pub const HIT_RATE_THRESHOLD_HIGH: f64 = 0.08;
pub const HIT_RATE_THRESHOLD_LOW: f64 = 0.02;
pub const OCCUPANCY_THRESHOLD_HIGH: f64 = 0.75;
pub const OCCUPANCY_THRESHOLD_LOW: f64 = 0.30;

/// Sizing verdict of one policy evaluation. The discriminants are stable;
/// exported records store them as integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, Serialize)]
pub enum SizingDecision {
    Increase = 0,
    Decrease = 1,
    Maintain = 2,
    NoChange = 3,
}

/// One applied adaptation: when it happened, what the cache became, and what
/// the controller observed at the time.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AdaptationRecord {
    pub timestamp: u64,
    pub victim_size: usize,
    pub hit_rate: f64,
    pub occupancy: f64,
    pub phase: WorkloadPhase,
    pub decision: SizingDecision,
}

/// Resizes the victim cache at a fixed instruction cadence by fusing three
/// sub-policies through a vote. Growth is deliberately easier to trigger
/// than shrinking: one INCREASE vote wins, shrinking needs two.
#[derive(Debug, Default)]
pub struct AdaptiveController {
    last_adaptation_time: u64,
    instruction_count: u64,
    history: Vec<AdaptationRecord>,
}

impl AdaptiveController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &[AdaptationRecord] {
        &self.history
    }

    /// Accumulates caller ticks; runs an adaptation step once
    /// `ADAPTATION_INTERVAL` instructions have passed since the last one.
    pub fn update(&mut self, instructions: u64, cache: &mut VictimCache, detector: &PhaseDetector) {
        self.instruction_count += instructions;
        if self.instruction_count - self.last_adaptation_time >= ADAPTATION_INTERVAL {
            self.check_and_adapt(cache, detector);
        }
    }

    pub fn check_and_adapt(&mut self, cache: &mut VictimCache, detector: &PhaseDetector) {
        let decision = Self::hybrid_policy(cache, detector);
        self.apply_decision(decision, cache, detector);
        self.last_adaptation_time = self.instruction_count;
    }

    fn hit_rate_policy(cache: &VictimCache) -> SizingDecision {
        let hit_rate = cache.stats().hit_rate;
        let occupancy = cache.occupancy();

        if hit_rate > HIT_RATE_THRESHOLD_HIGH && occupancy > OCCUPANCY_THRESHOLD_HIGH {
            SizingDecision::Increase
        } else if hit_rate < HIT_RATE_THRESHOLD_LOW && occupancy < OCCUPANCY_THRESHOLD_LOW {
            SizingDecision::Decrease
        } else {
            SizingDecision::Maintain
        }
    }

    fn occupancy_policy(cache: &VictimCache) -> SizingDecision {
        let occupancy = cache.occupancy();
        let stats = cache.stats();

        if occupancy > OCCUPANCY_THRESHOLD_HIGH {
            if stats.hit_rate > 0.05 || stats.reuse_frequency > 0.1 {
                return SizingDecision::Increase;
            }
        } else if occupancy < OCCUPANCY_THRESHOLD_LOW {
            return SizingDecision::Decrease;
        }

        SizingDecision::Maintain
    }

    fn phase_aware_policy(cache: &VictimCache, detector: &PhaseDetector) -> SizingDecision {
        match detector.current_phase() {
            WorkloadPhase::MemoryIntensive => {
                if cache.stats().hit_rate > HIT_RATE_THRESHOLD_LOW {
                    SizingDecision::Increase
                } else {
                    SizingDecision::Maintain
                }
            }
            WorkloadPhase::ComputeIntensive => SizingDecision::Decrease,
            WorkloadPhase::Mixed => Self::occupancy_policy(cache),
            WorkloadPhase::Unknown => SizingDecision::Maintain,
        }
    }

    fn hybrid_policy(cache: &VictimCache, detector: &PhaseDetector) -> SizingDecision {
        let votes = [
            Self::hit_rate_policy(cache),
            Self::occupancy_policy(cache),
            Self::phase_aware_policy(cache, detector),
        ];

        let increase_votes = votes
            .iter()
            .filter(|&&d| d == SizingDecision::Increase)
            .count();
        let decrease_votes = votes
            .iter()
            .filter(|&&d| d == SizingDecision::Decrease)
            .count();
        debug!(
            "sizing votes: {votes:?} -> {increase_votes} increase / {decrease_votes} decrease"
        );

        if increase_votes >= 1 {
            SizingDecision::Increase
        } else if decrease_votes >= 2 {
            SizingDecision::Decrease
        } else {
            SizingDecision::Maintain
        }
    }

    fn apply_decision(
        &mut self,
        decision: SizingDecision,
        cache: &mut VictimCache,
        detector: &PhaseDetector,
    ) {
        let current_size = cache.current_size();
        let new_size = match decision {
            SizingDecision::Increase => (current_size + SIZE_ADJUSTMENT_STEP).min(MAX_VICTIM_SIZE),
            SizingDecision::Decrease => {
                current_size.saturating_sub(SIZE_ADJUSTMENT_STEP).max(MIN_VICTIM_SIZE)
            }
            SizingDecision::Maintain | SizingDecision::NoChange => return,
        };

        if new_size == current_size {
            return;
        }

        cache.resize(new_size);
        self.history.push(AdaptationRecord {
            timestamp: self.instruction_count,
            victim_size: new_size,
            hit_rate: cache.stats().hit_rate,
            occupancy: cache.occupancy(),
            phase: detector.current_phase(),
            decision,
        });
        info!(
            "adapted victim cache {current_size} -> {new_size} entries ({decision:?})"
        );
    }

    /// Writes the adaptation history as CSV, phase and decision as their
    /// integer encodings.
    pub fn export_csv(&self, path: &Path) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "timestamp,victim_size,hit_rate,occupancy,phase,decision")?;
        for record in &self.history {
            writeln!(
                writer,
                "{},{},{},{},{},{}",
                record.timestamp,
                record.victim_size,
                record.hit_rate,
                record.occupancy,
                record.phase as u8,
                record.decision as u8
            )?;
        }
        writer.flush()
    }

    pub fn print_history(&self) {
        println!("\n=== Adaptation History ===");
        println!(
            "{:>12} {:>8} {:>10} {:>10} {:>18} {:>10}",
            "Timestamp", "Size", "Hit Rate", "Occupancy", "Phase", "Decision"
        );
        for record in &self.history {
            println!(
                "{:>12} {:>8} {:>9.2}% {:>9.2}% {:>18} {:>10}",
                record.timestamp,
                record.victim_size,
                record.hit_rate * 100.0,
                record.occupancy * 100.0,
                format!("{:?}", record.phase),
                format!("{:?}", record.decision),
            );
        }
        println!("==========================\n");
    }
}
