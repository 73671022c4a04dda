use log::debug;

use crate::adaptive::controller::AdaptiveController;
use crate::cache::set_assoc::{CacheStats, SetAssociativeCache};
use crate::cache::victim::VictimCache;
use crate::monitor::phase::PhaseDetector;
use crate::sim::config::SimConfig;

pub const L1_SIZE: usize = 256;
pub const L1_ASSOCIATIVITY: usize = 8;
pub const L2_SIZE: usize = 2048;
pub const L2_ASSOCIATIVITY: usize = 16;

/// How often the driver pushes window stats downstream. The controller has
/// its own, coarser gate on top of this.
pub const STATS_PUSH_INTERVAL: u64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyMode {
    Baseline,
    StaticVictim,
    Adaptive,
}

impl HierarchyMode {
    pub fn label(self) -> &'static str {
        match self {
            HierarchyMode::Baseline => "baseline",
            HierarchyMode::StaticVictim => "static",
            HierarchyMode::Adaptive => "adaptive",
        }
    }
}

/// Routes each access L1 -> victim -> L2 -> memory and owns everything along
/// the way. An evicted L1 block is offered to the victim cache before the
/// victim lookup, so a block evicted and immediately re-requested can hit.
pub struct CacheHierarchy {
    mode: HierarchyMode,
    l1: SetAssociativeCache,
    l2: SetAssociativeCache,
    victim: Option<VictimCache>,
    detector: Option<PhaseDetector>,
    controller: Option<AdaptiveController>,
    memory_stats: CacheStats,
    total_instructions: u64,
    instructions_since_push: u64,
    l1_accesses_at_push: u64,
    l1_misses_at_push: u64,
}

impl CacheHierarchy {
    pub fn new(mode: HierarchyMode, config: &SimConfig) -> Self {
        let (victim, detector, controller) = match mode {
            HierarchyMode::Baseline => (None, None, None),
            HierarchyMode::StaticVictim => (Some(VictimCache::new(config.victim_size)), None, None),
            HierarchyMode::Adaptive => (
                Some(VictimCache::new(config.adaptive_start_size)),
                Some(PhaseDetector::new()),
                Some(AdaptiveController::new()),
            ),
        };
        debug!("cache hierarchy configured: {}", mode.label());

        Self {
            mode,
            l1: SetAssociativeCache::new("L1", L1_SIZE, L1_ASSOCIATIVITY),
            l2: SetAssociativeCache::new("L2", L2_SIZE, L2_ASSOCIATIVITY),
            victim,
            detector,
            controller,
            memory_stats: CacheStats::default(),
            total_instructions: 0,
            instructions_since_push: 0,
            l1_accesses_at_push: 0,
            l1_misses_at_push: 0,
        }
    }

    pub fn mode(&self) -> HierarchyMode {
        self.mode
    }

    pub fn access_memory(&mut self, address: u64) {
        let outcome = self.l1.access(address);
        if outcome.hit {
            return;
        }

        if let Some(victim) = self.victim.as_mut() {
            if let Some(evicted) = outcome.evicted {
                victim.insert_smart(evicted.address, evicted.address >> 6, None, evicted.access_count);
            }
            if victim.lookup(address) {
                return;
            }
        }

        if !self.l2.access(address).hit {
            self.memory_stats.accesses += 1;
            self.memory_stats.misses += 1;
        }
    }

    pub fn simulate_instruction(&mut self) {
        self.total_instructions += 1;
        self.instructions_since_push += 1;

        if let Some(victim) = self.victim.as_mut() {
            victim.update_phase_stats(self.total_instructions);
        }

        if self.controller.is_some() && self.instructions_since_push >= STATS_PUSH_INTERVAL {
            self.push_window_stats();
        }
    }

    /// Feeds the detector the L1 traffic seen since the last push, rolls the
    /// detection window, refreshes the victim cache's derived rates, and
    /// ticks the controller.
    fn push_window_stats(&mut self) {
        let (Some(victim), Some(detector), Some(controller)) = (
            self.victim.as_mut(),
            self.detector.as_mut(),
            self.controller.as_mut(),
        ) else {
            return;
        };

        let l1 = self.l1.stats();
        let accesses = l1.accesses - self.l1_accesses_at_push;
        let misses = l1.misses - self.l1_misses_at_push;
        self.l1_accesses_at_push = l1.accesses;
        self.l1_misses_at_push = l1.misses;

        detector.update(self.instructions_since_push, accesses, misses);
        detector.check_phase_change();

        victim.refresh_rates();
        controller.update(self.instructions_since_push, victim, detector);

        self.instructions_since_push = 0;
    }

    pub fn l1(&self) -> &SetAssociativeCache {
        &self.l1
    }

    pub fn l2(&self) -> &SetAssociativeCache {
        &self.l2
    }

    pub fn memory_stats(&self) -> &CacheStats {
        &self.memory_stats
    }

    pub fn victim(&self) -> Option<&VictimCache> {
        self.victim.as_ref()
    }

    pub fn detector(&self) -> Option<&PhaseDetector> {
        self.detector.as_ref()
    }

    pub fn controller(&self) -> Option<&AdaptiveController> {
        self.controller.as_ref()
    }

    pub fn total_instructions(&self) -> u64 {
        self.total_instructions
    }

    pub fn l1_hit_rate(&self) -> f64 {
        self.l1.stats().hit_rate()
    }

    pub fn l2_hit_rate(&self) -> f64 {
        self.l2.stats().hit_rate()
    }

    /// Off-chip accesses per 1000 instructions.
    pub fn mpki(&self) -> f64 {
        if self.total_instructions > 0 {
            self.memory_stats.accesses as f64 / (self.total_instructions as f64 / 1000.0)
        } else {
            0.0
        }
    }
}
