use std::collections::VecDeque;

use log::debug;
use num_derive::FromPrimitive;
use serde::Serialize;

pub const DETECTION_WINDOW: u64 = 50_000;
pub const HISTORY_LENGTH: usize = 10;
pub const PHASE_CHANGE_THRESHOLD: f64 = 0.15;

/// Accesses per 1000 instructions above which a window counts as
/// memory-bound; below half of it, compute-bound.
const HIGH_MEMORY_INTENSITY: f64 = 100.0;
const HIGH_MISS_RATE: f64 = 0.10;

/// Workload regime of one detection window. The discriminants are stable;
/// exported records store them as integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, FromPrimitive, Serialize)]
pub enum WorkloadPhase {
    MemoryIntensive = 0,
    ComputeIntensive = 1,
    Mixed = 2,
    #[default]
    Unknown = 3,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct PhaseMetrics {
    pub instruction_count: u64,
    pub memory_accesses: u64,
    pub cache_misses: u64,
    pub miss_rate: f64,
    pub memory_intensity: f64,
    pub phase_type: WorkloadPhase,
    /// Global instruction count at which the window was completed.
    pub timestamp: u64,
}

/// Classifies the workload over rolling instruction windows and signals when
/// consecutive windows stop resembling each other.
#[derive(Debug, Default)]
pub struct PhaseDetector {
    history: VecDeque<PhaseMetrics>,
    current: PhaseMetrics,
    window_start_instruction: u64,
    global_instruction_count: u64,
}

impl PhaseDetector {
    pub fn new() -> Self {
        debug!("phase detector initialized, window = {DETECTION_WINDOW} instructions");
        Self::default()
    }

    pub fn record_instruction(&mut self) {
        self.global_instruction_count += 1;
        self.current.instruction_count += 1;
    }

    pub fn record_memory_access(&mut self, is_miss: bool) {
        self.current.memory_accesses += 1;
        if is_miss {
            self.current.cache_misses += 1;
        }
    }

    /// Bulk form of the two record calls.
    pub fn update(&mut self, instructions: u64, memory_accesses: u64, misses: u64) {
        self.current.instruction_count += instructions;
        self.current.memory_accesses += memory_accesses;
        self.current.cache_misses += misses;
        self.global_instruction_count += instructions;
    }

    fn classify(metrics: &PhaseMetrics) -> WorkloadPhase {
        if metrics.memory_accesses == 0 {
            return WorkloadPhase::ComputeIntensive;
        }

        let intensity =
            metrics.memory_accesses as f64 / (metrics.instruction_count as f64 / 1000.0);
        let miss_rate = metrics.cache_misses as f64 / metrics.memory_accesses as f64;

        if intensity > HIGH_MEMORY_INTENSITY && miss_rate > HIGH_MISS_RATE {
            WorkloadPhase::MemoryIntensive
        } else if intensity < HIGH_MEMORY_INTENSITY / 2.0 {
            WorkloadPhase::ComputeIntensive
        } else {
            WorkloadPhase::Mixed
        }
    }

    /// Similarity of two windows in [0, 1]. Windows with no memory traffic
    /// are incomparable and score 0.
    fn similarity(m1: &PhaseMetrics, m2: &PhaseMetrics) -> f64 {
        if m1.memory_accesses == 0 || m2.memory_accesses == 0 {
            return 0.0;
        }

        let miss_rate_diff = (m1.miss_rate - m2.miss_rate).abs();
        let max_intensity = m1.memory_intensity.max(m2.memory_intensity);
        let intensity_diff = if max_intensity > 0.0 {
            (m1.memory_intensity - m2.memory_intensity).abs() / max_intensity
        } else {
            0.0
        };

        1.0 - (miss_rate_diff + intensity_diff) / 2.0
    }

    fn detect_transition(&self) -> bool {
        match self.history.back() {
            Some(prev) => {
                Self::similarity(prev, &self.current) < 1.0 - PHASE_CHANGE_THRESHOLD
            }
            None => false,
        }
    }

    /// Completes the current window once it spans `DETECTION_WINDOW`
    /// instructions: derives its rates, classifies it, pushes it onto the
    /// bounded history and starts a fresh window. Returns whether the
    /// completed window constitutes a phase transition.
    pub fn check_phase_change(&mut self) -> bool {
        if self.current.instruction_count < DETECTION_WINDOW {
            return false;
        }

        if self.current.memory_accesses > 0 {
            self.current.miss_rate =
                self.current.cache_misses as f64 / self.current.memory_accesses as f64;
            self.current.memory_intensity = self.current.memory_accesses as f64
                / (self.current.instruction_count as f64 / 1000.0);
        }

        self.current.phase_type = Self::classify(&self.current);
        self.current.timestamp = self.global_instruction_count;

        let phase_changed = self.detect_transition();
        if phase_changed {
            debug!(
                "phase transition at {} instructions: {:?}",
                self.global_instruction_count, self.current.phase_type
            );
        }

        if self.history.len() == HISTORY_LENGTH {
            self.history.pop_front();
        }
        self.history.push_back(self.current);

        self.window_start_instruction = self.global_instruction_count;
        self.current = PhaseMetrics::default();

        phase_changed
    }

    /// Phase of the most recently completed window.
    pub fn current_phase(&self) -> WorkloadPhase {
        self.history
            .back()
            .map(|m| m.phase_type)
            .unwrap_or_default()
    }

    pub fn current_metrics(&self) -> &PhaseMetrics {
        &self.current
    }

    pub fn history(&self) -> &VecDeque<PhaseMetrics> {
        &self.history
    }

    pub fn global_instruction_count(&self) -> u64 {
        self.global_instruction_count
    }

    /// Ordinary least-squares slope of the miss rate across the history,
    /// oldest window first. Zero until two windows exist.
    pub fn miss_rate_trend(&self) -> f64 {
        let n = self.history.len();
        if n < 2 {
            return 0.0;
        }

        let mut sum_x = 0.0;
        let mut sum_y = 0.0;
        let mut sum_xy = 0.0;
        let mut sum_xx = 0.0;
        for (i, metrics) in self.history.iter().enumerate() {
            let x = i as f64;
            let y = metrics.miss_rate;
            sum_x += x;
            sum_y += y;
            sum_xy += x * y;
            sum_xx += x * x;
        }

        let n = n as f64;
        (n * sum_xy - sum_x * sum_y) / (n * sum_xx - sum_x * sum_x)
    }

    pub fn memory_intensity(&self) -> f64 {
        self.history
            .back()
            .map(|m| m.memory_intensity)
            .unwrap_or(0.0)
    }

    pub fn is_memory_intensive(&self) -> bool {
        self.current_phase() == WorkloadPhase::MemoryIntensive
    }
}
