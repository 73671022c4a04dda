use std::collections::VecDeque;

use log::{debug, info, warn};
use serde::Serialize;

use crate::cache::{BlockData, BLOCK_SIZE};

pub const DEFAULT_VICTIM_SIZE: usize = 128;
pub const MIN_VICTIM_SIZE: usize = 64;
pub const MAX_VICTIM_SIZE: usize = 256;
pub const PHASE_WINDOW: u64 = 10_000;

pub const REUSE_PREDICTION_THRESHOLD: u32 = 2;
pub const BYPASS_STREAMING_THRESHOLD: u32 = 10;

const ACCESS_HISTORY_DEPTH: usize = 1000;
const REUSE_TABLE_BUCKETS: usize = 10_000;
const REUSE_SCAN_DEPTH: usize = 100;

#[derive(Debug, Default, Clone)]
pub struct VictimEntry {
    pub address: u64,
    /// `address >> 6`, kept alongside the full address for inspection.
    pub tag: u64,
    pub data: Option<Box<BlockData>>,
    pub valid: bool,
    pub lru_counter: u64,
    pub insertion_time: u64,
    pub access_count: u32,
    pub reuse_distance: u32,
    pub high_reuse_block: bool,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct VictimStats {
    pub victim_hits: u64,
    pub victim_misses: u64,
    pub victim_insertions: u64,
    pub victim_evictions: u64,
    pub llc_promotions: u64,
    pub total_accesses: u64,
    pub bypassed_insertions: u64,
    pub predicted_reuses: u64,

    pub occupancy_rate: f64,
    pub hit_rate: f64,
    pub reuse_frequency: f64,
    pub avg_access_count: f64,

    pub miss_ratio_trend: Vec<f64>,
    pub hit_rate_history: Vec<f64>,
    pub occupancy_history: Vec<f64>,
}

impl VictimStats {
    fn update_rates(&mut self) {
        if self.total_accesses > 0 {
            self.hit_rate = self.victim_hits as f64 / self.total_accesses as f64;
        }
        if self.victim_insertions > 0 {
            self.reuse_frequency = self.victim_hits as f64 / self.victim_insertions as f64;
            self.avg_access_count = self.reuse_frequency;
        }
    }

    fn record_phase(&mut self) {
        self.hit_rate_history.push(self.hit_rate);
        self.occupancy_history.push(self.occupancy_rate);
        let miss_ratio = if self.total_accesses > 0 {
            self.victim_misses as f64 / self.total_accesses as f64
        } else {
            0.0
        };
        self.miss_ratio_trend.push(miss_ratio);
    }
}

/// Tracks the recent reference stream to decide which blocks are worth
/// keeping: a per-bucket reuse counter table, a bounded history of recent
/// addresses, and a run detector for sequential streams.
#[derive(Debug)]
struct ReusePredictor {
    history: VecDeque<u64>,
    counters: Vec<u32>,
    last_sequential_addr: u64,
    sequential_count: u32,
}

impl ReusePredictor {
    fn new() -> Self {
        Self {
            history: VecDeque::with_capacity(ACCESS_HISTORY_DEPTH),
            counters: vec![0; REUSE_TABLE_BUCKETS],
            last_sequential_addr: 0,
            sequential_count: 0,
        }
    }

    fn bucket(address: u64) -> usize {
        ((address / BLOCK_SIZE) % REUSE_TABLE_BUCKETS as u64) as usize
    }

    fn observe(&mut self, address: u64) {
        if self.history.len() == ACCESS_HISTORY_DEPTH {
            self.history.pop_front();
        }
        self.history.push_back(address);
        let idx = Self::bucket(address);
        self.counters[idx] = self.counters[idx].saturating_add(1);
    }

    /// Advances the sequential-run detector. A run only counts as streaming
    /// once it is longer than `BYPASS_STREAMING_THRESHOLD` blocks.
    fn is_streaming(&mut self, address: u64) -> bool {
        if address == self.last_sequential_addr.wrapping_add(BLOCK_SIZE) {
            self.sequential_count += 1;
            if self.sequential_count > BYPASS_STREAMING_THRESHOLD {
                self.last_sequential_addr = address;
                return true;
            }
        } else {
            self.sequential_count = 0;
        }
        self.last_sequential_addr = address;
        false
    }

    fn score(&self, address: u64) -> u32 {
        let recent = self
            .history
            .iter()
            .rev()
            .take(REUSE_SCAN_DEPTH)
            .filter(|&&a| a == address)
            .count() as u32;
        self.counters[Self::bucket(address)].saturating_add(recent)
    }
}

/// Fully associative victim cache with true LRU and a runtime-resizable
/// logical capacity over a fixed `MAX_VICTIM_SIZE` entry array. Insertion
/// goes through an admission filter that bypasses streaming blocks and
/// blocks with no predicted reuse.
pub struct VictimCache {
    entries: Vec<VictimEntry>,
    current_size: usize,
    global_lru_counter: u64,
    stats: VictimStats,
    predictor: ReusePredictor,
}

impl Default for VictimCache {
    fn default() -> Self {
        Self::new(DEFAULT_VICTIM_SIZE)
    }
}

impl VictimCache {
    /// The constructor trusts the caller with the initial size (tests use
    /// tiny caches); `resize` is the operation that enforces
    /// `[MIN_VICTIM_SIZE, MAX_VICTIM_SIZE]`.
    pub fn new(size: usize) -> Self {
        let current_size = size.clamp(1, MAX_VICTIM_SIZE);
        info!("victim cache initialized with {current_size} entries");
        Self {
            entries: vec![VictimEntry::default(); MAX_VICTIM_SIZE],
            current_size,
            global_lru_counter: 0,
            stats: VictimStats::default(),
            predictor: ReusePredictor::new(),
        }
    }

    pub fn current_size(&self) -> usize {
        self.current_size
    }

    /// Logically active entries, for inspection.
    pub fn entries(&self) -> &[VictimEntry] {
        &self.entries[..self.current_size]
    }

    pub fn stats(&self) -> &VictimStats {
        &self.stats
    }

    pub fn valid_entries(&self) -> usize {
        self.entries[..self.current_size]
            .iter()
            .filter(|e| e.valid)
            .count()
    }

    pub fn occupancy(&self) -> f64 {
        self.valid_entries() as f64 / self.current_size as f64
    }

    fn touch(&mut self, way: usize) {
        self.entries[way].lru_counter = self.global_lru_counter;
        self.global_lru_counter += 1;
    }

    fn find_entry(&self, address: u64) -> Option<usize> {
        self.entries[..self.current_size]
            .iter()
            .position(|e| e.valid && e.address == address)
    }

    /// Invalid entries win over any valid entry; ties on the stamp go to the
    /// lowest way.
    fn find_lru_way(&self) -> usize {
        let mut lru_way = 0;
        let mut min_lru = u64::MAX;
        for (way, entry) in self.entries[..self.current_size].iter().enumerate() {
            if !entry.valid {
                return way;
            }
            if entry.lru_counter < min_lru {
                min_lru = entry.lru_counter;
                lru_way = way;
            }
        }
        lru_way
    }

    fn invalidate_entry(&mut self, way: usize) {
        self.entries[way].valid = false;
        self.entries[way].access_count = 0;
    }

    pub fn lookup(&mut self, address: u64) -> bool {
        self.stats.total_accesses += 1;
        self.predictor.observe(address);

        if let Some(way) = self.find_entry(address) {
            self.stats.victim_hits += 1;
            self.entries[way].access_count += 1;
            self.touch(way);
            return true;
        }

        self.stats.victim_misses += 1;
        false
    }

    pub fn insert(&mut self, address: u64, tag: u64, data: Option<&BlockData>) {
        self.insert_smart(address, tag, data, 0);
    }

    /// Admission-filtered insert. `access_count` is the block's access count
    /// in the upstream cache it was evicted from; a well-used block is
    /// admitted outright, everything else must show reuse in the recent
    /// reference stream. Long sequential runs bypass unconditionally.
    pub fn insert_smart(
        &mut self,
        address: u64,
        tag: u64,
        data: Option<&BlockData>,
        access_count: u32,
    ) {
        self.predictor.observe(address);

        if !self.should_insert(address, access_count) {
            return;
        }

        self.stats.victim_insertions += 1;

        if let Some(way) = self.find_entry(address) {
            // Already resident: refresh rather than duplicate.
            self.touch(way);
            self.entries[way].access_count += 1;
            self.entries[way].high_reuse_block = true;
            self.stats.predicted_reuses += 1;
            return;
        }

        let way = self.find_lru_way();
        if self.entries[way].valid {
            self.stats.victim_evictions += 1;
        }

        let entry = &mut self.entries[way];
        entry.address = address;
        entry.tag = tag;
        entry.data = data.map(|d| Box::new(*d));
        entry.valid = true;
        entry.insertion_time = self.global_lru_counter;
        entry.access_count = access_count;
        entry.reuse_distance = 0;
        entry.high_reuse_block = access_count >= REUSE_PREDICTION_THRESHOLD;
        self.touch(way);
    }

    fn should_insert(&mut self, address: u64, access_count: u32) -> bool {
        if self.predictor.is_streaming(address) {
            self.stats.bypassed_insertions += 1;
            return false;
        }

        if access_count >= REUSE_PREDICTION_THRESHOLD || self.predictor.score(address) >= 2 {
            return true;
        }

        self.stats.bypassed_insertions += 1;
        false
    }

    /// Evicts the LRU entry, handing back its address and payload. Returns
    /// `None` when the LRU way is invalid, i.e. the cache is not full.
    pub fn evict_lru(&mut self) -> Option<(u64, Option<Box<BlockData>>)> {
        let way = self.find_lru_way();
        if !self.entries[way].valid {
            return None;
        }

        let address = self.entries[way].address;
        let data = self.entries[way].data.take();
        self.invalidate_entry(way);
        self.stats.victim_evictions += 1;
        Some((address, data))
    }

    /// Hands the block at `way` off to the next level and drops it here.
    pub fn promote_to_llc(&mut self, way: usize) {
        if way < self.current_size && self.entries[way].valid {
            self.stats.llc_promotions += 1;
            self.invalidate_entry(way);
        }
    }

    /// Changes the logical capacity. Shrinking invalidates every valid entry
    /// that falls outside the new window and counts each as an eviction;
    /// grown-into slots start invalid and are immediately eligible as LRU
    /// victims. Out-of-range sizes are rejected without touching state.
    pub fn resize(&mut self, new_size: usize) {
        if !(MIN_VICTIM_SIZE..=MAX_VICTIM_SIZE).contains(&new_size) {
            warn!(
                "rejecting victim cache resize to {new_size} (allowed {MIN_VICTIM_SIZE}..={MAX_VICTIM_SIZE})"
            );
            return;
        }

        if new_size < self.current_size {
            for way in new_size..self.current_size {
                if self.entries[way].valid {
                    self.invalidate_entry(way);
                    self.stats.victim_evictions += 1;
                }
            }
        }

        debug!(
            "victim cache resized from {} to {} entries",
            self.current_size, new_size
        );
        self.current_size = new_size;
    }

    /// Recomputes the derived rates from the raw counters.
    pub fn refresh_rates(&mut self) {
        self.stats.occupancy_rate = self.occupancy();
        self.stats.update_rates();
    }

    /// Samples the derived rates into the rolling history vectors once per
    /// `PHASE_WINDOW` instructions.
    pub fn update_phase_stats(&mut self, instruction_count: u64) {
        if instruction_count % PHASE_WINDOW == 0 {
            self.refresh_rates();
            self.stats.record_phase();
        }
    }

    pub fn reset_stats(&mut self) {
        self.stats = VictimStats::default();
    }
}
