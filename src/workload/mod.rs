use crate::cache::BLOCK_SIZE;

/// Synthetic address-stream generators for driving the hierarchy. Streams
/// are fully determined by `(kind, count, seed)`; nothing here claims to
/// model a particular benchmark's distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadKind {
    MemoryIntensive,
    ComputeIntensive,
    Mixed,
    Streaming,
    Strided,
    Random,
}

impl WorkloadKind {
    pub fn all() -> [WorkloadKind; 6] {
        [
            WorkloadKind::MemoryIntensive,
            WorkloadKind::ComputeIntensive,
            WorkloadKind::Mixed,
            WorkloadKind::Streaming,
            WorkloadKind::Strided,
            WorkloadKind::Random,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            WorkloadKind::MemoryIntensive => "memory_intensive",
            WorkloadKind::ComputeIntensive => "compute_intensive",
            WorkloadKind::Mixed => "mixed",
            WorkloadKind::Streaming => "streaming",
            WorkloadKind::Strided => "strided",
            WorkloadKind::Random => "random",
        }
    }

    pub fn from_name(name: &str) -> Option<WorkloadKind> {
        match name {
            "memory" | "memory_intensive" => Some(WorkloadKind::MemoryIntensive),
            "compute" | "compute_intensive" => Some(WorkloadKind::ComputeIntensive),
            "mixed" => Some(WorkloadKind::Mixed),
            "streaming" => Some(WorkloadKind::Streaming),
            "strided" => Some(WorkloadKind::Strided),
            "random" => Some(WorkloadKind::Random),
            _ => None,
        }
    }

    pub fn generate(self, count: u64, seed: u64) -> Vec<u64> {
        match self {
            WorkloadKind::MemoryIntensive => memory_intensive(count, seed),
            WorkloadKind::ComputeIntensive => compute_intensive(count, seed),
            WorkloadKind::Mixed => mixed(count, seed),
            WorkloadKind::Streaming => streaming(count),
            WorkloadKind::Strided => strided(count, STRIDE_BLOCKS),
            WorkloadKind::Random => random_access(count, seed),
        }
    }
}

struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        mix64(self.state)
    }

    fn below(&mut self, bound: u64) -> u64 {
        if bound == 0 {
            0
        } else {
            self.next() % bound
        }
    }
}

fn mix64(mut x: u64) -> u64 {
    x ^= x >> 30;
    x = x.wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

/// Alternates between large- and small-working-set regions, with frequent
/// short-range revisits of earlier addresses.
pub fn memory_intensive(count: u64, seed: u64) -> Vec<u64> {
    let mut addresses = Vec::with_capacity(count as usize);
    let mut rng = SplitMix64::new(seed ^ 0x1);
    let phase_length = (count / 5).max(1);

    for i in 0..count {
        let phase = i / phase_length;
        let address = if phase % 2 == 0 {
            let choice = rng.below(100);
            if choice < 40 {
                rng.below(128) * BLOCK_SIZE
            } else if choice < 80 {
                rng.below(1024) * BLOCK_SIZE
            } else if i > 20 {
                let lookback = rng.below(100.min(i));
                addresses[(i - lookback - 1) as usize]
            } else {
                i * BLOCK_SIZE
            }
        } else {
            let choice = rng.below(100);
            if choice < 60 {
                rng.below(64) * BLOCK_SIZE
            } else {
                rng.below(256) * BLOCK_SIZE
            }
        };
        addresses.push(address);
    }

    addresses
}

/// Small hot set with an occasional slowly-advancing cold access.
pub fn compute_intensive(count: u64, seed: u64) -> Vec<u64> {
    let mut addresses = Vec::with_capacity(count as usize);
    let mut rng = SplitMix64::new(seed);
    let working_set = 64;
    let hot_set = 16;

    for i in 0..count {
        let choice = rng.below(100);
        let address = if choice < 70 {
            rng.below(hot_set) * BLOCK_SIZE
        } else if choice < 95 {
            (i % working_set) * BLOCK_SIZE
        } else {
            (working_set + i / 1000) * BLOCK_SIZE
        };
        addresses.push(address);
    }

    addresses
}

/// Six distinct regimes back to back: scans, tight loops, and revisit-heavy
/// stretches, to exercise phase detection.
pub fn mixed(count: u64, seed: u64) -> Vec<u64> {
    let mut addresses = Vec::with_capacity(count as usize);
    let mut rng = SplitMix64::new(seed ^ 0x3);
    let phase_length = (count / 6).max(1);

    for i in 0..count {
        let phase = i / phase_length;
        let phase_offset = i % phase_length;

        let address = match phase {
            0 | 3 => {
                let choice = rng.below(100);
                if choice < 35 {
                    rng.below(128) * BLOCK_SIZE
                } else if choice < 70 {
                    rng.below(800) * BLOCK_SIZE
                } else if phase_offset > 20 {
                    let lookback = rng.below(80.min(phase_offset));
                    addresses[(i - lookback - 1) as usize]
                } else {
                    i * BLOCK_SIZE
                }
            }
            1 | 4 => {
                if rng.below(100) < 85 {
                    rng.below(32) * BLOCK_SIZE
                } else {
                    (i % 64) * BLOCK_SIZE
                }
            }
            2 => {
                if rng.below(100) < 90 {
                    i * BLOCK_SIZE
                } else if phase_offset > 10 {
                    let lookback = rng.below(15.min(phase_offset));
                    addresses[(i - lookback - 1) as usize]
                } else {
                    i * BLOCK_SIZE
                }
            }
            _ => {
                if rng.below(100) < 50 && phase_offset > 15 {
                    let lookback = rng.below(50.min(phase_offset));
                    addresses[(i - lookback - 1) as usize]
                } else {
                    rng.below(256) * BLOCK_SIZE
                }
            }
        };
        addresses.push(address);
    }

    addresses
}

/// Strictly monotone block-aligned scan; nothing is ever revisited.
pub fn streaming(count: u64) -> Vec<u64> {
    (0..count).map(|i| i * BLOCK_SIZE).collect()
}

/// Blocks touched per stride step in the strided scan.
const STRIDE_BLOCKS: u64 = 16;
const STRIDED_FOOTPRINT_BLOCKS: u64 = 1024;

/// Cyclic scan at a fixed block stride over a small footprint. With the
/// default stride of 16 the scan revisits the same 64 blocks over and over,
/// so every block is highly reused but never sequentially adjacent.
pub fn strided(count: u64, stride: u64) -> Vec<u64> {
    (0..count)
        .map(|i| ((i * stride) % STRIDED_FOOTPRINT_BLOCKS) * BLOCK_SIZE)
        .collect()
}

pub fn random_access(count: u64, seed: u64) -> Vec<u64> {
    let mut rng = SplitMix64::new(seed);
    (0..count).map(|_| rng.below(8192) * BLOCK_SIZE).collect()
}
