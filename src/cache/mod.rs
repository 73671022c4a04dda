pub mod set_assoc;
pub mod victim;

pub use set_assoc::{AccessOutcome, CacheStats, EvictedBlock, SetAssociativeCache};
pub use victim::{VictimCache, VictimEntry, VictimStats};

/// Bytes per cache block. The low 6 address bits never participate in
/// block identity.
pub const BLOCK_SIZE: u64 = 64;

pub type BlockData = [u8; BLOCK_SIZE as usize];
