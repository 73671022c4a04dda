pub mod phase;

pub use phase::{PhaseDetector, PhaseMetrics, WorkloadPhase};
