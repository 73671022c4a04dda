pub mod config;
pub mod hierarchy;
pub mod report;

pub use config::{Config, SimConfig};
pub use hierarchy::{CacheHierarchy, HierarchyMode};
pub use report::{ConfigSummary, WorkloadReport};
