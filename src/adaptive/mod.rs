pub mod controller;

pub use controller::{AdaptationRecord, AdaptiveController, SizingDecision};
