pub mod adaptive;
pub mod cache;
pub mod monitor;
pub mod sim;
pub mod workload;

mod unit_tests;
