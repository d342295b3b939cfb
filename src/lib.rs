// Tributary: multi-platform social feed aggregation engine
//
// This is the library root. Each module corresponds to a major subsystem
// of the aggregation engine.

pub mod config;
pub mod engine;
pub mod feed;
pub mod host;
pub mod model;
pub mod output;
pub mod persist;
pub mod sort;
pub mod tabs;
pub mod wire;
