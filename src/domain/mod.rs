pub mod algorithm;
pub mod embedding;
pub mod metrics;
pub mod simulator;
pub mod substrate;
pub mod utils;
pub mod vnr;
