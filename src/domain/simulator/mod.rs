pub mod event;
pub mod run_result;
pub mod scenario;
pub mod simulation_config;
pub mod simulator;
