pub mod scenario_dto;
pub mod simulation_dto;
pub mod substrate_dto;
pub mod vnr_dto;
