use crate::api::scenario_dto::ScenarioDto;
use crate::domain::simulator::scenario::Scenario;
use crate::error::Result;
use crate::loader::parser::parse_json_file;

pub mod api;
pub mod domain;
pub mod error;
pub mod loader;
pub mod logger;

/// Reads a scenario file and builds the substrate, request queue and run configuration it describes.
pub fn load_scenario(file_path: &str) -> Result<Scenario> {
    logger::init();
    log::info!("Logger initialized. Starting scenario construction.");

    let root_dto: ScenarioDto = parse_json_file::<ScenarioDto>(file_path)?;
    log::info!("JSON file parsed successfully.");

    let scenario = Scenario::from_dto(root_dto)?;
    log::info!(
        "Scenario constructed: substrate '{}' with {} nodes, {} VNRs, algorithm {}.",
        scenario.substrate.get_name(),
        scenario.substrate.node_count(),
        scenario.vnrs.len(),
        scenario.config.algorithm
    );

    Ok(scenario)
}
