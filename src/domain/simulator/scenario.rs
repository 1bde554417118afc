use crate::api::scenario_dto::{ScenarioDto, SubstrateSourceDto, VnrSourceDto};
use crate::domain::simulator::run_result::RunResult;
use crate::domain::simulator::simulation_config::SimulationConfig;
use crate::domain::simulator::simulator::run_with_config;
use crate::domain::substrate::substrate_network::SubstrateNetwork;
use crate::domain::substrate::topology::{generate_substrate, german_network, italian_network};
use crate::domain::utils::statistics::export_run;
use crate::domain::vnr::virtual_network_request::VirtualNetworkRequest;
use crate::domain::vnr::vnr_generator::{generate_vnrs, reference_queue};
use crate::error::{Error, Result};

/// A substrate, a request queue and the configuration to run them with.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub substrate: SubstrateNetwork,
    pub vnrs: Vec<VirtualNetworkRequest>,
    pub config: SimulationConfig,
}

impl Scenario {
    pub fn from_dto(dto: ScenarioDto) -> Result<Self> {
        let substrate = match dto.substrate {
            SubstrateSourceDto::Reference { name } => match name.to_lowercase().as_str() {
                "german" => german_network()?,
                "italian" => italian_network()?,
                _ => return Err(Error::InvalidTopologyInput(format!("unknown reference substrate '{}'", name))),
            },
            SubstrateSourceDto::Generated(config) => generate_substrate(&config)?,
            SubstrateSourceDto::Explicit(substrate) => SubstrateNetwork::from_dto(substrate)?,
        };

        let vnrs = match dto.vnrs {
            VnrSourceDto::Reference => reference_queue(),
            VnrSourceDto::Generated(config) => generate_vnrs(&config)?,
            VnrSourceDto::Explicit { requests } => requests.into_iter().map(VirtualNetworkRequest::from_dto).collect::<Result<Vec<_>>>()?,
        };

        let config = SimulationConfig::from_dto(dto.simulation)?;
        Ok(Self { substrate, vnrs, config })
    }

    /// Runs the scenario on a copy of its substrate and exports statistics if configured.
    pub fn run(&self) -> Result<RunResult> {
        let mut substrate = self.substrate.clone();
        let result = run_with_config(&mut substrate, &self.vnrs, &self.config)?;
        if let Some(path) = &self.config.statistics_file {
            export_run(&result, Some(path.as_str()))?;
        }
        Ok(result)
    }
}
