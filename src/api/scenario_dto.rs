use serde::{Deserialize, Serialize};

use crate::api::simulation_dto::SimulationConfigDto;
use crate::api::substrate_dto::SubstrateDto;
use crate::api::vnr_dto::VnrDto;
use crate::domain::substrate::topology::SubstrateGeneratorConfig;
use crate::domain::vnr::vnr_generator::VnrGeneratorConfig;

/// Root of a scenario file: where the substrate and the request queue come from, and how to run.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioDto {
    pub substrate: SubstrateSourceDto,
    pub vnrs: VnrSourceDto,
    pub simulation: SimulationConfigDto,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SubstrateSourceDto {
    /// "German" or "Italian".
    Reference { name: String },
    Generated(SubstrateGeneratorConfig),
    Explicit(SubstrateDto),
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum VnrSourceDto {
    Reference,
    Generated(VnrGeneratorConfig),
    Explicit { requests: Vec<VnrDto> },
}
