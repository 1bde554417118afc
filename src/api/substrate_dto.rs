use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SubstrateDto {
    pub name: String,
    pub nodes: Vec<SubstrateNodeDto>,
    pub links: Vec<SubstrateLinkDto>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SubstrateNodeDto {
    pub id: u32,
    pub cpu_capacity: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SubstrateLinkDto {
    /// Assigned in file order when omitted.
    #[serde(default)]
    pub id: Option<u32>,
    pub source: u32,
    pub target: u32,
    pub bandwidth_capacity: i64,
}
