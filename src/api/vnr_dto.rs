use serde::{Deserialize, Serialize};

use crate::domain::vnr::virtual_network_request::VnrShape;

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct VnrDto {
    pub id: u32,
    pub arrival_time: i64,
    pub holding_duration: i64,

    #[serde(default)]
    pub shape: Option<VnrShape>,
    pub nodes: Vec<VirtualNodeDto>,

    #[serde(default)]
    pub links: Vec<VirtualLinkDto>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNodeDto {
    pub id: u32,
    pub cpu_demand: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct VirtualLinkDto {
    pub source: u32,
    pub target: u32,
    pub bandwidth_demand: i64,
}
