use std::cmp::Reverse;
use std::collections::HashSet;

use crate::domain::algorithm::algorithm_trait::EmbedResult;
use crate::domain::algorithm::rejection::RejectionReason;
use crate::domain::embedding::residual_view::ResidualView;
use crate::domain::substrate::path::SubstratePath;
use crate::domain::substrate::substrate_network::SubstrateNetwork;
use crate::domain::utils::id::{SubstrateLinkId, SubstrateNodeId, VirtualNodeId};
use crate::domain::vnr::virtual_network_request::{VirtualLink, VirtualNetworkRequest};

/// Maps virtual nodes by descending demand, each onto the unused substrate node with
/// the most residual cpu (ties: lowest id).
pub fn place_nodes_greedy(view: &mut ResidualView<'_>, vnr: &VirtualNetworkRequest) -> Result<(), RejectionReason> {
    for virtual_node in vnr.nodes_by_demand() {
        let demand = vnr.cpu_demand(virtual_node);
        let candidate = view
            .substrate()
            .node_ids()
            .into_iter()
            .filter(|node| view.can_host(*node, demand))
            .max_by_key(|node| (view.residual_cpu(*node), Reverse(*node)));

        let Some(node) = candidate else {
            log::debug!("VNR {}: no substrate node can host virtual node {} ({} cpu).", vnr.id, virtual_node, demand);
            return Err(RejectionReason::InsufficientNodeCapacity);
        };
        view.place_node(virtual_node, node, demand);
    }
    Ok(())
}

/// Maps the virtual nodes of `virtual_order`, each onto the first substrate node of
/// `order` that can host it.
pub fn place_nodes_in_order(view: &mut ResidualView<'_>, vnr: &VirtualNetworkRequest, virtual_order: &[VirtualNodeId], order: &[SubstrateNodeId]) -> Result<(), RejectionReason> {
    for virtual_node in virtual_order.iter().copied() {
        let demand = vnr.cpu_demand(virtual_node);
        let Some(node) = order.iter().copied().find(|node| view.can_host(*node, demand)) else {
            return Err(RejectionReason::InsufficientNodeCapacity);
        };
        view.place_node(virtual_node, node, demand);
    }
    Ok(())
}

/// Greedy node placement plus single shortest path routing on a fresh overlay.
pub fn embed_greedy(substrate: &SubstrateNetwork, vnr: &VirtualNetworkRequest) -> EmbedResult {
    let mut view = ResidualView::new(substrate, vnr.id);
    place_nodes_greedy(&mut view, vnr)?;
    route_links_shortest(&mut view, vnr, None)?;
    Ok(view.into_embedding())
}

fn mapped_ends(view: &ResidualView<'_>, link: &VirtualLink) -> Result<(SubstrateNodeId, SubstrateNodeId), RejectionReason> {
    match (view.mapped(link.source), view.mapped(link.target)) {
        (Some(source), Some(target)) => Ok((source, target)),
        _ => Err(RejectionReason::NoFeasibleNodeMapping),
    }
}

/// Routes every virtual link (id order) over its single shortest path.
///
/// With `allowed` set, the path is first searched among those links only; when that
/// yields nothing usable the whole substrate is searched again.
pub fn route_links_shortest(view: &mut ResidualView<'_>, vnr: &VirtualNetworkRequest, allowed: Option<&HashSet<SubstrateLinkId>>) -> Result<(), RejectionReason> {
    for link in vnr.links() {
        let (source, target) = mapped_ends(view, link)?;

        let restricted = allowed
            .and_then(|allowed| view.shortest_path(source, target, |link_id| allowed.contains(&link_id)))
            .filter(|path| view.path_fits(path, link.bandwidth_demand));
        let path = match restricted {
            Some(path) => path,
            None => view.shortest_path(source, target, |_| true).ok_or(RejectionReason::NoPath)?,
        };

        if !view.route_link(link.id, path, link.bandwidth_demand) {
            log::debug!("VNR {}: shortest path {} => {} too thin for {} bandwidth.", vnr.id, source, target, link.bandwidth_demand);
            return Err(RejectionReason::InsufficientBandwidth);
        }
    }
    Ok(())
}

/// Routes every virtual link over the first of at most `k` shortest simple paths that
/// still has enough residual bandwidth.
pub fn route_links_k_shortest(view: &mut ResidualView<'_>, vnr: &VirtualNetworkRequest, k: usize) -> Result<(), RejectionReason> {
    for link in vnr.links() {
        let (source, target) = mapped_ends(view, link)?;

        let paths: Vec<SubstratePath> = view.substrate().k_shortest_paths(source, target, k).map_err(|_| RejectionReason::NoPath)?;
        let Some(path) = paths.into_iter().find(|path| view.path_fits(path, link.bandwidth_demand)) else {
            log::debug!("VNR {}: none of {} candidate paths {} => {} carries {} bandwidth.", vnr.id, k, source, target, link.bandwidth_demand);
            return Err(RejectionReason::NoPath);
        };
        view.route_link(link.id, path, link.bandwidth_demand);
    }
    Ok(())
}
