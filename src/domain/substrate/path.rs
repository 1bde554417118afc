use serde::Serialize;

use crate::domain::utils::id::{SubstrateLinkId, SubstrateNodeId};

/// A simple path through the substrate, stored both as visited nodes and traversed links.
///
/// `nodes.len() == links.len() + 1` for every path produced by the path search.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SubstratePath {
    pub nodes: Vec<SubstrateNodeId>,
    pub links: Vec<SubstrateLinkId>,
}

impl SubstratePath {
    pub fn new(nodes: Vec<SubstrateNodeId>, links: Vec<SubstrateLinkId>) -> Self {
        Self { nodes, links }
    }

    pub fn hop_count(&self) -> usize {
        self.links.len()
    }

    pub fn source(&self) -> Option<SubstrateNodeId> {
        self.nodes.first().copied()
    }

    pub fn target(&self) -> Option<SubstrateNodeId> {
        self.nodes.last().copied()
    }

    /// Joins `self` (ending at the spur node) with `tail` (starting at it).
    pub(crate) fn concat(&self, tail: &SubstratePath) -> SubstratePath {
        let mut nodes = self.nodes.clone();
        let mut links = self.links.clone();
        nodes.extend(tail.nodes.iter().skip(1).copied());
        links.extend(tail.links.iter().copied());
        SubstratePath { nodes, links }
    }
}
