pub mod path;
pub mod path_search;
pub mod resource_error;
pub mod resource_trait;
pub mod substrate_link;
pub mod substrate_network;
pub mod substrate_node;
pub mod topology;
