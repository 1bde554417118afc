pub mod algorithm_trait;
pub mod algorithm_type;
pub mod node_rank;
pub mod placement;
pub mod rejection;
pub mod rw_bfs;
pub mod rw_max_match;
pub mod simple_greedy;
pub mod yu2008;
