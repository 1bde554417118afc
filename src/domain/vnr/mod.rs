pub mod virtual_network_request;
pub mod vnr_generator;
