pub mod embedding;
pub mod residual_view;
