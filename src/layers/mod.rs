pub mod base;
pub mod cluster;
pub mod heatmap;
pub mod manager;
pub mod renderer;
