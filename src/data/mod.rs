pub mod filter;
pub mod intensity;
pub mod point;
pub mod validation;
