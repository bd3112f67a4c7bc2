pub mod clustering;
pub mod index;
