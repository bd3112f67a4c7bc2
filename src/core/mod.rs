pub mod clock;
pub mod config;
pub mod constants;
pub mod controller;
pub mod geo;
pub mod view_state;
pub mod viewport;
