pub mod analysis;
pub mod charts;
pub mod config;
pub mod importers;
pub mod services;
pub mod stations;
pub mod utils;
