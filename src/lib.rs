pub mod config;
pub mod console;
pub mod data_aquisition;
pub mod network;
pub mod topology;
