pub mod commands;
pub mod config;
pub mod connection;
pub mod telemetry;
