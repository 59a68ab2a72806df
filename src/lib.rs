pub mod chat;
pub mod cli;
pub mod config;
pub mod crew;
pub mod doctor;
pub mod error;
pub mod generate;
pub mod present;
pub mod profiles;
pub mod provider;
pub mod server;
pub mod session;
pub mod telemetry;
pub mod theme;
