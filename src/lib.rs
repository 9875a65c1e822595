pub mod catalog;
pub mod db;
pub mod error;
pub mod quiz;
pub mod server;
pub mod settings;
pub mod telemetry;
pub mod transfer;
