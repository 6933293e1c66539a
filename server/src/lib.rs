mod auth_session;
mod backend_client;
pub mod cli;
pub mod cli_error;
mod data_store;
pub mod export;
mod occupancy;
mod setup;
pub mod web;

pub use data_store::models::EventStatus;
pub use data_store::EventId;
