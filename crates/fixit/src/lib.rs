//! Core library for the Fix-It-Now maintenance service: the ticket
//! lifecycle and authorization engine plus the configuration and telemetry
//! plumbing shared with the API binary.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod tickets;
