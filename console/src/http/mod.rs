//! Backend HTTP client

pub mod backend;
pub mod client;
pub mod devices;
