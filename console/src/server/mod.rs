//! Local operator API

pub mod auth;
pub mod errors;
pub mod handlers;
pub mod serve;
pub mod state;
