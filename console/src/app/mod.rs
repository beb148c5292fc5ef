//! Application wiring and lifecycle

pub mod login;
pub mod options;
pub mod run;
pub mod state;
