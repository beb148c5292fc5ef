//! Wire models for the local operator API

pub mod models;
