//! Wire models for the attendance and device backend

pub mod models;
