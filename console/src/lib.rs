//! Fingerdoor Library
//!
//! Core modules for the fingerprint door console: door lock control,
//! fingerprint enrollment, and the attendance dashboard.

pub mod app;
pub mod dashboard;
pub mod device;
pub mod door;
pub mod enroll;
pub mod errors;
pub mod filesys;
pub mod http;
pub mod logs;
pub mod server;
pub mod session;
pub mod storage;
pub mod utils;
