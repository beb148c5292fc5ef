//! Fingerprint enrollment

pub mod board;
pub mod poller;
pub mod session;

pub use poller::EnrollmentPoller;
pub use session::{EnrollmentSession, EnrollmentStatus};
