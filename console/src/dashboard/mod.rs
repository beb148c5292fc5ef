//! Dashboard refresh loop and view model

pub mod poller;
pub mod snapshot;

pub use poller::{DashboardFeed, DashboardPoller};
pub use snapshot::DashboardSnapshot;
