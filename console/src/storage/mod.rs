//! Local storage: settings and layout

pub mod layout;
pub mod settings;
