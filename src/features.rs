//! Feature modules - configuration separated from the controller

pub mod settings;

pub use settings::Settings;
