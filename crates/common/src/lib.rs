pub mod config;
pub mod language;

#[cfg(feature = "logging")]
pub mod logging;

#[cfg(feature = "github")]
pub mod github;
