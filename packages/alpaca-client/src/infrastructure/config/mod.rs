//! Configuration Module
//!
//! Client settings, loaded from the environment or built in code.

mod settings;

pub use settings::{ClientConfig, ConfigError, Endpoints, Environment};
