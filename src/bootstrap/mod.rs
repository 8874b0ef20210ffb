//! Process bootstrap: flags, configuration, logging, wiring and the
//! top-level run loop.

pub mod cli;
pub mod config;
pub mod run;
pub mod tracing;
pub mod wiring;

pub use cli::Cli;
pub use config::{load_config, resolve_settings, Settings};
pub use run::run;
pub use self::tracing::init_tracing_subscriber;
