//! SprintForge CLI - baseline management from the terminal
//!
//! `sprintforge baselines list|show|create|delete|activate|compare|watch`
//! on top of the baseline view model and lifecycle controller.

pub mod cli;
pub mod commands;
pub mod output;
pub mod prompt;

pub use cli::{command, load_config};
pub use commands::App;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber
///
/// Filter from `RUST_LOG`, `info` when unset. Logs go to stderr so command
/// output on stdout stays clean.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
