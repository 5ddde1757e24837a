pub mod commands;
pub mod core;

use tracing_subscriber::EnvFilter;

pub use crate::commands::{realize, realize_with, RealizeRequest};
pub use crate::core::error::{RealizerError, RealizerResult};

/// Install the global `tracing` subscriber. `RUST_LOG` wins when set.
pub fn init_tracing(debug: bool) {
    let fallback = if debug {
        "info,mrpack_realizer=debug"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .init();
}
