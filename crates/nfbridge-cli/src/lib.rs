//! nfbridge host library - expose modules for the binary and tests
//!
//! The binary plays the part of the host runtime: it fires the creation
//! lifecycle event that hands control to the native driver module.

pub mod commands;
pub mod common;

pub use common::GlobalOpts;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the tracing subscriber for bridge events (`RUST_LOG` overrides)
///
/// `quiet` turns bridge events off unless `RUST_LOG` asks for them.
pub fn init_tracing(quiet: bool) {
    let default_directive = if quiet { "nfbridge=off" } else { "nfbridge=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr),
        )
        .init();
}
