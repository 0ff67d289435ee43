//! smallsh entry point.
//!
//! Launch the interpreter:
//! ```bash
//! cargo run -p smallsh-repl
//! ```

use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> Result<()> {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    smallsh_repl::run()
}
