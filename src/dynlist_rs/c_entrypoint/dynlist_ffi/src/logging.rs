/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! A `tracing` subscriber reporting the diagnostics of `dynlist` to stderr.
//!
//! The output is filtered by the `RUST_LOG` environment variable, using the
//! [`EnvFilter`] directive syntax. Without it, only warnings and errors are shown.
//! Reallocations are reported at the `trace` level and raw list lifecycle events
//! at the `debug` level:
//!
//! ```text
//! RUST_LOG=dynlist=trace ./my_program
//! ```

use std::error::Error;
use std::io;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Initializes a global subscriber writing to stderr if one is not already set.
///
/// # Errors
///
/// Returns an Error if the initialization was unsuccessful, likely because
/// a global subscriber was already installed by another call to `try_init`.
pub fn try_init() -> Result<(), Box<dyn Error + Send + Sync + 'static>> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_file(true)
        .with_line_number(true)
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .try_init()
}
