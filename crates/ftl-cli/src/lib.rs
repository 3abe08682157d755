//! ftl library - command implementations behind the `ftl` binary
//!
//! Exposed as a library so the commands can be exercised in tests.

pub mod commands;
pub mod common;
pub mod errors;
pub mod input;

pub use common::GlobalOpts;
pub use errors::CliError;
pub use ftl_logger as logger;

use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive
pub const LOG_ENV: &str = "FTL_LOG";

/// Install the `tracing` subscriber for library events.
///
/// `FTL_LOG` (then `RUST_LOG`) overrides the level derived from
/// `-q`/`-v`; `FTL_LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing(opts: &GlobalOpts) {
    let default = if opts.quiet {
        "error"
    } else {
        logger::verbosity_to_filter()
    };
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let json = std::env::var("FTL_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let result = if json {
        builder.json().try_init()
    } else {
        builder.compact().without_time().try_init()
    };
    if let Err(e) = result {
        logger::debug(&format!("Tracing subscriber already set: {}", e));
    }
}
