//! Logging utilities for proxy-probe
//!
//! Re-exports tracing macros with log_* naming. The library never installs a
//! subscriber; binaries and tests decide where the output goes.

pub use tracing::{debug as log_debug, error as log_error, info as log_info, warn as log_warn};
