//! Logging macros gated by a module-level `ENABLE_LOGS` flag, for hot loops
//! that log every tick.
//!
//! Usage:
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//!
//! use crate::{log_debug, log_info};
//!
//! log_info!("tracking context {} started", id);
//! ```

/// Conditional `log::debug!`. The calling module must define `ENABLE_LOGS`.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!($($arg)*);
        }
    };
}

/// Conditional `log::info!`. The calling module must define `ENABLE_LOGS`.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

/// Conditional `log::warn!`. The calling module must define `ENABLE_LOGS`.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

/// Conditional `log::error!`. The calling module must define `ENABLE_LOGS`.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!($($arg)*);
        }
    };
}

/// Installs the `env_logger` backend. `RUST_LOG` overrides the Info default.
/// Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init();
}

#[cfg(test)]
mod tests {
    const ENABLE_LOGS: bool = true;

    #[test]
    fn gated_macros_expand_in_caller_scope() {
        super::init_logging();
        super::init_logging();

        crate::log_debug!("debug {}", 1);
        crate::log_info!("info {}", 2);
        crate::log_warn!("warn {}", 3);
        crate::log_error!("error {}", 4);
    }
}
