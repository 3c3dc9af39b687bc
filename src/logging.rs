//! Logger setup: `env_logger` natively, the browser console on WASM.

use crate::config::LogLevel;

/// Install the global logger at the given level.
///
/// Safe to call more than once; later calls only adjust the level.
#[cfg(not(target_arch = "wasm32"))]
pub fn init(level: LogLevel) {
    let filter = level.to_level_filter();
    let result = env_logger::Builder::new()
        .filter_level(filter)
        .parse_default_env()
        .try_init();
    if result.is_err() {
        log::set_max_level(filter);
    }
}

/// Install the global logger at the given level.
///
/// Safe to call more than once; later calls only adjust the level.
#[cfg(target_arch = "wasm32")]
pub fn init(level: LogLevel) {
    let filter = level.to_level_filter();
    match filter.to_level() {
        Some(level) => {
            if console_log::init_with_level(level).is_err() {
                log::set_max_level(filter);
            }
        }
        None => log::set_max_level(filter),
    }
}
