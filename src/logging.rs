use log::{info, LevelFilter};

pub const CLOCK_NAMESPACE: &str = "bitclock16::clock";
pub const UI_NAMESPACE: &str = "bitclock16::ui";
pub const HOST_NAMESPACE: &str = "bitclock16::host";
pub const COMMAND_NAMESPACE: &str = "bitclock16::command";

pub fn init_logging() {
    // RUST_LOG sets the level for dependencies (info if unset); our own
    // namespaces are always pinned to debug below
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .format_module_path(true)
        .format_target(true)
        .filter(Some(CLOCK_NAMESPACE), LevelFilter::Debug)
        .filter(Some(UI_NAMESPACE), LevelFilter::Debug)
        .filter(Some(HOST_NAMESPACE), LevelFilter::Debug)
        .filter(Some(COMMAND_NAMESPACE), LevelFilter::Debug)
        .init();

    info!("Logging initialized");
}

// Convenience macros for each namespace
#[macro_export]
macro_rules! clock_log {
    ($($arg:tt)*) => {
        log::log!(target: $crate::logging::CLOCK_NAMESPACE, $($arg)*)
    };
}

#[macro_export]
macro_rules! ui_log {
    ($($arg:tt)*) => {
        log::log!(target: $crate::logging::UI_NAMESPACE, $($arg)*)
    };
}

#[macro_export]
macro_rules! host_log {
    ($($arg:tt)*) => {
        log::log!(target: $crate::logging::HOST_NAMESPACE, $($arg)*)
    };
}

#[macro_export]
macro_rules! command_log {
    ($($arg:tt)*) => {
        log::log!(target: $crate::logging::COMMAND_NAMESPACE, $($arg)*)
    };
}
