/// Log a formatted message at `level`, recording file, line, column and
/// module path.
///
/// The format arguments are only evaluated when the level passes the gate.
#[macro_export]
macro_rules! log_at {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log_at(
            $level,
            false,
            $crate::log::CallSite::new(file!(), line!(), column!(), Some(module_path!())),
            || ::std::format!($($arg)+),
        )
    };
}

#[macro_export]
macro_rules! log_trace {
    ($logger:expr, $($arg:tt)+) => { $crate::log_at!($logger, $crate::log::Level::Trace, $($arg)+) };
}

#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)+) => { $crate::log_at!($logger, $crate::log::Level::Debug, $($arg)+) };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)+) => { $crate::log_at!($logger, $crate::log::Level::Info, $($arg)+) };
}

#[macro_export]
macro_rules! log_notice {
    ($logger:expr, $($arg:tt)+) => { $crate::log_at!($logger, $crate::log::Level::Notice, $($arg)+) };
}

#[macro_export]
macro_rules! log_warning {
    ($logger:expr, $($arg:tt)+) => { $crate::log_at!($logger, $crate::log::Level::Warning, $($arg)+) };
}

#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)+) => { $crate::log_at!($logger, $crate::log::Level::Error, $($arg)+) };
}

#[macro_export]
macro_rules! log_critical {
    ($logger:expr, $($arg:tt)+) => { $crate::log_at!($logger, $crate::log::Level::Critical, $($arg)+) };
}

/// Log at `Level::Critical` with the assertion flag set.
#[macro_export]
macro_rules! log_fault {
    ($logger:expr, $($arg:tt)+) => {
        $logger.log_at(
            $crate::log::Level::Critical,
            true,
            $crate::log::CallSite::new(file!(), line!(), column!(), Some(module_path!())),
            || ::std::format!($($arg)+),
        )
    };
}
