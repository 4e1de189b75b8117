//! Format-string logging macros
//!
//! `infof!(logger, "took {}ms", elapsed)` expands to
//! `logger.infof(format_args!("took {}ms", elapsed))`, so nothing is
//! formatted when the level is disabled.

/// Log a formatted message at debug level
#[macro_export]
macro_rules! debugf {
    ($logger:expr, $($arg:tt)+) => {
        $logger.debugf(::std::format_args!($($arg)+))
    };
}

/// Log a formatted message at info level
#[macro_export]
macro_rules! infof {
    ($logger:expr, $($arg:tt)+) => {
        $logger.infof(::std::format_args!($($arg)+))
    };
}

/// Log a formatted message at warn level
#[macro_export]
macro_rules! warnf {
    ($logger:expr, $($arg:tt)+) => {
        $logger.warnf(::std::format_args!($($arg)+))
    };
}

/// Log a formatted message at error level
#[macro_export]
macro_rules! errorf {
    ($logger:expr, $($arg:tt)+) => {
        $logger.errorf(::std::format_args!($($arg)+))
    };
}

/// Log a formatted message at dpanic level
#[macro_export]
macro_rules! dpanicf {
    ($logger:expr, $($arg:tt)+) => {
        $logger.dpanicf(::std::format_args!($($arg)+))
    };
}

/// Log a formatted message at panic level
#[macro_export]
macro_rules! panicf {
    ($logger:expr, $($arg:tt)+) => {
        $logger.panicf(::std::format_args!($($arg)+))
    };
}

/// Log a formatted message at fatal level
#[macro_export]
macro_rules! fatalf {
    ($logger:expr, $($arg:tt)+) => {
        $logger.fatalf(::std::format_args!($($arg)+))
    };
}
