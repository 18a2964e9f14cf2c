//! Logging facade.
//!
//! Forwards to `defmt` on embedded targets and to `log` on hosts. With
//! neither feature enabled the macros only type-check their arguments.
//! Declared before every other module so the macros are in textual scope
//! crate-wide.

macro_rules! __log {
    ($level:ident, $($arg:tt)+) => {{
        #[cfg(feature = "defmt")]
        defmt::$level!($($arg)+);
        #[cfg(feature = "log")]
        ::log::$level!($($arg)+);
        #[cfg(not(any(feature = "defmt", feature = "log")))]
        if false {
            let _ = core::format_args!($($arg)+);
        }
    }};
}

macro_rules! trace {
    ($($arg:tt)+) => { __log!(trace, $($arg)+) };
}

macro_rules! debug {
    ($($arg:tt)+) => { __log!(debug, $($arg)+) };
}

macro_rules! info {
    ($($arg:tt)+) => { __log!(info, $($arg)+) };
}

macro_rules! warn {
    ($($arg:tt)+) => { __log!(warn, $($arg)+) };
}

macro_rules! error {
    ($($arg:tt)+) => { __log!(error, $($arg)+) };
}
