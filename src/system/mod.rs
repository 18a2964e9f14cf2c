//! System utilities for device applications.
//!
//! # Available Utilities
//!
//! - **[`terminate`]**: exit-code table, termination latch for the main loop
//!   and the fatal-error path used for configuration mistakes
//!
//! # Usage
//!
//! ```rust,no_run
//! use libtwin::system::terminate::{ExitCode, Termination};
//!
//! let mut termination = Termination::new();
//!
//! while !termination.is_required() {
//!     // dispatch timer and cloud events; a failing handler calls
//!     termination.request(ExitCode::ConsumeEventLoopTimeEvent);
//! }
//!
//! std::process::exit(u8::from(termination.exit_code()) as i32);
//! ```

/// Exit codes, termination requests and fatal errors.
pub mod terminate;
