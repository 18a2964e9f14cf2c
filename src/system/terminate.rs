//! Exit codes and termination requests.
//!
//! The application main loop runs until a handler requests termination;
//! the first requested [`ExitCode`] becomes the process exit status.
//!
//! ```rust
//! use libtwin::system::terminate::{ExitCode, Termination};
//!
//! let mut termination = Termination::new();
//! while !termination.is_required() {
//!     // run one event loop iteration
//!     termination.request(ExitCode::MainEventLoopFail);
//! }
//! assert_eq!(u8::from(termination.exit_code()), 2);
//! ```


/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ExitCode {
    /// Normal shutdown.
    Success = 0,
    /// SIGTERM received.
    TermHandlerSigTerm = 1,
    /// The event loop failed.
    MainEventLoopFail = 2,
    /// A timer event could not be consumed.
    ConsumeEventLoopTimeEvent = 3,
    /// No ID scope configured for cloud provisioning.
    MissingIdScope = 4,
    /// A device twin binding is misconfigured.
    DeviceTwinConfiguration = 5,
    /// Telemetry could not be built or sent.
    Telemetry = 6,
}

impl From<ExitCode> for u8 {
    fn from(code: ExitCode) -> Self {
        code as u8
    }
}

/// Termination latch for the application main loop.
#[derive(Debug, Default)]
pub struct Termination {
    code: Option<ExitCode>,
}

impl Termination {
    /// A latch with no termination requested.
    pub const fn new() -> Self {
        Self { code: None }
    }

    /// Request termination. Later requests do not override the first code.
    pub fn request(&mut self, code: ExitCode) {
        if self.code.is_none() {
            info!("termination requested, exit code {}", code as u8);
            self.code = Some(code);
        }
    }

    /// Whether termination has been requested.
    pub fn is_required(&self) -> bool {
        self.code.is_some()
    }

    /// The requested exit code, [`ExitCode::Success`] if none.
    pub fn exit_code(&self) -> ExitCode {
        self.code.unwrap_or(ExitCode::Success)
    }
}

/// Abort on an unrecoverable programming or configuration error.
pub fn fatal(code: ExitCode, reason: &str) -> ! {
    error!("fatal: {} (exit code {})", reason, code as u8);
    panic!("{} (exit code {})", reason, code as u8)
}
