//! # libtwin - device twin synchronization
//!
//! Keeps typed local state on an IoT device in step with the device twin a
//! cloud service maintains for it. This library is designed for embedded
//! systems and supports `no_std` environments; all buffers are fixed-capacity.
//!
//! ## Features
//!
//! ### Device twins
//! - Compile-time binding list of named, typed properties with change handlers
//! - Desired-state dispatch from patch or complete twin documents
//! - Reported-state publication through a pluggable cloud client
//! - Completion tracking of submitted reports
//!
//! ### Telemetry
//! - Numbered JSON messages for environment sensor readings
//!
//! ### System Utilities
//! - Exit-code table and termination latch for the application main loop
//!
//! ## Usage
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! libtwin = "0.1.0"
//! ```
//!
//! ### Device Twin Example
//!
//! ```rust,no_run
//! use libtwin::twin::{
//!     DeviceTwinBinding, DeviceTwinSet, ReportId, ReportedStateClient, TwinType, TwinValue,
//! };
//! # struct CloudClient;
//! # impl ReportedStateClient for CloudClient {
//! #     type Error = ();
//! #     fn is_connected(&mut self) -> bool { true }
//! #     fn send_reported_state(&mut self, _report: &[u8]) -> Result<ReportId, ()> { Ok(ReportId(1)) }
//! # }
//!
//! static TWINS: [DeviceTwinBinding; 2] = [
//!     DeviceTwinBinding::new("LedBrightness", TwinType::Int),
//!     DeviceTwinBinding::new("Heating", TwinType::Bool),
//! ];
//!
//! let mut client = CloudClient;
//! let mut twins = DeviceTwinSet::open(&TWINS);
//!
//! // cloud pushed a desired-properties patch
//! twins.dispatch(br#"{"LedBrightness":{"value":42},"$version":3}"#, &mut client);
//!
//! // local logic changed state
//! twins.report_state(&mut client, "Heating", TwinValue::Bool(true)).ok();
//!
//! twins.close();
//! ```
//!
//! ## Platform Support
//!
//! This library is designed to work on:
//! - Embedded microcontrollers (ARM Cortex-M, RISC-V, etc.)
//! - Linux-based IoT devices (Raspberry Pi, etc.)
//! - Any platform supporting Rust's `core` library
//!
//! ## Optional Features
//!
//! - `std`: Enable standard library support (default: disabled)
//! - `async`: Enable async reported-state submission
//! - `defmt`: Enable defmt logging support for embedded debugging
//! - `log`: Route logging through the `log` facade on hosted targets

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]
#![warn(missing_debug_implementations)]

#[cfg(test)]
extern crate std;

#[macro_use]
mod logging;

/// Device twin bindings, desired-state dispatch and reported-state publication.
pub mod twin;

/// System utilities for device applications.
///
/// Exit codes and termination handling shared by the twin registry and the
/// application main loop.
pub mod system;

/// Telemetry message building.
pub mod telemetry;
