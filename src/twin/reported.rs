//! Reported-state formatting, submission and completion tracking.
//!
//! A reported-state update is a single-property JSON fragment:
//!
//! ```text
//! {"LedBrightness":42}
//! {"Setpoint":21.500000}
//! {"Heating":true}
//! {"DisplayText":"hello"}
//! ```
//!
//! Floats use six fixed decimals. String values are written verbatim between
//! quotes; embedded quotes or control characters are **not** escaped, so
//! callers must not report strings containing them.

#![allow(async_fn_in_trait)]

use super::{DEVICE_TWIN_REPORT_LEN, Error, MAX_PENDING_REPORTS, TwinValue};
use core::fmt::Write as _;
use heapless::{Deque, String};

/// Identifier assigned by the cloud client to a submitted report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReportId(pub u32);

/// Connection to the cloud service that accepts reported-state updates.
///
/// Submission is asynchronous: `send_reported_state` returns as soon as the
/// request is queued. The client owner forwards the completion status to
/// [`DeviceTwinSet::report_completed`](super::DeviceTwinSet::report_completed).
pub trait ReportedStateClient {
    /// Client-specific submission error.
    type Error: core::fmt::Debug;

    /// Whether the client is connected, attempting to connect if it is not.
    fn is_connected(&mut self) -> bool;

    /// Queue a reported-state fragment for upload.
    fn send_reported_state(&mut self, report: &[u8]) -> Result<ReportId, Self::Error>;
}

/// Cloud client whose submission resolves once the service has answered.
#[cfg(feature = "async")]
pub trait AsyncReportedStateClient {
    /// Client-specific submission error.
    type Error: core::fmt::Debug;

    /// Whether the client is connected, attempting to connect if it is not.
    async fn is_connected(&mut self) -> bool;

    /// Upload a reported-state fragment and return the service status code.
    async fn send_reported_state(&mut self, report: &[u8]) -> Result<u16, Self::Error>;
}

/// Completion state of a submitted report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReportOutcome {
    /// Submitted, no completion received yet.
    Pending,
    /// The service answered with a 2xx status.
    Accepted(u16),
    /// The service answered with a non-2xx status.
    Rejected(u16),
    /// The id was never tracked or has been evicted.
    Unknown,
}

impl ReportOutcome {
    /// Classify a service status code.
    pub fn from_status(status: u16) -> Self {
        if (200..300).contains(&status) {
            ReportOutcome::Accepted(status)
        } else {
            ReportOutcome::Rejected(status)
        }
    }
}

/// Remembers the outcome of the most recent submitted reports.
///
/// Holds at most [`MAX_PENDING_REPORTS`] entries; tracking a new id when
/// full forgets the oldest one.
#[derive(Debug)]
pub struct ReportTracker {
    entries: Deque<(ReportId, ReportOutcome), MAX_PENDING_REPORTS>,
}

impl ReportTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self {
            entries: Deque::new(),
        }
    }

    /// Start tracking a freshly submitted report.
    pub fn track(&mut self, id: ReportId) {
        if let Some(entry) = self.entries.iter_mut().find(|(tracked, _)| *tracked == id) {
            entry.1 = ReportOutcome::Pending;
            return;
        }
        if self.entries.is_full() {
            if let Some((evicted, _)) = self.entries.pop_front() {
                debug!("report {} evicted from tracker", evicted.0);
            }
        }
        // Cannot fail: a slot was freed above.
        let _ = self.entries.push_back((id, ReportOutcome::Pending));
    }

    /// Record the service status for a report and return its outcome.
    pub fn complete(&mut self, id: ReportId, status: u16) -> ReportOutcome {
        let outcome = ReportOutcome::from_status(status);
        match self.entries.iter_mut().find(|(tracked, _)| *tracked == id) {
            Some(entry) => entry.1 = outcome,
            None => debug!("completion for untracked report {}", id.0),
        }
        outcome
    }

    /// Outcome of a report, [`ReportOutcome::Unknown`] if not tracked.
    pub fn outcome(&self, id: ReportId) -> ReportOutcome {
        self.entries
            .iter()
            .find(|(tracked, _)| *tracked == id)
            .map(|(_, outcome)| *outcome)
            .unwrap_or(ReportOutcome::Unknown)
    }

    /// Number of tracked reports.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no report is tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ReportTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Format the reported-state fragment `{"<property>":<value>}`.
pub fn format_reported_state(
    property: &str,
    value: &TwinValue<'_>,
) -> Result<String<DEVICE_TWIN_REPORT_LEN>, Error> {
    let mut report = String::new();
    let written = match *value {
        TwinValue::Int(v) => write!(report, "{{\"{}\":{}}}", property, v),
        TwinValue::Float(v) => write!(report, "{{\"{}\":{:.6}}}", property, v),
        TwinValue::Bool(v) => write!(report, "{{\"{}\":{}}}", property, v),
        TwinValue::Str(v) => write!(report, "{{\"{}\":\"{}\"}}", property, v),
    };
    written.map_err(|_| Error::ReportOverflow)?;

    if report.is_empty() {
        return Err(Error::EmptyReport);
    }
    Ok(report)
}

/// Check connectivity, format and submit one property.
pub(crate) fn submit<C: ReportedStateClient>(
    client: &mut C,
    property: &str,
    value: &TwinValue<'_>,
) -> Result<ReportId, Error> {
    ensure_connected(client, property)?;
    send(client, property, value)
}

pub(crate) fn ensure_connected<C: ReportedStateClient>(
    client: &mut C,
    property: &str,
) -> Result<(), Error> {
    if !client.is_connected() {
        warn!("not connected, reported state for '{}' skipped", property);
        return Err(Error::NotConnected);
    }
    Ok(())
}

/// Format and submit one property without checking connectivity.
pub(crate) fn send<C: ReportedStateClient>(
    client: &mut C,
    property: &str,
    value: &TwinValue<'_>,
) -> Result<ReportId, Error> {
    let report = format_reported_state(property, value)?;
    match client.send_reported_state(report.as_bytes()) {
        Ok(id) => {
            info!("reported state updated '{}'", report.as_str());
            Ok(id)
        }
        Err(_) => {
            error!("failed to set reported state for '{}'", report.as_str());
            Err(Error::SendFailed)
        }
    }
}

#[cfg(feature = "async")]
pub(crate) async fn ensure_connected_async<C: AsyncReportedStateClient>(
    client: &mut C,
    property: &str,
) -> Result<(), Error> {
    if !client.is_connected().await {
        warn!("not connected, reported state for '{}' skipped", property);
        return Err(Error::NotConnected);
    }
    Ok(())
}

#[cfg(feature = "async")]
pub(crate) async fn send_async<C: AsyncReportedStateClient>(
    client: &mut C,
    property: &str,
    value: &TwinValue<'_>,
) -> Result<ReportOutcome, Error> {
    let report = format_reported_state(property, value)?;
    match client.send_reported_state(report.as_bytes()).await {
        Ok(status) => {
            info!(
                "reported state '{}' completed with status {}",
                report.as_str(),
                status
            );
            Ok(ReportOutcome::from_status(status))
        }
        Err(_) => {
            error!("failed to set reported state for '{}'", report.as_str());
            Err(Error::SendFailed)
        }
    }
}
