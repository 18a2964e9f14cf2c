//! Binding registry, desired-state dispatch and reported-state publication.

use super::desired;
use super::reported::{self, ReportId, ReportOutcome, ReportTracker, ReportedStateClient};
#[cfg(feature = "async")]
use super::reported::AsyncReportedStateClient;
use super::{
    DeviceTwinBinding, Error, MAX_DEVICE_TWINS, MAX_PROPERTY_NAME_LEN, MAX_TWIN_PAYLOAD_LEN,
    TwinState, TwinType, TwinUpdate, TwinValue,
};
use crate::system::terminate::{ExitCode, fatal};
use heapless::Vec;

/// Storage owned by one binding.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Slot {
    /// Released by `close`.
    Released,
    /// Scalar storage.
    Owned(TwinState),
    /// Open string binding; values are borrowed per update.
    Transient,
}

/// Result of applying one inbound twin document.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Bindings whose desired value was accepted.
    pub applied: usize,
    /// Accepted values whose reported-state update was submitted.
    pub reported: usize,
}

/// The open set of device twin bindings and their local state.
///
/// Opened once at startup from a static binding list, driven by inbound twin
/// documents through [`dispatch`](Self::dispatch) and by local logic through
/// [`report_state`](Self::report_state), then closed at shutdown.
#[derive(Debug)]
pub struct DeviceTwinSet<'a> {
    bindings: &'a [DeviceTwinBinding],
    slots: Vec<Slot, MAX_DEVICE_TWINS>,
    reports: ReportTracker,
}

impl<'a> DeviceTwinSet<'a> {
    /// Open a binding set, allocating zeroed storage for every scalar binding.
    ///
    /// # Panics
    ///
    /// A misconfigured binding list is a programming error: an `Unknown`
    /// type, a duplicate or over-long property name, or more than
    /// [`MAX_DEVICE_TWINS`] bindings terminate the program. Use
    /// [`try_open`](Self::try_open) to handle these as errors.
    pub fn open(bindings: &'a [DeviceTwinBinding]) -> Self {
        match Self::try_open(bindings) {
            Ok(set) => set,
            Err(Error::UnknownType) => fatal(
                ExitCode::DeviceTwinConfiguration,
                "device twin missing type information; set .twin_type to \
                 TwinType::Bool, TwinType::Int, TwinType::Float or TwinType::String",
            ),
            Err(_) => fatal(
                ExitCode::DeviceTwinConfiguration,
                "invalid device twin binding list",
            ),
        }
    }

    /// Validate the binding list and open it.
    pub fn try_open(bindings: &'a [DeviceTwinBinding]) -> Result<Self, Error> {
        if bindings.len() > MAX_DEVICE_TWINS {
            error!(
                "{} device twins declared, at most {} supported",
                bindings.len(),
                MAX_DEVICE_TWINS
            );
            return Err(Error::TooManyBindings);
        }

        for (index, binding) in bindings.iter().enumerate() {
            if binding.twin_type == TwinType::Unknown {
                error!("device twin '{}' missing type information", binding.property);
                return Err(Error::UnknownType);
            }
            if binding.property.len() > MAX_PROPERTY_NAME_LEN {
                error!("device twin '{}' name too long", binding.property);
                return Err(Error::PropertyNameTooLong);
            }
            if bindings[..index]
                .iter()
                .any(|other| other.property == binding.property)
            {
                error!("device twin '{}' declared twice", binding.property);
                return Err(Error::DuplicateProperty);
            }
        }

        let mut slots = Vec::new();
        for binding in bindings {
            let slot = match binding.twin_type.initial_state() {
                Some(state) => Slot::Owned(state),
                None => Slot::Transient,
            };
            // Capacity checked above.
            let _ = slots.push(slot);
            debug!("opened device twin '{}'", binding.property);
        }

        Ok(Self {
            bindings,
            slots,
            reports: ReportTracker::new(),
        })
    }

    /// Release the storage of every binding. Calling it again is a no-op.
    pub fn close(&mut self) {
        for (binding, slot) in self.bindings.iter().zip(self.slots.iter_mut()) {
            if *slot != Slot::Released {
                *slot = Slot::Released;
                debug!("closed device twin '{}'", binding.property);
            }
        }
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether the set has no bindings.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// The binding declarations, in registration order.
    pub fn bindings(&self) -> &'a [DeviceTwinBinding] {
        self.bindings
    }

    /// Whether the binding for `property` exists and has not been closed.
    pub fn is_open(&self, property: &str) -> bool {
        self.index_of(property)
            .is_some_and(|index| self.slots[index] != Slot::Released)
    }

    /// Current local value of a scalar binding.
    pub fn value(&self, property: &str) -> Result<TwinState, Error> {
        let index = self.index_of(property).ok_or(Error::PropertyNotFound)?;
        match self.slots[index] {
            Slot::Owned(state) => Ok(state),
            Slot::Transient => Err(Error::NoLocalValue),
            Slot::Released => Err(Error::NotOpen),
        }
    }

    /// Write a binding's local value without publishing it.
    pub fn set(&mut self, property: &str, value: TwinValue<'_>) -> Result<(), Error> {
        let index = self.index_of(property).ok_or(Error::PropertyNotFound)?;
        self.store(index, &value)
    }

    /// Apply an inbound twin document.
    ///
    /// `payload` is either a desired-properties patch or a complete twin
    /// document with a top-level `desired` object. For every binding, in
    /// registration order, whose property holds a `value` of the declared
    /// JSON type, the value is stored, the change handler is called and the
    /// new state is reported through `client`.
    ///
    /// Oversized or malformed documents are dropped, type-mismatched
    /// properties are skipped; neither is reported as an error.
    pub fn dispatch<C: ReportedStateClient>(
        &mut self,
        payload: &[u8],
        client: &mut C,
    ) -> DispatchSummary {
        let mut summary = DispatchSummary::default();

        let mut document: Vec<u8, MAX_TWIN_PAYLOAD_LEN> = Vec::new();
        if document.extend_from_slice(payload).is_err() {
            warn!(
                "twin document of {} bytes exceeds {} byte buffer, dropped",
                payload.len(),
                MAX_TWIN_PAYLOAD_LEN
            );
            return summary;
        }

        let parsed = match desired::parse(&document, self.bindings) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("malformed twin document dropped: {:?}", e);
                return summary;
            }
        };
        let properties = parsed.desired_properties();
        trace!(
            "twin document: desired section {}, {} bound properties",
            parsed.has_desired_section(),
            properties.len()
        );

        let bindings = self.bindings;
        for (index, binding) in bindings.iter().enumerate() {
            let Some(json) = properties.get(binding.property) else {
                continue;
            };
            let value = match self.apply(index, json) {
                Ok(value) => value,
                Err(Error::NotOpen) => {
                    debug!("device twin '{}' is closed, skipped", binding.property);
                    continue;
                }
                Err(_) => {
                    debug!(
                        "desired value for '{}' is not a {:?}, skipped",
                        binding.property, binding.twin_type
                    );
                    continue;
                }
            };
            summary.applied += 1;

            if let Some(handler) = binding.handler {
                handler(&TwinUpdate {
                    property: binding.property,
                    value,
                });
            }

            if let Ok(id) = reported::submit(client, binding.property, &value) {
                self.reports.track(id);
                summary.reported += 1;
            }
        }

        summary
    }

    /// Publish the current local value of a scalar binding.
    pub fn report<C: ReportedStateClient>(
        &mut self,
        client: &mut C,
        property: &str,
    ) -> Result<ReportId, Error> {
        let index = self.index_of(property).ok_or(Error::PropertyNotFound)?;
        let state = match self.slots[index] {
            Slot::Owned(state) => state,
            Slot::Transient => return Err(Error::NoLocalValue),
            Slot::Released => return Err(Error::NotOpen),
        };
        let id = reported::submit(client, self.bindings[index].property, &state.into())?;
        self.reports.track(id);
        Ok(id)
    }

    /// Store a locally originated value and publish it.
    ///
    /// The value must match the binding's declared type. Nothing is stored
    /// when the client is not connected. String values are published but
    /// not retained.
    pub fn report_state<C: ReportedStateClient>(
        &mut self,
        client: &mut C,
        property: &str,
        value: TwinValue<'_>,
    ) -> Result<ReportId, Error> {
        let index = self.index_of(property).ok_or(Error::PropertyNotFound)?;
        let property = self.bindings[index].property;
        self.check(index, &value)?;
        reported::ensure_connected(client, property)?;
        self.store(index, &value)?;
        let id = reported::send(client, property, &value)?;
        self.reports.track(id);
        Ok(id)
    }

    /// Store a locally originated value, publish it and wait for the
    /// service to confirm it.
    #[cfg(feature = "async")]
    pub async fn report_state_async<C: AsyncReportedStateClient>(
        &mut self,
        client: &mut C,
        property: &str,
        value: TwinValue<'_>,
    ) -> Result<ReportOutcome, Error> {
        let index = self.index_of(property).ok_or(Error::PropertyNotFound)?;
        let property = self.bindings[index].property;
        self.check(index, &value)?;
        reported::ensure_connected_async(client, property).await?;
        self.store(index, &value)?;
        reported::send_async(client, property, &value).await
    }

    /// Record the completion status of a submitted report.
    ///
    /// Called by the cloud client owner from its completion callback.
    pub fn report_completed(&mut self, id: ReportId, status: u16) -> ReportOutcome {
        info!(
            "device twin reported properties update result: HTTP status code {}",
            status
        );
        self.reports.complete(id, status)
    }

    /// Outcome of a previously submitted report.
    pub fn report_outcome(&self, id: ReportId) -> ReportOutcome {
        self.reports.outcome(id)
    }

    /// Submitted reports and their outcomes.
    pub fn reports(&self) -> &ReportTracker {
        &self.reports
    }

    fn index_of(&self, property: &str) -> Option<usize> {
        self.bindings
            .iter()
            .position(|binding| binding.property == property)
    }

    /// Coerce a desired JSON value into the binding's type and store it.
    fn apply<'de>(
        &mut self,
        index: usize,
        json: desired::JsonScalar<'de>,
    ) -> Result<TwinValue<'de>, Error> {
        let value = match (self.bindings[index].twin_type, json) {
            (TwinType::Int, desired::JsonScalar::Number(n)) => TwinValue::Int(n as i32),
            (TwinType::Float, desired::JsonScalar::Number(n)) => TwinValue::Float(n as f32),
            (TwinType::Bool, desired::JsonScalar::Bool(b)) => TwinValue::Bool(b),
            (TwinType::String, desired::JsonScalar::Str(s)) => TwinValue::Str(s),
            _ => return Err(Error::TypeMismatch),
        };
        self.store(index, &value)?;
        Ok(value)
    }

    /// Whether `value` could be stored in binding `index`.
    fn check(&self, index: usize, value: &TwinValue<'_>) -> Result<(), Error> {
        if self.slots[index] == Slot::Released {
            return Err(Error::NotOpen);
        }
        if value.twin_type() != self.bindings[index].twin_type {
            return Err(Error::TypeMismatch);
        }
        Ok(())
    }

    fn store(&mut self, index: usize, value: &TwinValue<'_>) -> Result<(), Error> {
        self.check(index, value)?;
        match (&mut self.slots[index], value.to_state()) {
            (Slot::Released, _) => Err(Error::NotOpen),
            (Slot::Owned(current), Some(state)) => {
                *current = state;
                Ok(())
            }
            (Slot::Transient, None) => Ok(()),
            _ => Err(Error::TypeMismatch),
        }
    }
}
