//! Device twin synchronization.
//!
//! A device twin is the JSON document a cloud service keeps for each device.
//! Its `desired` section carries property values requested by the cloud,
//! its `reported` section the values last confirmed by the device. This
//! module binds named twin properties to typed local state:
//!
//! - **Registry** ([`DeviceTwinSet`]): owns the storage for a fixed,
//!   compile-time list of [`DeviceTwinBinding`]s.
//! - **Desired-state dispatch** ([`DeviceTwinSet::dispatch`]): applies an
//!   inbound twin document to the bindings, calls their change handlers and
//!   acknowledges every accepted value with a reported-state update.
//! - **Reported-state publication** ([`DeviceTwinSet::report_state`]):
//!   formats `{"<property>":<value>}` and submits it through a
//!   [`ReportedStateClient`].
//!
//! # Declaring bindings
//!
//! ```rust
//! use libtwin::twin::{DeviceTwinBinding, DeviceTwinSet, TwinType, TwinUpdate, TwinValue};
//!
//! fn led_brightness_changed(update: &TwinUpdate) {
//!     if let TwinValue::Int(level) = update.value {
//!         // drive the PWM channel
//!         let _ = level;
//!     }
//! }
//!
//! static TWINS: [DeviceTwinBinding; 2] = [
//!     DeviceTwinBinding::new("LedBrightness", TwinType::Int).with_handler(led_brightness_changed),
//!     DeviceTwinBinding::new("DisplayText", TwinType::String),
//! ];
//!
//! let mut twins = DeviceTwinSet::open(&TWINS);
//! assert_eq!(twins.len(), 2);
//! twins.close();
//! ```
//!
//! # Inbound document shape
//!
//! Both a desired-properties patch and a complete twin document are accepted:
//!
//! ```text
//! {"desired":{"LedBrightness":{"value":42},"$version":7},"reported":{...}}
//! {"LedBrightness":{"value":42},"$version":7}
//! ```
//!
//! Property names may be dotted (`"Thermostat.Target"`) to address nested
//! objects.

#![deny(unsafe_code)]

mod desired;
pub mod error;
pub mod reported;
mod set;


pub use error::Error;
#[cfg(feature = "async")]
pub use reported::AsyncReportedStateClient;
pub use reported::{ReportId, ReportOutcome, ReportTracker, ReportedStateClient};
pub use set::{DeviceTwinSet, DispatchSummary};

/// Maximum number of bindings in one [`DeviceTwinSet`].
pub const MAX_DEVICE_TWINS: usize = 16;
/// Maximum length of a (possibly dotted) property name.
pub const MAX_PROPERTY_NAME_LEN: usize = 64;
/// Capacity of a formatted reported-state fragment.
pub const DEVICE_TWIN_REPORT_LEN: usize = 256;
/// Capacity of the private copy made of each inbound twin document.
pub const MAX_TWIN_PAYLOAD_LEN: usize = 2048;
/// Number of submitted reports whose completion is remembered.
pub const MAX_PENDING_REPORTS: usize = 8;

/// Declared scalar type of a twin property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TwinType {
    /// Not configured. Rejected when the set is opened.
    Unknown,
    /// 32-bit signed integer, carried as a JSON number.
    Int,
    /// 32-bit float, carried as a JSON number.
    Float,
    /// JSON boolean.
    Bool,
    /// JSON string. Never owned by the binding.
    String,
}

impl TwinType {
    /// Zero-initialized storage for this type, or `None` for types that own
    /// no storage.
    pub(crate) fn initial_state(self) -> Option<TwinState> {
        match self {
            TwinType::Int => Some(TwinState::Int(0)),
            TwinType::Float => Some(TwinState::Float(0.0)),
            TwinType::Bool => Some(TwinState::Bool(false)),
            TwinType::String | TwinType::Unknown => None,
        }
    }
}

/// Value held in a binding's own storage.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TwinState {
    /// Integer state.
    Int(i32),
    /// Float state.
    Float(f32),
    /// Boolean state.
    Bool(bool),
}

impl TwinState {
    /// The type tag of this state.
    pub fn twin_type(&self) -> TwinType {
        match self {
            TwinState::Int(_) => TwinType::Int,
            TwinState::Float(_) => TwinType::Float,
            TwinState::Bool(_) => TwinType::Bool,
        }
    }
}

/// A property value, either owned scalar state or a string borrowed from
/// the document or caller that supplied it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TwinValue<'a> {
    /// Integer value.
    Int(i32),
    /// Float value.
    Float(f32),
    /// Boolean value.
    Bool(bool),
    /// String value, exactly as it appeared in the JSON source (escape
    /// sequences are not decoded).
    Str(&'a str),
}

impl<'a> TwinValue<'a> {
    /// The type tag of this value.
    pub fn twin_type(&self) -> TwinType {
        match self {
            TwinValue::Int(_) => TwinType::Int,
            TwinValue::Float(_) => TwinType::Float,
            TwinValue::Bool(_) => TwinType::Bool,
            TwinValue::Str(_) => TwinType::String,
        }
    }

    /// Owned storage form, `None` for strings.
    pub fn to_state(&self) -> Option<TwinState> {
        match *self {
            TwinValue::Int(v) => Some(TwinState::Int(v)),
            TwinValue::Float(v) => Some(TwinState::Float(v)),
            TwinValue::Bool(v) => Some(TwinState::Bool(v)),
            TwinValue::Str(_) => None,
        }
    }
}

impl From<TwinState> for TwinValue<'_> {
    fn from(state: TwinState) -> Self {
        match state {
            TwinState::Int(v) => TwinValue::Int(v),
            TwinState::Float(v) => TwinValue::Float(v),
            TwinState::Bool(v) => TwinValue::Bool(v),
        }
    }
}

/// Passed to a binding's change handler after a desired value is applied.
///
/// String values borrow the inbound document and are only valid for the
/// duration of the handler call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwinUpdate<'a> {
    /// Property name of the binding.
    pub property: &'a str,
    /// Newly applied value.
    pub value: TwinValue<'a>,
}

/// Change handler invoked after a desired value has been stored.
pub type TwinHandler = fn(&TwinUpdate<'_>);

/// Declaration of one synchronized twin property.
#[derive(Clone, Copy)]
pub struct DeviceTwinBinding {
    /// Property name, dotted for nested objects. Unique within a set.
    pub property: &'static str,
    /// Declared scalar type.
    pub twin_type: TwinType,
    /// Optional handler called when the cloud changes the value.
    pub handler: Option<TwinHandler>,
}

impl DeviceTwinBinding {
    /// Declare a binding without a change handler.
    pub const fn new(property: &'static str, twin_type: TwinType) -> Self {
        Self {
            property,
            twin_type,
            handler: None,
        }
    }

    /// Attach a change handler.
    pub const fn with_handler(mut self, handler: TwinHandler) -> Self {
        self.handler = Some(handler);
        self
    }
}

impl core::fmt::Debug for DeviceTwinBinding {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DeviceTwinBinding")
            .field("property", &self.property)
            .field("twin_type", &self.twin_type)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}
