//! Error types for device twin operations

/// Errors reported by the device twin registry and reported-state publisher.
///
/// Configuration errors (`UnknownType`, `DuplicateProperty`,
/// `PropertyNameTooLong`, `TooManyBindings`) are only produced while opening
/// a [`DeviceTwinSet`](super::DeviceTwinSet). Inbound desired-state problems
/// never surface as errors; they are skipped during dispatch.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// A binding was declared with [`TwinType::Unknown`](super::TwinType::Unknown).
    UnknownType,
    /// Two bindings declare the same property name.
    DuplicateProperty,
    /// A property name exceeds [`MAX_PROPERTY_NAME_LEN`](super::MAX_PROPERTY_NAME_LEN).
    PropertyNameTooLong,
    /// More bindings than [`MAX_DEVICE_TWINS`](super::MAX_DEVICE_TWINS).
    TooManyBindings,
    /// No binding is registered under the requested property name.
    PropertyNotFound,
    /// The supplied value does not match the binding's declared type.
    TypeMismatch,
    /// The binding's storage has been released by `close`.
    NotOpen,
    /// String bindings keep no local value between updates.
    NoLocalValue,
    /// The cloud client reported no connectivity.
    NotConnected,
    /// Formatting produced an empty reported-state fragment.
    EmptyReport,
    /// The reported-state fragment does not fit in
    /// [`DEVICE_TWIN_REPORT_LEN`](super::DEVICE_TWIN_REPORT_LEN) bytes.
    ReportOverflow,
    /// The cloud client rejected the reported-state submission.
    SendFailed,
}

impl Error {
    /// Returns `true` for errors caused by an invalid binding declaration.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::UnknownType
                | Error::DuplicateProperty
                | Error::PropertyNameTooLong
                | Error::TooManyBindings
        )
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            Error::UnknownType => "device twin missing type information",
            Error::DuplicateProperty => "device twin property declared twice",
            Error::PropertyNameTooLong => "device twin property name too long",
            Error::TooManyBindings => "too many device twin bindings",
            Error::PropertyNotFound => "device twin property not found",
            Error::TypeMismatch => "device twin value type mismatch",
            Error::NotOpen => "device twin is closed",
            Error::NoLocalValue => "device twin has no local value",
            Error::NotConnected => "cloud client not connected",
            Error::EmptyReport => "reported state is empty",
            Error::ReportOverflow => "reported state exceeds buffer",
            Error::SendFailed => "failed to send reported state",
        };
        f.write_str(msg)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::UnknownType => defmt::write!(f, "UnknownType"),
            Error::DuplicateProperty => defmt::write!(f, "DuplicateProperty"),
            Error::PropertyNameTooLong => defmt::write!(f, "PropertyNameTooLong"),
            Error::TooManyBindings => defmt::write!(f, "TooManyBindings"),
            Error::PropertyNotFound => defmt::write!(f, "PropertyNotFound"),
            Error::TypeMismatch => defmt::write!(f, "TypeMismatch"),
            Error::NotOpen => defmt::write!(f, "NotOpen"),
            Error::NoLocalValue => defmt::write!(f, "NoLocalValue"),
            Error::NotConnected => defmt::write!(f, "NotConnected"),
            Error::EmptyReport => defmt::write!(f, "EmptyReport"),
            Error::ReportOverflow => defmt::write!(f, "ReportOverflow"),
            Error::SendFailed => defmt::write!(f, "SendFailed"),
        }
    }
}
