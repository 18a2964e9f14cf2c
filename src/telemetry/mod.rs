//! Telemetry messages for periodic environment readings.
//!
//! ```rust
//! use libtwin::telemetry::{Environment, TelemetryBuilder};
//!
//! let mut telemetry = TelemetryBuilder::new();
//! let reading = Environment {
//!     temperature: 22.5,
//!     humidity: 41.0,
//!     pressure: 1013.0,
//!     light: 300,
//! };
//!
//! let message = telemetry.build(&reading).unwrap();
//! assert!(message.starts_with("{\"Temperature\":\"22.50\","));
//! assert!(message.ends_with("\"MsgId\":1}"));
//! assert_eq!(telemetry.message_id(), 1);
//! ```

use core::fmt::Write as _;
use heapless::String;
use serde::Serialize;

/// Capacity of one serialized telemetry message.
pub const JSON_MESSAGE_BYTES: usize = 256;

/// Enough for any `f32` in fixed notation with sign and decimals.
const READING_LEN: usize = 48;

/// Errors produced while building a telemetry message.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// The message does not fit in the output buffer.
    BufferOverflow,
    /// The serializer produced invalid UTF-8.
    Encoding,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::BufferOverflow => f.write_str("telemetry message exceeds buffer"),
            Error::Encoding => f.write_str("telemetry message is not valid UTF-8"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::BufferOverflow => defmt::write!(f, "BufferOverflow"),
            Error::Encoding => defmt::write!(f, "Encoding"),
        }
    }
}

/// One snapshot of the environment sensors.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Environment {
    /// Degrees Celsius.
    pub temperature: f32,
    /// Relative humidity in percent.
    pub humidity: f32,
    /// Hectopascal.
    pub pressure: f32,
    /// Ambient light level, sensor units.
    pub light: i32,
}

/// Wire shape of one message. Readings are quoted fixed-point strings:
/// temperature with two decimals, humidity and pressure with one.
#[derive(Serialize)]
struct Message<'a> {
    #[serde(rename = "Temperature")]
    temperature: &'a str,
    #[serde(rename = "Humidity")]
    humidity: &'a str,
    #[serde(rename = "Pressure")]
    pressure: &'a str,
    #[serde(rename = "Light")]
    light: i32,
    #[serde(rename = "MsgId")]
    msg_id: u32,
}

/// Serializes [`Environment`] readings, numbering each message.
#[derive(Debug, Default)]
pub struct TelemetryBuilder {
    msg_id: u32,
}

impl TelemetryBuilder {
    /// Create a builder whose first message carries id 1.
    pub const fn new() -> Self {
        Self { msg_id: 0 }
    }

    /// Id of the last message built, 0 before the first one.
    pub fn message_id(&self) -> u32 {
        self.msg_id
    }

    /// Serialize `reading` into `buf` and return the number of bytes written.
    ///
    /// The message id only advances when serialization succeeds.
    pub fn serialize(&mut self, reading: &Environment, buf: &mut [u8]) -> Result<usize, Error> {
        let msg_id = self.msg_id.wrapping_add(1);
        let temperature = fixed(reading.temperature, 2)?;
        let humidity = fixed(reading.humidity, 1)?;
        let pressure = fixed(reading.pressure, 1)?;
        let message = Message {
            temperature: &temperature,
            humidity: &humidity,
            pressure: &pressure,
            light: reading.light,
            msg_id,
        };

        let len = serde_json_core::to_slice(&message, buf).map_err(|_| {
            error!("telemetry message {} exceeds {} byte buffer", msg_id, buf.len());
            Error::BufferOverflow
        })?;

        self.msg_id = msg_id;
        trace!("telemetry message {} built, {} bytes", msg_id, len);
        Ok(len)
    }

    /// Build the next message into a [`JSON_MESSAGE_BYTES`] string.
    pub fn build(&mut self, reading: &Environment) -> Result<String<JSON_MESSAGE_BYTES>, Error> {
        let mut buf = [0u8; JSON_MESSAGE_BYTES];
        let len = self.serialize(reading, &mut buf)?;
        let text = core::str::from_utf8(&buf[..len]).map_err(|_| Error::Encoding)?;
        String::try_from(text).map_err(|_| Error::BufferOverflow)
    }
}

/// `value` with `precision` decimals, padded to at least three characters.
fn fixed(value: f32, precision: usize) -> Result<String<READING_LEN>, Error> {
    let mut text = String::new();
    write!(text, "{:3.*}", precision, value).map_err(|_| Error::BufferOverflow)?;
    Ok(text)
}
