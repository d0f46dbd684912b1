//! Event trait and related types.
//!
//! Events are facts emitted by committed transitions (`AirlineRegistered`,
//! `PolicyPurchased`, `OracleRequest`, ...). They are returned to the caller
//! alongside the transition result and written to the journal, where
//! observers such as the oracle relay replay them from genesis.
//!
//! # Design
//!
//! Events are serialized with `bincode` for the journal. Event type names
//! carry a version suffix (`"PolicyPurchased.v1"`) so stored payloads can
//! evolve.
//!
//! # Example
//!
//! ```
//! use flight_surety_core::event::Event;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Clone, Debug, Serialize, Deserialize)]
//! enum LedgerEvent {
//!     PolicyPurchased { flight: String, premium: u128 },
//!     CreditsWithdrawn { amount: u128 },
//! }
//!
//! impl Event for LedgerEvent {
//!     fn event_type(&self) -> &'static str {
//!         match self {
//!             LedgerEvent::PolicyPurchased { .. } => "PolicyPurchased.v1",
//!             LedgerEvent::CreditsWithdrawn { .. } => "CreditsWithdrawn.v1",
//!         }
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt;
use thiserror::Error;

/// Error types for event operations.
#[derive(Error, Debug)]
pub enum EventError {
    /// Failed to serialize event to bytes.
    #[error("Failed to serialize event: {0}")]
    SerializationError(String),

    /// Failed to deserialize event from bytes.
    #[error("Failed to deserialize event: {0}")]
    DeserializationError(String),
}

/// An event that can be journaled and replayed.
///
/// `#[derive(DomainEvent)]` from `flight-surety-macros` implements this trait
/// with `"<Variant>.v1"` type names.
pub trait Event: Send + Sync + 'static {
    /// Returns the versioned event type identifier, e.g. `"OracleRequest.v1"`.
    fn event_type(&self) -> &'static str;

    /// Serialize this event to bincode bytes.
    ///
    /// # Errors
    ///
    /// Returns `EventError::SerializationError` if the event cannot be serialized.
    fn to_bytes(&self) -> Result<Vec<u8>, EventError>
    where
        Self: Serialize,
    {
        bincode::serialize(self).map_err(|e| EventError::SerializationError(e.to_string()))
    }

    /// Deserialize an event from bincode bytes.
    ///
    /// # Errors
    ///
    /// Returns `EventError::DeserializationError` if the bytes are corrupted or
    /// belong to a different schema.
    fn from_bytes(bytes: &[u8]) -> Result<Self, EventError>
    where
        Self: DeserializeOwned + Sized,
    {
        bincode::deserialize(bytes).map_err(|e| EventError::DeserializationError(e.to_string()))
    }
}

/// A serialized event as stored in the journal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedEvent {
    /// The event type identifier (e.g., "FlightStatusInfo.v1").
    pub event_type: String,

    /// The bincode-serialized event data.
    pub data: Vec<u8>,
}

impl SerializedEvent {
    /// Create a new serialized event.
    #[must_use]
    pub const fn new(event_type: String, data: Vec<u8>) -> Self {
        Self { event_type, data }
    }

    /// Serialize an `Event`.
    ///
    /// # Errors
    ///
    /// Returns `EventError::SerializationError` if the event cannot be serialized.
    pub fn from_event<E: Event + Serialize>(event: &E) -> Result<Self, EventError> {
        Ok(Self {
            event_type: event.event_type().to_string(),
            data: event.to_bytes()?,
        })
    }

    /// Decode the payload back into an event.
    ///
    /// # Errors
    ///
    /// Returns `EventError::DeserializationError` if the payload does not decode
    /// into `E`.
    pub fn decode<E: Event + DeserializeOwned>(&self) -> Result<E, EventError> {
        E::from_bytes(&self.data)
    }
}

impl fmt::Display for SerializedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SerializedEvent {{ type: {}, size: {} bytes }}",
            self.event_type,
            self.data.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
    enum GateEvent {
        Paused { by: String },
        Resumed { by: String },
    }

    impl Event for GateEvent {
        fn event_type(&self) -> &'static str {
            match self {
                GateEvent::Paused { .. } => "Paused.v1",
                GateEvent::Resumed { .. } => "Resumed.v1",
            }
        }
    }

    #[test]
    #[allow(clippy::expect_used)] // Panics: Test will fail if serialization fails
    fn serialized_event_decodes_to_original() {
        let event = GateEvent::Paused {
            by: "owner".to_string(),
        };

        let serialized = SerializedEvent::from_event(&event).expect("serialization should succeed");
        assert_eq!(serialized.event_type, "Paused.v1");

        let decoded: GateEvent = serialized.decode().expect("deserialization should succeed");
        assert_eq!(decoded, event);
    }

    #[test]
    fn corrupted_payload_is_reported() {
        let serialized = SerializedEvent::new("Resumed.v1".to_string(), vec![0xff]);
        let result: Result<GateEvent, _> = serialized.decode();
        assert!(matches!(result, Err(EventError::DeserializationError(_))));
    }

    #[test]
    fn serialized_event_display() {
        let serialized = SerializedEvent::new("Resumed.v1".to_string(), vec![1, 2, 3, 4, 5]);

        let display = format!("{serialized}");
        assert!(display.contains("Resumed.v1"));
        assert!(display.contains("5 bytes"));
    }
}
