//! Port traits — the hexagonal boundary between domain logic and hardware.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ NodeService (domain)
//! ```
//!
//! Driven adapters (GPIO, storage, broker, sensor bus, event sinks)
//! implement these traits. The domain consumes them via generics at call
//! sites, so the core never touches a peripheral register directly and the
//! whole service runs on the host under mock adapters.

use crate::config::{DeviceConfig, PinMode};

// ───────────────────────────────────────────────────────────────
// GPIO port (domain ↔ physical pins)
// ───────────────────────────────────────────────────────────────

/// Raw digital-pin capability set.
///
/// `read` returns the *electrical* level; the logical inversion for
/// input buttons is applied one layer up in
/// [`actuator::read_active`](super::actuator::read_active).
pub trait PinPort {
    /// Set the pin's direction and pull configuration.
    fn configure(&mut self, pin: u8, mode: PinMode);

    /// Drive an output pin to the given level.
    fn write(&mut self, pin: u8, level: bool);

    /// Raw electrical level of a pin.
    fn read(&self, pin: u8) -> bool;
}

/// Blocking millisecond delay.
///
/// Deliberately blocking: a pulse must run to completion before the
/// invoking context returns (see the concurrency notes in `main.rs`).
pub trait DelayPort {
    fn delay_ms(&mut self, ms: u64);
}

// ───────────────────────────────────────────────────────────────
// Sensor bus port (domain ↔ 1-Wire temperature bus)
// ───────────────────────────────────────────────────────────────

/// Reading reported when no sensor answers at a bus index
/// (DS18B20 driver convention).
pub const DISCONNECTED_C: f32 = -127.0;

/// Shared temperature bus, addressed by bus-scan order — not by the
/// configured display labels.
pub trait SensorBusPort {
    /// Re-initialise the bus on a new pin (config changed the bus pin).
    fn rebind(&mut self, pin: u8);

    /// Trigger a conversion on every sensor. Blocking for the
    /// conversion interval.
    fn request_conversion(&mut self);

    /// Temperature of the sensor at `index` in bus-scan order, or
    /// [`DISCONNECTED_C`] when absent.
    fn read_celsius(&mut self, index: usize) -> f32;
}

// ───────────────────────────────────────────────────────────────
// Config store port (domain ↔ non-volatile storage)
// ───────────────────────────────────────────────────────────────

/// Persistence boundary for the configuration document.
///
/// `load` followed by `save` on an untouched store yields a config equal
/// to the original in every field, including button order.
pub trait ConfigStorePort {
    /// Load the persisted document. An *absent* document is not an error
    /// (returns defaults); a mount failure or corrupt document is.
    /// Callers treat every `Err` as "use defaults" — nothing hard-faults.
    fn load(&self) -> Result<DeviceConfig, LoadError>;

    /// Serialize and persist the full document, overwriting any existing
    /// one. On failure the in-memory config stays authoritative; the
    /// error is surfaced to the requester, nothing is rolled back.
    fn save(&mut self, config: &DeviceConfig) -> Result<(), SaveError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadError {
    /// Storage could not be mounted/opened.
    Mount,
    /// Document present but not deserializable.
    Corrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveError {
    Mount,
    /// The write itself failed (full or I/O error).
    Write,
}

impl core::fmt::Display for LoadError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Mount => write!(f, "storage mount failed"),
            Self::Corrupted => write!(f, "config document corrupted"),
        }
    }
}

impl core::fmt::Display for SaveError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Mount => write!(f, "storage mount failed"),
            Self::Write => write!(f, "config write failed"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Broker port (domain ↔ message bus)
// ───────────────────────────────────────────────────────────────

/// Connection parameters for the message bus, taken from [`DeviceConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerParams {
    pub host: String,
    pub client_id: String,
    pub username: String,
    pub password: String,
}

/// One inbound bus message. The payload is carried for logging only —
/// topic equality alone routes the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerError {
    ConnectFailed,
    NotConnected,
    SubscribeFailed,
}

impl core::fmt::Display for BrokerError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ConnectFailed => write!(f, "broker connect failed"),
            Self::NotConnected => write!(f, "not connected to broker"),
            Self::SubscribeFailed => write!(f, "subscribe failed"),
        }
    }
}

/// Message-bus client. Delivery is at-most-once; there is no
/// acknowledgement or back-pressure protocol on top of it.
pub trait BrokerPort {
    fn connect(&mut self, params: &BrokerParams) -> Result<(), BrokerError>;

    /// Subscriptions do not survive a disconnect — the caller re-issues
    /// the full set on every (re)connect.
    fn subscribe(&mut self, topic: &str) -> Result<(), BrokerError>;

    fn is_connected(&self) -> bool;

    /// Drain every message received since the last call, in arrival order.
    fn take_messages(&mut self) -> Vec<InboundMessage>;
}

// ───────────────────────────────────────────────────────────────
// Connectivity port (domain ↔ station/provisioning radio)
// ───────────────────────────────────────────────────────────────

/// Station-mode network attachment plus the provisioning access point
/// used while no credentials are configured.
pub trait ConnectivityPort {
    /// Whether the active config carries usable station credentials.
    fn has_credentials(&self) -> bool;

    /// Stage new station credentials; takes effect on the next
    /// `connect` call.
    fn set_credentials(&mut self, ssid: &str, password: &str);

    /// Begin (or retry) a station connection attempt. Non-blocking;
    /// progress is observed through `is_connected`.
    fn connect(&mut self);

    fn is_connected(&self) -> bool;

    /// Bring up the open provisioning access point (management surface
    /// reachable, no station link).
    fn start_provisioning(&mut self);

    fn stop_provisioning(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port; adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
