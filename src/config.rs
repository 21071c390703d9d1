//! Device configuration model.
//!
//! Mirrors the persisted JSON document field-for-field: network credentials,
//! broker connection parameters, two sensor display names, the shared 1-Wire
//! bus pin, and the ordered button list. Button list order is the display
//! order and the addressing key for delete-by-index — there is no stable
//! identity beyond position.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::pins;

/// Operating mode of a configured pin.
///
/// The wire representation is the ESP32 Arduino core's pin-mode integer and
/// must survive save/load verbatim — external tooling writes these values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PinMode {
    Input,
    Output,
    InputPullup,
    InputPulldown,
}

impl PinMode {
    /// The platform pin-mode integer (INPUT=0x01, OUTPUT=0x03,
    /// INPUT_PULLUP=0x05, INPUT_PULLDOWN=0x09).
    pub const fn code(self) -> u8 {
        match self {
            Self::Input => 0x01,
            Self::Output => 0x03,
            Self::InputPullup => 0x05,
            Self::InputPulldown => 0x09,
        }
    }

    /// Output-mode pins carry topic/duration semantics and never
    /// participate in state polling; input-mode pins are the inverse.
    pub const fn is_output(self) -> bool {
        matches!(self, Self::Output)
    }

    pub const fn is_input(self) -> bool {
        !self.is_output()
    }
}

/// A mode integer outside the platform enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownPinMode(pub u8);

impl core::fmt::Display for UnknownPinMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "unknown pin mode 0x{:02x}", self.0)
    }
}

impl TryFrom<u8> for PinMode {
    type Error = UnknownPinMode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0x01 => Ok(Self::Input),
            0x03 => Ok(Self::Output),
            0x05 => Ok(Self::InputPullup),
            0x09 => Ok(Self::InputPulldown),
            other => Err(UnknownPinMode(other)),
        }
    }
}

impl From<PinMode> for u8 {
    fn from(mode: PinMode) -> Self {
        mode.code()
    }
}

/// One configured button: a physical pin plus its operating semantics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonDefinition {
    /// Operator-chosen display label. Not required to be unique.
    pub name: String,
    /// Physical pin identifier, validated against [`pins::GPIO_MAX`] at
    /// config-save time (actuation assumes pre-validated pins).
    pub pin: u8,
    /// Pulse length in milliseconds. Meaningful for output mode only.
    #[serde(rename = "duration")]
    pub duration_ms: u64,
    /// Message-bus topic. Subscribed iff the pin operates in output mode.
    pub topic: String,
    pub mode: PinMode,
}

/// The full persisted configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub ssid: String,
    pub password: String,
    pub mqtt_server: String,
    pub mqtt_user: String,
    pub mqtt_password: String,
    pub sensor1_name: String,
    pub sensor2_name: String,
    /// Pin carrying the 1-Wire sensor bus; changing it re-initialises
    /// the bus capability.
    #[serde(rename = "oneWireBus_pin")]
    pub onewire_bus_pin: u8,
    /// Ordered button list. Position is identity.
    pub buttons: Vec<ButtonDefinition>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            ssid: String::new(),
            password: String::new(),
            mqtt_server: String::new(),
            mqtt_user: String::new(),
            mqtt_password: String::new(),
            sensor1_name: "CPU".into(),
            sensor2_name: "CHIPSET".into(),
            onewire_bus_pin: pins::DEFAULT_ONEWIRE_GPIO,
            buttons: Vec::new(),
        }
    }
}

impl DeviceConfig {
    /// Range-check every pin in the document. Called on the save path —
    /// a config that fails here is rejected before any state changes.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !pins::in_range(self.onewire_bus_pin) {
            return Err(ValidationError::PinOutOfRange(self.onewire_bus_pin));
        }
        for button in &self.buttons {
            if !pins::in_range(button.pin) {
                return Err(ValidationError::PinOutOfRange(button.pin));
            }
        }
        Ok(())
    }

    /// Copy with credential secrets blanked, for UI read-back.
    pub fn redacted(&self) -> Self {
        Self {
            password: String::new(),
            mqtt_password: String::new(),
            ..self.clone()
        }
    }
}
