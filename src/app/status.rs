//! Read-only status views: input states and temperatures.

use serde::Serialize;

use crate::app::actuator;
use crate::app::ports::{PinPort, SensorBusPort};
use crate::config::{ButtonDefinition, DeviceConfig};

/// One input button's snapshot. `id` is the button's position in the
/// configured list, so clients can correlate with the config view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputState {
    pub name: String,
    pub pin: u8,
    pub state: bool,
    pub id: usize,
}

/// Snapshot of every input-mode button, in list order. Output buttons
/// are skipped but keep their indices: `id` is the position in the full
/// list, not in the filtered result.
pub fn input_states<P: PinPort>(pins: &P, buttons: &[ButtonDefinition]) -> Vec<InputState> {
    buttons
        .iter()
        .enumerate()
        .filter(|(_, b)| b.mode.is_input())
        .map(|(id, b)| InputState {
            name: b.name.clone(),
            pin: b.pin,
            state: actuator::read_active(pins, b),
            id,
        })
        .collect()
}

/// Labelled temperature report for the two expected bus sensors.
/// A missing sensor reads as the disconnected sentinel, not an error.
/// The labels serve logging and the config surface; the wire document
/// for the temperature query carries only the two readings.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureReport {
    pub sensor1_name: String,
    pub sensor1_temp: f32,
    pub sensor2_name: String,
    pub sensor2_temp: f32,
}

/// Trigger one conversion and read both sensor slots. Labels come from
/// the config; readings come from bus-scan order, so the pairing is only
/// as good as the physical wiring.
pub fn temperatures<B: SensorBusPort>(bus: &mut B, config: &DeviceConfig) -> TemperatureReport {
    bus.request_conversion();
    TemperatureReport {
        sensor1_name: config.sensor1_name.clone(),
        sensor1_temp: bus.read_celsius(0),
        sensor2_name: config.sensor2_name.clone(),
        sensor2_temp: bus.read_celsius(1),
    }
}
