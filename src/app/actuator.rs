//! Pin actuation primitives: mode application, pulsing, input reads.
//!
//! Everything here works on pre-validated pins — range checks happen on
//! the config mutation path, not per actuation.

use crate::app::ports::{DelayPort, PinPort};
use crate::config::{ButtonDefinition, PinMode};

/// Apply each button's configured mode to its pin and drive output pins
/// to their idle (low) level. Called at boot and after every config
/// mutation so the hardware always mirrors the active config.
pub fn apply_modes<P: PinPort>(pins: &mut P, buttons: &[ButtonDefinition]) {
    for button in buttons {
        pins.configure(button.pin, button.mode);
        if button.mode.is_output() {
            pins.write(button.pin, false);
        }
    }
}

/// Drive an output button high, hold for its configured duration, then
/// drive it low again. Blocks the caller for the full duration; the
/// single-threaded runtime model guarantees at most one pulse at a time.
pub fn pulse<P: PinPort, D: DelayPort>(pins: &mut P, delay: &mut D, button: &ButtonDefinition) {
    pins.write(button.pin, true);
    delay.delay_ms(button.duration_ms);
    pins.write(button.pin, false);
}

/// Logical state of an input button. The wiring is active-low for every
/// input mode, so the electrical level is inverted: low means pressed.
pub fn read_active<P: PinPort>(pins: &P, button: &ButtonDefinition) -> bool {
    debug_assert!(button.mode.is_input());
    !pins.read(button.pin)
}

/// Pulse an arbitrary pin that is not in the configured button list.
/// The pin is forced into output mode first since nothing else has
/// configured it. Backs the ad-hoc trigger endpoint.
pub fn pulse_raw<P: PinPort, D: DelayPort>(pins: &mut P, delay: &mut D, pin: u8, duration_ms: u64) {
    pins.configure(pin, PinMode::Output);
    pins.write(pin, true);
    delay.delay_ms(duration_ms);
    pins.write(pin, false);
}
