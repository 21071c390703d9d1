//! Pin numbering facts for the classic ESP32 target board.
//!
//! Single source of truth — validation and defaults reference this module
//! rather than hard-coding pin numbers.

/// Highest valid GPIO number on the classic ESP32 (GPIO0–GPIO39).
/// GPIO34–39 are input-only in silicon; the board wiring is expected to
/// respect that, the firmware only enforces the numeric range.
pub const GPIO_MAX: u8 = 39;

/// Factory-default GPIO carrying the 1-Wire temperature bus.
pub const DEFAULT_ONEWIRE_GPIO: u8 = 4;

/// Whether `pin` is addressable on this platform.
pub const fn in_range(pin: u8) -> bool {
    pin <= GPIO_MAX
}
