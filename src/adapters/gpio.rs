//! GPIO adapter: [`PinPort`] over raw ESP-IDF pad registers.
//!
//! Raw `gpio_*` calls rather than `PinDriver` because pins are chosen at
//! runtime from the config document; the typed HAL wants compile-time
//! pin ownership.

use log::info;

use crate::app::ports::PinPort;
use crate::config::PinMode;

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_sys::{
    gpio_get_level, gpio_mode_t_GPIO_MODE_INPUT, gpio_mode_t_GPIO_MODE_OUTPUT,
    gpio_pull_mode_t_GPIO_FLOATING, gpio_pull_mode_t_GPIO_PULLDOWN_ONLY,
    gpio_pull_mode_t_GPIO_PULLUP_ONLY, gpio_reset_pin, gpio_set_direction, gpio_set_level,
    gpio_set_pull_mode,
};

pub struct GpioAdapter {
    #[cfg(not(target_os = "espidf"))]
    modes: HashMap<u8, PinMode>,
    #[cfg(not(target_os = "espidf"))]
    levels: HashMap<u8, bool>,
}

impl GpioAdapter {
    pub fn new() -> Self {
        #[cfg(not(target_os = "espidf"))]
        info!("GpioAdapter: simulation backend");
        Self {
            #[cfg(not(target_os = "espidf"))]
            modes: HashMap::new(),
            #[cfg(not(target_os = "espidf"))]
            levels: HashMap::new(),
        }
    }

    /// Force a raw electrical level on an input pin (simulation only).
    #[cfg(not(target_os = "espidf"))]
    pub fn set_sim_level(&mut self, pin: u8, level: bool) {
        self.levels.insert(pin, level);
    }
}

impl Default for GpioAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl PinPort for GpioAdapter {
    fn configure(&mut self, pin: u8, mode: PinMode) {
        info!("gpio{pin}: mode 0x{:02x}", mode.code());

        #[cfg(target_os = "espidf")]
        {
            let gpio = i32::from(pin);
            // SAFETY: pin numbers are range-checked at config-save time;
            // all GPIO calls run on the single main task.
            unsafe {
                gpio_reset_pin(gpio);
                match mode {
                    PinMode::Output => {
                        gpio_set_direction(gpio, gpio_mode_t_GPIO_MODE_OUTPUT);
                    }
                    PinMode::Input => {
                        gpio_set_direction(gpio, gpio_mode_t_GPIO_MODE_INPUT);
                        gpio_set_pull_mode(gpio, gpio_pull_mode_t_GPIO_FLOATING);
                    }
                    PinMode::InputPullup => {
                        gpio_set_direction(gpio, gpio_mode_t_GPIO_MODE_INPUT);
                        gpio_set_pull_mode(gpio, gpio_pull_mode_t_GPIO_PULLUP_ONLY);
                    }
                    PinMode::InputPulldown => {
                        gpio_set_direction(gpio, gpio_mode_t_GPIO_MODE_INPUT);
                        gpio_set_pull_mode(gpio, gpio_pull_mode_t_GPIO_PULLDOWN_ONLY);
                    }
                }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            self.levels.remove(&pin);
            self.modes.insert(pin, mode);
        }
    }

    fn write(&mut self, pin: u8, level: bool) {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: see `configure`.
            unsafe {
                gpio_set_level(i32::from(pin), u32::from(level));
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            self.levels.insert(pin, level);
        }
    }

    fn read(&self, pin: u8) -> bool {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: see `configure`.
            unsafe { gpio_get_level(i32::from(pin)) != 0 }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            // An untouched input rests at its pull level.
            self.levels.get(&pin).copied().unwrap_or_else(|| {
                matches!(self.modes.get(&pin), Some(PinMode::InputPullup))
            })
        }
    }
}
