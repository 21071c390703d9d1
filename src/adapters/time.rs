//! Monotonic time and blocking delay.
//!
//! - **`target_os = "espidf"`** — wraps `esp_timer_get_time()` and
//!   FreeRTOS task delay.
//! - **all other targets** — `std::time::Instant` and `thread::sleep`.

use crate::app::ports::DelayPort;

pub struct TimeAdapter {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for TimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Milliseconds since boot (monotonic).
    #[cfg(target_os = "espidf")]
    pub fn uptime_ms(&self) -> u64 {
        (unsafe { esp_idf_sys::esp_timer_get_time() }) as u64 / 1_000
    }

    /// Milliseconds since boot (monotonic).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

impl DelayPort for TimeAdapter {
    fn delay_ms(&mut self, ms: u64) {
        #[cfg(target_os = "espidf")]
        {
            // FreeRTOS delay keeps the idle task (and watchdog) fed.
            esp_idf_hal::delay::FreeRtos::delay_ms(ms as u32);
        }

        #[cfg(not(target_os = "espidf"))]
        {
            std::thread::sleep(std::time::Duration::from_millis(ms));
        }
    }
}
