//! Driven adapters behind the port traits. Each is dual-target: real
//! ESP-IDF calls under `target_os = "espidf"`, a simulation backend
//! everywhere else. `http` exists only on the target.

pub mod device_id;
pub mod fs_store;
pub mod gpio;
#[cfg(target_os = "espidf")]
pub mod http;
pub mod log_sink;
pub mod mqtt;
pub mod onewire;
pub mod time;
pub mod wifi;
