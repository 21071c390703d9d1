//! Device identity from the factory-burned eFuse MAC.
//!
//! One node, three names, all derived from the last three MAC bytes:
//! the short id `GN-XXYYZZ` (broker client id and provisioning AP SSID)
//! and the lowercase hostname `gpionode-xxyyzz`. Stable across reboots
//! and firmware upgrades.

use core::fmt::Write;

/// Resolved identity strings, computed once at boot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub mac: [u8; 6],
    pub id: heapless::String<16>,
    pub hostname: heapless::String<24>,
}

impl DeviceIdentity {
    /// Read the factory MAC and derive the names.
    pub fn resolve() -> Self {
        Self::from_mac(factory_mac())
    }

    pub fn from_mac(mac: [u8; 6]) -> Self {
        let mut id = heapless::String::new();
        let _ = write!(id, "GN-{:02X}{:02X}{:02X}", mac[3], mac[4], mac[5]);
        let mut hostname = heapless::String::new();
        let _ = write!(hostname, "gpionode-{:02x}{:02x}{:02x}", mac[3], mac[4], mac[5]);
        Self { mac, id, hostname }
    }
}

#[cfg(target_os = "espidf")]
fn factory_mac() -> [u8; 6] {
    let mut mac = [0u8; 6];
    // SAFETY: writes exactly 6 bytes into the buffer.
    unsafe {
        esp_idf_sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Fixed MAC for host runs so log output stays reproducible.
#[cfg(not(target_os = "espidf"))]
fn factory_mac() -> [u8; 6] {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}
