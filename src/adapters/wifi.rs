//! Wi-Fi adapter: station attachment plus the open provisioning AP.
//!
//! Implements [`ConnectivityPort`]. Credentials live in fixed-capacity
//! buffers sized to the 802.11 limits; anything that fails validation is
//! rejected at staging time and the node stays in provisioning.

use log::{info, warn};

use crate::app::ports::ConnectivityPort;

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{
    AccessPointConfiguration, AuthMethod, ClientConfiguration, Configuration, EspWifi,
};

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

/// 1-32 printable ASCII bytes.
fn valid_ssid(ssid: &str) -> bool {
    !ssid.is_empty() && ssid.len() <= 32 && is_printable_ascii(ssid)
}

/// Empty (open network) or a WPA2 passphrase of 8-64 bytes.
fn valid_password(password: &str) -> bool {
    password.is_empty() || (8..=64).contains(&password.len())
}

pub struct WifiAdapter {
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    /// Provisioning AP name, derived from the device id.
    ap_ssid: heapless::String<32>,

    #[cfg(target_os = "espidf")]
    wifi: EspWifi<'static>,

    #[cfg(not(target_os = "espidf"))]
    sim_connected: bool,
    #[cfg(not(target_os = "espidf"))]
    sim_provisioning: bool,
}

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(wifi: EspWifi<'static>, ap_ssid: &str) -> Self {
        Self {
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            ap_ssid: heapless::String::try_from(ap_ssid).unwrap_or_default(),
            wifi,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(ap_ssid: &str) -> Self {
        info!("WifiAdapter: simulation backend");
        Self {
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            ap_ssid: heapless::String::try_from(ap_ssid).unwrap_or_default(),
            sim_connected: false,
            sim_provisioning: false,
        }
    }

    /// Mark the simulated station link up or down.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_connected(&mut self, up: bool) {
        self.sim_connected = up;
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_provisioning_active(&self) -> bool {
        self.sim_provisioning
    }
}

impl ConnectivityPort for WifiAdapter {
    fn has_credentials(&self) -> bool {
        !self.ssid.is_empty()
    }

    fn set_credentials(&mut self, ssid: &str, password: &str) {
        if !valid_ssid(ssid) || !valid_password(password) {
            if !ssid.is_empty() {
                warn!("WiFi: rejecting invalid credentials (SSID '{ssid}')");
            }
            self.ssid.clear();
            self.password.clear();
            return;
        }
        self.ssid = heapless::String::try_from(ssid).unwrap_or_default();
        self.password = heapless::String::try_from(password).unwrap_or_default();
        info!("WiFi: credentials staged (SSID '{}')", self.ssid);
    }

    fn connect(&mut self) {
        info!("WiFi: station connect to '{}'", self.ssid);

        #[cfg(target_os = "espidf")]
        {
            let client = ClientConfiguration {
                ssid: self.ssid.as_str().try_into().unwrap_or_default(),
                password: self.password.as_str().try_into().unwrap_or_default(),
                auth_method: if self.password.is_empty() {
                    AuthMethod::None
                } else {
                    AuthMethod::WPA2Personal
                },
                ..Default::default()
            };
            let steps = [
                self.wifi.set_configuration(&Configuration::Client(client)),
                self.wifi.start(),
                self.wifi.connect(),
            ];
            for step in steps {
                if let Err(e) = step {
                    warn!("WiFi: station bring-up step failed: {e}");
                    return;
                }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            self.sim_connected = true;
        }
    }

    fn is_connected(&self) -> bool {
        #[cfg(target_os = "espidf")]
        {
            self.wifi.is_up().unwrap_or(false)
        }

        #[cfg(not(target_os = "espidf"))]
        {
            self.sim_connected
        }
    }

    fn start_provisioning(&mut self) {
        info!("WiFi: provisioning AP '{}' up", self.ap_ssid);

        #[cfg(target_os = "espidf")]
        {
            let ap = AccessPointConfiguration {
                ssid: self.ap_ssid.as_str().try_into().unwrap_or_default(),
                auth_method: AuthMethod::None,
                ..Default::default()
            };
            let steps = [
                self.wifi
                    .set_configuration(&Configuration::AccessPoint(ap)),
                self.wifi.start(),
            ];
            for step in steps {
                if let Err(e) = step {
                    warn!("WiFi: AP bring-up step failed: {e}");
                    return;
                }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            self.sim_provisioning = true;
        }
    }

    fn stop_provisioning(&mut self) {
        info!("WiFi: provisioning AP down");

        #[cfg(target_os = "espidf")]
        {
            if let Err(e) = self.wifi.stop() {
                warn!("WiFi: stop failed: {e}");
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            self.sim_provisioning = false;
        }
    }
}
