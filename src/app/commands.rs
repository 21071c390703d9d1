//! Mutation requests accepted by the node service.
//!
//! Commands arrive from the web surface already parsed into structured
//! form; the service validates and applies them. `None` scalar fields
//! mean "leave the current value alone" — the management form only
//! submits the fields it rendered.

use crate::config::ButtonDefinition;

/// Full configuration update: optional scalar overwrites plus a wholesale
/// replacement of the button list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigUpdate {
    pub ssid: Option<String>,
    pub password: Option<String>,
    pub mqtt_server: Option<String>,
    pub mqtt_user: Option<String>,
    pub mqtt_password: Option<String>,
    pub sensor1_name: Option<String>,
    pub sensor2_name: Option<String>,
    pub onewire_bus_pin: Option<u8>,
    /// `Some` replaces the whole button list (order defines identity);
    /// `None` keeps the current list.
    pub buttons: Option<Vec<ButtonDefinition>>,
}

impl ConfigUpdate {
    /// True when applying this update could invalidate the broker
    /// session (credentials, server, or subscription set changed).
    pub fn touches_link(&self) -> bool {
        self.ssid.is_some()
            || self.password.is_some()
            || self.mqtt_server.is_some()
            || self.mqtt_user.is_some()
            || self.mqtt_password.is_some()
            || self.buttons.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Validate and apply a configuration update, then persist.
    UpdateConfig(ConfigUpdate),
    /// Remove the button at `index`; later entries shift left.
    DeleteButton { index: usize },
    /// Reboot the node (deferred until the current request completes).
    Restart,
}
