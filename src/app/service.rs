//! Core node service: owns the active configuration and coordinates
//! actuation, routing, status and persistence through the ports.
//!
//! The service holds no port handles. Every operation borrows the
//! adapters it needs, which keeps the struct trivially testable and
//! mirrors the single-threaded runtime: whoever drives the loop owns
//! the hardware.

use log::{info, warn};

use crate::app::commands::{Command, ConfigUpdate};
use crate::app::events::AppEvent;
use crate::app::ports::{
    BrokerParams, ConfigStorePort, DelayPort, EventSink, PinPort, SaveError, SensorBusPort,
};
use crate::app::status::{InputState, TemperatureReport};
use crate::app::{actuator, router, status};
use crate::config::DeviceConfig;
use crate::error::ValidationError;

/// A command failed. `Validation` leaves state untouched; `Save` means
/// the change is live in memory but did not reach storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    Validation(ValidationError),
    Save(SaveError),
}

impl core::fmt::Display for CommandError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Validation(e) => write!(f, "{e}"),
            Self::Save(e) => write!(f, "{e}"),
        }
    }
}

impl From<ValidationError> for CommandError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

pub struct NodeService {
    config: DeviceConfig,
    /// Set when a mutation invalidated the broker session; the link
    /// supervisor drains it and reconnects.
    link_dirty: bool,
    restart_pending: bool,
}

impl NodeService {
    /// Load the persisted config (factory defaults on any storage
    /// failure), then bring the hardware in line with it.
    pub fn boot<S, P, B, E>(store: &S, pins: &mut P, bus: &mut B, sink: &mut E) -> Self
    where
        S: ConfigStorePort,
        P: PinPort,
        B: SensorBusPort,
        E: EventSink,
    {
        let (config, fallback) = match store.load() {
            Ok(config) => (config, false),
            Err(e) => {
                warn!("config load failed ({e}), using defaults");
                (DeviceConfig::default(), true)
            }
        };
        sink.emit(&AppEvent::ConfigLoaded {
            buttons: config.buttons.len(),
            fallback,
        });

        actuator::apply_modes(pins, &config.buttons);
        bus.rebind(config.onewire_bus_pin);
        info!(
            "node up: {} buttons, sensor bus on pin {}",
            config.buttons.len(),
            config.onewire_bus_pin
        );

        Self {
            config,
            link_dirty: false,
            restart_pending: false,
        }
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Broker session parameters for the active config. The node's
    /// device id doubles as the client id.
    pub fn broker_params(&self, device_id: &str) -> BrokerParams {
        BrokerParams {
            host: self.config.mqtt_server.clone(),
            client_id: device_id.to_owned(),
            username: self.config.mqtt_user.clone(),
            password: self.config.mqtt_password.clone(),
        }
    }

    /// Topics the link layer must (re)subscribe on every connect.
    pub fn subscription_topics(&self) -> Vec<&str> {
        router::subscription_topics(&self.config.buttons)
    }

    /// True once after a mutation invalidated the broker session.
    pub fn take_link_dirty(&mut self) -> bool {
        core::mem::take(&mut self.link_dirty)
    }

    /// True once after a restart request was accepted.
    pub fn take_restart(&mut self) -> bool {
        core::mem::take(&mut self.restart_pending)
    }

    /// Validate and apply a mutation, persist, and reconcile hardware.
    pub fn handle_command<S, P, B, E>(
        &mut self,
        command: Command,
        store: &mut S,
        pins: &mut P,
        bus: &mut B,
        sink: &mut E,
    ) -> Result<(), CommandError>
    where
        S: ConfigStorePort,
        P: PinPort,
        B: SensorBusPort,
        E: EventSink,
    {
        match command {
            Command::UpdateConfig(update) => self.update_config(update, store, pins, bus, sink),
            Command::DeleteButton { index } => self.delete_button(index, store, pins, sink),
            Command::Restart => {
                self.restart_pending = true;
                sink.emit(&AppEvent::RestartRequested);
                Ok(())
            }
        }
    }

    fn update_config<S, P, B, E>(
        &mut self,
        update: ConfigUpdate,
        store: &mut S,
        pins: &mut P,
        bus: &mut B,
        sink: &mut E,
    ) -> Result<(), CommandError>
    where
        S: ConfigStorePort,
        P: PinPort,
        B: SensorBusPort,
        E: EventSink,
    {
        // Build the candidate first; nothing is committed until it
        // validates as a whole.
        let mut candidate = self.config.clone();
        let touches_link = update.touches_link();
        if let Some(v) = update.ssid {
            candidate.ssid = v;
        }
        if let Some(v) = update.password {
            candidate.password = v;
        }
        if let Some(v) = update.mqtt_server {
            candidate.mqtt_server = v;
        }
        if let Some(v) = update.mqtt_user {
            candidate.mqtt_user = v;
        }
        if let Some(v) = update.mqtt_password {
            candidate.mqtt_password = v;
        }
        if let Some(v) = update.sensor1_name {
            candidate.sensor1_name = v;
        }
        if let Some(v) = update.sensor2_name {
            candidate.sensor2_name = v;
        }
        if let Some(v) = update.onewire_bus_pin {
            candidate.onewire_bus_pin = v;
        }
        if let Some(v) = update.buttons {
            candidate.buttons = v;
        }
        candidate.validate().map_err(CommandError::Validation)?;

        let bus_pin_changed = candidate.onewire_bus_pin != self.config.onewire_bus_pin;
        self.config = candidate;
        if touches_link {
            self.link_dirty = true;
        }

        actuator::apply_modes(pins, &self.config.buttons);
        if bus_pin_changed {
            bus.rebind(self.config.onewire_bus_pin);
        }

        self.persist(store, sink)
    }

    fn delete_button<S, P, E>(
        &mut self,
        index: usize,
        store: &mut S,
        pins: &mut P,
        sink: &mut E,
    ) -> Result<(), CommandError>
    where
        S: ConfigStorePort,
        P: PinPort,
        E: EventSink,
    {
        let len = self.config.buttons.len();
        if index >= len {
            return Err(ValidationError::IndexOutOfRange { index, len }.into());
        }
        // Vec::remove shifts the tail left, which is exactly the
        // position-is-identity contract clients rely on.
        self.config.buttons.remove(index);
        self.link_dirty = true;
        sink.emit(&AppEvent::ButtonDeleted { index });

        actuator::apply_modes(pins, &self.config.buttons);
        self.persist(store, sink)
    }

    /// Save the active config. On failure the in-memory state keeps the
    /// change and the error is surfaced to the requester.
    fn persist<S, E>(&self, store: &mut S, sink: &mut E) -> Result<(), CommandError>
    where
        S: ConfigStorePort,
        E: EventSink,
    {
        match store.save(&self.config) {
            Ok(()) => {
                sink.emit(&AppEvent::ConfigSaved {
                    buttons: self.config.buttons.len(),
                });
                Ok(())
            }
            Err(e) => {
                warn!("config save failed: {e}");
                sink.emit(&AppEvent::ConfigSaveFailed);
                Err(CommandError::Save(e))
            }
        }
    }

    /// Route one inbound bus message: pulse every output button whose
    /// topic matches, sequentially in list order. Returns the match
    /// count; zero matches is a silently ignored message.
    pub fn dispatch<P, D, E>(
        &self,
        topic: &str,
        pins: &mut P,
        delay: &mut D,
        sink: &mut E,
    ) -> usize
    where
        P: PinPort,
        D: DelayPort,
        E: EventSink,
    {
        let matched = router::matches(&self.config.buttons, topic);
        for &i in &matched {
            let button = &self.config.buttons[i];
            actuator::pulse(pins, delay, button);
            sink.emit(&AppEvent::Pulsed {
                name: button.name.clone(),
                pin: button.pin,
                duration_ms: button.duration_ms,
            });
        }
        sink.emit(&AppEvent::MessageRouted {
            topic: topic.to_owned(),
            matched: matched.len(),
        });
        matched.len()
    }

    /// Snapshot of every input button's logical state.
    pub fn input_states<P: PinPort>(&self, pins: &P) -> Vec<InputState> {
        status::input_states(pins, &self.config.buttons)
    }

    /// Labelled reading of both temperature sensor slots.
    pub fn temperatures<B: SensorBusPort>(&self, bus: &mut B) -> TemperatureReport {
        status::temperatures(bus, &self.config)
    }
}
