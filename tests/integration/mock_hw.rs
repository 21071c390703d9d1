//! Mock adapters for integration tests.
//!
//! Each mock records every port call so tests can assert on the full
//! hardware history without touching real GPIO or network stacks.

use std::collections::{HashMap, VecDeque};

use gpionode::app::events::AppEvent;
use gpionode::app::ports::{
    BrokerError, BrokerParams, BrokerPort, ConfigStorePort, ConnectivityPort, DelayPort, EventSink,
    InboundMessage, LoadError, PinPort, SaveError, SensorBusPort, DISCONNECTED_C,
};
use gpionode::config::{DeviceConfig, PinMode};

// ── Pin call record ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinCall {
    Configure { pin: u8, mode: PinMode },
    Write { pin: u8, level: bool },
}

pub struct MockPins {
    pub calls: Vec<PinCall>,
    levels: HashMap<u8, bool>,
}

#[allow(dead_code)]
impl MockPins {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            levels: HashMap::new(),
        }
    }

    /// Force a raw electrical level for subsequent reads.
    pub fn set_level(&mut self, pin: u8, level: bool) {
        self.levels.insert(pin, level);
    }

    /// Levels written to `pin`, in order.
    pub fn writes_to(&self, pin: u8) -> Vec<bool> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                PinCall::Write { pin: p, level } if *p == pin => Some(*level),
                _ => None,
            })
            .collect()
    }

    pub fn configured_mode(&self, pin: u8) -> Option<PinMode> {
        self.calls.iter().rev().find_map(|c| match c {
            PinCall::Configure { pin: p, mode } if *p == pin => Some(*mode),
            _ => None,
        })
    }
}

impl Default for MockPins {
    fn default() -> Self {
        Self::new()
    }
}

impl PinPort for MockPins {
    fn configure(&mut self, pin: u8, mode: PinMode) {
        self.calls.push(PinCall::Configure { pin, mode });
    }

    fn write(&mut self, pin: u8, level: bool) {
        self.calls.push(PinCall::Write { pin, level });
        self.levels.insert(pin, level);
    }

    fn read(&self, pin: u8) -> bool {
        self.levels.get(&pin).copied().unwrap_or(false)
    }
}

// ── Delay recorder ────────────────────────────────────────────

#[derive(Default)]
pub struct MockDelay {
    pub delays: Vec<u64>,
}

#[allow(dead_code)]
impl MockDelay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DelayPort for MockDelay {
    fn delay_ms(&mut self, ms: u64) {
        self.delays.push(ms);
    }
}

// ── Config store ──────────────────────────────────────────────

pub struct MockStore {
    pub stored: Option<DeviceConfig>,
    pub load_error: Option<LoadError>,
    pub fail_save: bool,
    pub save_count: usize,
}

#[allow(dead_code)]
impl MockStore {
    pub fn new() -> Self {
        Self {
            stored: None,
            load_error: None,
            fail_save: false,
            save_count: 0,
        }
    }

    pub fn with_config(config: DeviceConfig) -> Self {
        Self {
            stored: Some(config),
            ..Self::new()
        }
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStorePort for MockStore {
    fn load(&self) -> Result<DeviceConfig, LoadError> {
        if let Some(e) = self.load_error {
            return Err(e);
        }
        Ok(self.stored.clone().unwrap_or_default())
    }

    fn save(&mut self, config: &DeviceConfig) -> Result<(), SaveError> {
        if self.fail_save {
            return Err(SaveError::Write);
        }
        self.stored = Some(config.clone());
        self.save_count += 1;
        Ok(())
    }
}

// ── Sensor bus ────────────────────────────────────────────────

pub struct MockBus {
    pub bound_pin: Option<u8>,
    pub temps: Vec<f32>,
    pub conversions: usize,
    pub rebinds: usize,
}

#[allow(dead_code)]
impl MockBus {
    pub fn new() -> Self {
        Self {
            bound_pin: None,
            temps: Vec::new(),
            conversions: 0,
            rebinds: 0,
        }
    }
}

impl Default for MockBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorBusPort for MockBus {
    fn rebind(&mut self, pin: u8) {
        self.bound_pin = Some(pin);
        self.rebinds += 1;
    }

    fn request_conversion(&mut self) {
        self.conversions += 1;
    }

    fn read_celsius(&mut self, index: usize) -> f32 {
        self.temps.get(index).copied().unwrap_or(DISCONNECTED_C)
    }
}

// ── Broker ────────────────────────────────────────────────────

pub struct MockBroker {
    pub connected: bool,
    pub fail_connect: bool,
    pub connects: Vec<BrokerParams>,
    pub subscriptions: Vec<String>,
    pub inbox: VecDeque<InboundMessage>,
}

#[allow(dead_code)]
impl MockBroker {
    pub fn new() -> Self {
        Self {
            connected: false,
            fail_connect: false,
            connects: Vec::new(),
            subscriptions: Vec::new(),
            inbox: VecDeque::new(),
        }
    }

    pub fn push_message(&mut self, topic: &str, payload: &[u8]) {
        self.inbox.push_back(InboundMessage {
            topic: topic.to_owned(),
            payload: payload.to_vec(),
        });
    }
}

impl Default for MockBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl BrokerPort for MockBroker {
    fn connect(&mut self, params: &BrokerParams) -> Result<(), BrokerError> {
        self.connects.push(params.clone());
        if self.fail_connect {
            return Err(BrokerError::ConnectFailed);
        }
        // A fresh session never inherits old subscriptions.
        self.subscriptions.clear();
        self.connected = true;
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), BrokerError> {
        if !self.connected {
            return Err(BrokerError::NotConnected);
        }
        self.subscriptions.push(topic.to_owned());
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn take_messages(&mut self) -> Vec<InboundMessage> {
        self.inbox.drain(..).collect()
    }
}

// ── Station radio ─────────────────────────────────────────────

pub struct MockWifi {
    pub ssid: String,
    pub password: String,
    pub connected: bool,
    pub provisioning: bool,
    pub connect_calls: usize,
    /// When set, `connect` brings the link up immediately.
    pub auto_up: bool,
}

#[allow(dead_code)]
impl MockWifi {
    pub fn new() -> Self {
        Self {
            ssid: String::new(),
            password: String::new(),
            connected: false,
            provisioning: false,
            connect_calls: 0,
            auto_up: true,
        }
    }

    pub fn with_credentials(ssid: &str) -> Self {
        Self {
            ssid: ssid.to_owned(),
            ..Self::new()
        }
    }
}

impl Default for MockWifi {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectivityPort for MockWifi {
    fn has_credentials(&self) -> bool {
        !self.ssid.is_empty()
    }

    fn set_credentials(&mut self, ssid: &str, password: &str) {
        self.ssid = ssid.to_owned();
        self.password = password.to_owned();
    }

    fn connect(&mut self) {
        self.connect_calls += 1;
        if self.auto_up {
            self.connected = true;
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn start_provisioning(&mut self) {
        self.provisioning = true;
    }

    fn stop_provisioning(&mut self) {
        self.provisioning = false;
    }
}

// ── Event recorder ────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, wanted: &AppEvent) -> bool {
        self.events.iter().any(|e| e == wanted)
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
