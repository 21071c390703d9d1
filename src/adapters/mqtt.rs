//! Broker adapter: [`BrokerPort`] over the ESP-IDF MQTT client.
//!
//! Inbound messages arrive on the client's event task; the callback only
//! appends to a shared queue, which the main loop drains via
//! `take_messages`. That keeps all actuation on the single main task.

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::{BrokerError, BrokerParams, BrokerPort, InboundMessage};

#[cfg(not(target_os = "espidf"))]
use std::collections::VecDeque;

#[cfg(target_os = "espidf")]
use std::sync::{Arc, Mutex};

/// Default broker port when the configured host carries none.
pub const DEFAULT_MQTT_PORT: u16 = 1883;

/// How long `connect` waits for the broker session to come up before
/// reporting failure. Matches the supervisor's retry pacing.
#[cfg(target_os = "espidf")]
const CONNECT_TIMEOUT_MS: u64 = 5_000;

#[cfg(target_os = "espidf")]
#[derive(Default)]
struct Shared {
    connected: bool,
    inbox: std::collections::VecDeque<InboundMessage>,
}

pub struct MqttAdapter {
    #[cfg(target_os = "espidf")]
    client: Option<esp_idf_svc::mqtt::client::EspMqttClient<'static>>,
    #[cfg(target_os = "espidf")]
    shared: Arc<Mutex<Shared>>,

    #[cfg(not(target_os = "espidf"))]
    connected: bool,
    #[cfg(not(target_os = "espidf"))]
    subscriptions: Vec<String>,
    #[cfg(not(target_os = "espidf"))]
    inbox: VecDeque<InboundMessage>,
}

impl MqttAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(target_os = "espidf")]
            client: None,
            #[cfg(target_os = "espidf")]
            shared: Arc::new(Mutex::new(Shared::default())),

            #[cfg(not(target_os = "espidf"))]
            connected: false,
            #[cfg(not(target_os = "espidf"))]
            subscriptions: Vec::new(),
            #[cfg(not(target_os = "espidf"))]
            inbox: VecDeque::new(),
        }
    }

    /// `host` or `host:port`, normalised to a broker URL.
    fn broker_url(host: &str) -> String {
        if host.contains(':') {
            format!("mqtt://{host}")
        } else {
            format!("mqtt://{host}:{DEFAULT_MQTT_PORT}")
        }
    }

    /// Queue an inbound message (simulation only).
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_push(&mut self, topic: &str, payload: &[u8]) {
        self.inbox.push_back(InboundMessage {
            topic: topic.to_owned(),
            payload: payload.to_vec(),
        });
    }

    /// Drop the simulated session, as after a broker restart.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_disconnect(&mut self) {
        self.connected = false;
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_subscriptions(&self) -> &[String] {
        &self.subscriptions
    }
}

impl Default for MqttAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl BrokerPort for MqttAdapter {
    fn connect(&mut self, params: &BrokerParams) -> Result<(), BrokerError> {
        if params.host.is_empty() {
            return Err(BrokerError::ConnectFailed);
        }
        let url = Self::broker_url(&params.host);
        info!("broker connect: {url} as '{}'", params.client_id);

        #[cfg(target_os = "espidf")]
        {
            use esp_idf_svc::mqtt::client::{EspMqttClient, EventPayload, MqttClientConfiguration};

            // Tear down any previous session first.
            self.client = None;
            {
                let mut shared = self.shared.lock().unwrap();
                shared.connected = false;
                shared.inbox.clear();
            }

            let conf = MqttClientConfiguration {
                client_id: Some(params.client_id.as_str()),
                username: if params.username.is_empty() {
                    None
                } else {
                    Some(params.username.as_str())
                },
                password: if params.password.is_empty() {
                    None
                } else {
                    Some(params.password.as_str())
                },
                ..Default::default()
            };

            let shared = Arc::clone(&self.shared);
            let client = EspMqttClient::new_cb(&url, &conf, move |event| {
                let mut shared = shared.lock().unwrap();
                match event.payload() {
                    EventPayload::Connected(_) => shared.connected = true,
                    EventPayload::Disconnected => shared.connected = false,
                    EventPayload::Received { topic, data, .. } => {
                        if let Some(topic) = topic {
                            shared.inbox.push_back(InboundMessage {
                                topic: topic.to_owned(),
                                payload: data.to_vec(),
                            });
                        }
                    }
                    _ => {}
                }
            })
            .map_err(|e| {
                warn!("mqtt client create failed: {e}");
                BrokerError::ConnectFailed
            })?;
            self.client = Some(client);

            // The session comes up on the client's own task; wait for it
            // so the caller can subscribe straight away.
            let mut waited = 0;
            while waited < CONNECT_TIMEOUT_MS {
                if self.shared.lock().unwrap().connected {
                    return Ok(());
                }
                std::thread::sleep(std::time::Duration::from_millis(100));
                waited += 100;
            }
            self.client = None;
            Err(BrokerError::ConnectFailed)
        }

        #[cfg(not(target_os = "espidf"))]
        {
            self.connected = true;
            self.subscriptions.clear();
            Ok(())
        }
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), BrokerError> {
        info!("broker subscribe: '{topic}'");

        #[cfg(target_os = "espidf")]
        {
            use esp_idf_svc::mqtt::client::QoS;

            let client = self.client.as_mut().ok_or(BrokerError::NotConnected)?;
            client
                .subscribe(topic, QoS::AtMostOnce)
                .map(|_| ())
                .map_err(|e| {
                    warn!("subscribe '{topic}' failed: {e}");
                    BrokerError::SubscribeFailed
                })
        }

        #[cfg(not(target_os = "espidf"))]
        {
            if !self.connected {
                return Err(BrokerError::NotConnected);
            }
            self.subscriptions.push(topic.to_owned());
            Ok(())
        }
    }

    fn is_connected(&self) -> bool {
        #[cfg(target_os = "espidf")]
        {
            self.client.is_some() && self.shared.lock().unwrap().connected
        }

        #[cfg(not(target_os = "espidf"))]
        {
            self.connected
        }
    }

    fn take_messages(&mut self) -> Vec<InboundMessage> {
        #[cfg(target_os = "espidf")]
        {
            self.shared.lock().unwrap().inbox.drain(..).collect()
        }

        #[cfg(not(target_os = "espidf"))]
        {
            self.inbox.drain(..).collect()
        }
    }
}
