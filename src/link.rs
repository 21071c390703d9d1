//! Connectivity supervisor: station link, broker session, inbound
//! message pump.
//!
//! Single state machine polled from the main loop. It never blocks on
//! the network; broker reconnects are paced by a wall-clock backoff so
//! the loop keeps servicing the management surface while the broker is
//! unreachable.

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{BrokerPort, ConnectivityPort, DelayPort, EventSink, PinPort};
use crate::app::service::NodeService;

/// Pause between broker connect attempts.
pub const BROKER_RETRY_MS: u64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No station credentials; the open provisioning AP is up and the
    /// management surface is the only way in.
    Provisioning,
    /// Credentials staged, station association in progress.
    Connecting,
    /// Station link up, broker session down (connecting or backing off).
    BrokerDown,
    /// Fully attached: station up, broker session up, subscriptions live.
    BrokerUp,
}

impl core::fmt::Display for LinkState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            Self::Provisioning => "provisioning",
            Self::Connecting => "connecting",
            Self::BrokerDown => "broker-down",
            Self::BrokerUp => "broker-up",
        };
        f.write_str(s)
    }
}

pub struct LinkSupervisor {
    state: LinkState,
    /// Earliest `now_ms` at which the next broker connect may run.
    next_broker_attempt_ms: u64,
    device_id: String,
}

impl LinkSupervisor {
    pub fn new(device_id: String) -> Self {
        Self {
            state: LinkState::Provisioning,
            next_broker_attempt_ms: 0,
            device_id,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    fn transition<E: EventSink>(&mut self, to: LinkState, sink: &mut E) {
        if self.state == to {
            return;
        }
        info!("link: {} -> {}", self.state, to);
        sink.emit(&AppEvent::LinkChanged {
            from: self.state,
            to,
        });
        self.state = to;
    }

    /// One supervisor step. Call from the main loop at its regular
    /// cadence; `now_ms` is a monotonic millisecond clock.
    #[allow(clippy::too_many_arguments)]
    pub fn poll<W, B, P, D, E>(
        &mut self,
        now_ms: u64,
        wifi: &mut W,
        broker: &mut B,
        node: &mut NodeService,
        pins: &mut P,
        delay: &mut D,
        sink: &mut E,
    ) where
        W: ConnectivityPort,
        B: BrokerPort,
        P: PinPort,
        D: DelayPort,
        E: EventSink,
    {
        if node.take_link_dirty() {
            // One step per poll: the regular machine resumes next tick.
            self.apply_config_change(wifi, node, sink);
            return;
        }

        match self.state {
            LinkState::Provisioning => {
                if wifi.has_credentials() {
                    wifi.stop_provisioning();
                    wifi.connect();
                    self.transition(LinkState::Connecting, sink);
                }
            }
            LinkState::Connecting => {
                if !wifi.has_credentials() {
                    wifi.start_provisioning();
                    self.transition(LinkState::Provisioning, sink);
                } else if wifi.is_connected() {
                    self.next_broker_attempt_ms = now_ms;
                    self.transition(LinkState::BrokerDown, sink);
                }
            }
            LinkState::BrokerDown => {
                if !wifi.is_connected() {
                    wifi.connect();
                    self.transition(LinkState::Connecting, sink);
                } else if now_ms >= self.next_broker_attempt_ms {
                    self.try_broker(now_ms, broker, node, sink);
                }
            }
            LinkState::BrokerUp => {
                if !wifi.is_connected() {
                    wifi.connect();
                    self.transition(LinkState::Connecting, sink);
                } else if !broker.is_connected() {
                    warn!("broker session lost");
                    self.next_broker_attempt_ms = now_ms;
                    self.transition(LinkState::BrokerDown, sink);
                } else {
                    self.pump_messages(broker, node, pins, delay, sink);
                }
            }
        }
    }

    /// Config mutation touched credentials, the broker, or the
    /// subscription set. Re-stage credentials and force a fresh
    /// attach; subscriptions are re-issued on the broker reconnect.
    fn apply_config_change<W, E>(&mut self, wifi: &mut W, node: &NodeService, sink: &mut E)
    where
        W: ConnectivityPort,
        E: EventSink,
    {
        let config = node.config();
        wifi.set_credentials(&config.ssid, &config.password);
        if wifi.has_credentials() {
            if self.state == LinkState::Provisioning {
                wifi.stop_provisioning();
            }
            wifi.connect();
            self.transition(LinkState::Connecting, sink);
        } else {
            wifi.start_provisioning();
            self.transition(LinkState::Provisioning, sink);
        }
    }

    fn try_broker<B, E>(&mut self, now_ms: u64, broker: &mut B, node: &NodeService, sink: &mut E)
    where
        B: BrokerPort,
        E: EventSink,
    {
        let params = node.broker_params(&self.device_id);
        match broker.connect(&params) {
            Ok(()) => {
                // Subscriptions do not survive the old session; the
                // full set goes out on every connect.
                for topic in node.subscription_topics() {
                    if let Err(e) = broker.subscribe(topic) {
                        warn!("subscribe '{topic}' failed: {e}");
                    }
                }
                info!("broker session up ({})", params.host);
                self.transition(LinkState::BrokerUp, sink);
            }
            Err(e) => {
                debug!("broker connect failed: {e}");
                sink.emit(&AppEvent::BrokerRetry);
                self.next_broker_attempt_ms = now_ms + BROKER_RETRY_MS;
            }
        }
    }

    fn pump_messages<B, P, D, E>(
        &mut self,
        broker: &mut B,
        node: &NodeService,
        pins: &mut P,
        delay: &mut D,
        sink: &mut E,
    ) where
        B: BrokerPort,
        P: PinPort,
        D: DelayPort,
        E: EventSink,
    {
        for message in broker.take_messages() {
            debug!(
                "inbound '{}' ({} bytes)",
                message.topic,
                message.payload.len()
            );
            node.dispatch(&message.topic, pins, delay, sink);
        }
    }
}
