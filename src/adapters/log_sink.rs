//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::ConfigLoaded { buttons, fallback } => {
                if *fallback {
                    warn!("CONFIG | load failed, defaults active ({buttons} buttons)");
                } else {
                    info!("CONFIG | loaded, {buttons} button(s)");
                }
            }
            AppEvent::ConfigSaved { buttons } => {
                info!("CONFIG | saved, {buttons} button(s)");
            }
            AppEvent::ConfigSaveFailed => {
                warn!("CONFIG | save failed, change held in memory only");
            }
            AppEvent::ButtonDeleted { index } => {
                info!("CONFIG | button {index} deleted");
            }
            AppEvent::Pulsed {
                name,
                pin,
                duration_ms,
            } => {
                info!("PULSE | '{name}' gpio{pin} for {duration_ms}ms");
            }
            AppEvent::MessageRouted { topic, matched } => {
                info!("ROUTE | '{topic}' matched {matched} button(s)");
            }
            AppEvent::LinkChanged { from, to } => {
                info!("LINK | {from} -> {to}");
            }
            AppEvent::BrokerRetry => {
                info!("LINK | broker unreachable, retrying");
            }
            AppEvent::RestartRequested => {
                warn!("SYS | restart requested");
            }
        }
    }
}
