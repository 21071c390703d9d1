//! Management surface request handling, platform independent.
//!
//! The espidf HTTP adapter does nothing but decode the request into
//! [`FormParams`] and hand it to these functions; everything testable
//! lives here. Responses are plain text or JSON only.

use crate::app::actuator;
use crate::app::commands::{Command, ConfigUpdate};
use crate::app::ports::{ConfigStorePort, DelayPort, EventSink, PinPort, SensorBusPort};
use crate::app::service::{CommandError, NodeService};
use crate::config::{ButtonDefinition, PinMode};
use crate::error::ValidationError;
use crate::pins;

/// A finished HTTP response, ready for the platform server to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Response {
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: body.into(),
        }
    }

    pub fn json(body: String) -> Self {
        Self {
            status: 200,
            content_type: "application/json",
            body,
        }
    }

    fn bad_request(err: &ValidationError) -> Self {
        Self::text(400, err.to_string())
    }
}

/// Decoded request parameters (form body or query string).
/// Later duplicates win, matching common form-encoder behaviour.
#[derive(Debug, Default, Clone)]
pub struct FormParams {
    entries: Vec<(String, String)>,
}

impl FormParams {
    /// Parse an `application/x-www-form-urlencoded` body or query string.
    pub fn parse(raw: &str) -> Self {
        let mut entries = Vec::new();
        for pair in raw.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            entries.push((percent_decode(key), percent_decode(value)));
        }
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn get_number<T: core::str::FromStr>(
        &self,
        key: &'static str,
    ) -> Result<Option<T>, ValidationError> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| ValidationError::BadNumber(key)),
        }
    }
}

/// Minimal percent-decoding: `+` is a space, `%XX` is a byte. Invalid
/// escapes pass through verbatim rather than failing the request.
fn percent_decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' => {
                if let (Some(hi), Some(lo)) = (
                    bytes.get(i + 1).and_then(|b| (*b as char).to_digit(16)),
                    bytes.get(i + 2).and_then(|b| (*b as char).to_digit(16)),
                ) {
                    out.push((hi * 16 + lo) as u8);
                    i += 3;
                } else {
                    out.push(b'%');
                    i += 1;
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Collect `button_name{i}`/`button_pin{i}`/`button_duration{i}`/
/// `button_topic{i}`/`button_mode{i}` groups, starting at 0 and stopping
/// at the first index with any field missing. Indices past a gap are
/// never read; the submitted form defines the complete new list.
pub fn parse_button_rows(params: &FormParams) -> Result<Vec<ButtonDefinition>, ValidationError> {
    let mut buttons = Vec::new();
    for i in 0.. {
        let name = params.get(&format!("button_name{i}"));
        let pin = params.get(&format!("button_pin{i}"));
        let duration = params.get(&format!("button_duration{i}"));
        let topic = params.get(&format!("button_topic{i}"));
        let mode = params.get(&format!("button_mode{i}"));
        let (Some(name), Some(pin), Some(duration), Some(topic), Some(mode)) =
            (name, pin, duration, topic, mode)
        else {
            break;
        };

        let pin: u8 = pin
            .parse()
            .map_err(|_| ValidationError::BadNumber("button_pin"))?;
        let duration_ms: u64 = duration
            .parse()
            .map_err(|_| ValidationError::BadNumber("button_duration"))?;
        let mode_code: u8 = mode
            .parse()
            .map_err(|_| ValidationError::BadNumber("button_mode"))?;
        let mode =
            PinMode::try_from(mode_code).map_err(|_| ValidationError::BadNumber("button_mode"))?;

        buttons.push(ButtonDefinition {
            name: name.to_owned(),
            pin,
            duration_ms,
            topic: topic.to_owned(),
            mode,
        });
    }
    Ok(buttons)
}

/// Build a [`ConfigUpdate`] from a save-form submission. Scalar fields
/// are overwritten only when present; the button list is always
/// replaced with whatever rows the form carried (possibly none).
pub fn build_update(params: &FormParams) -> Result<ConfigUpdate, ValidationError> {
    Ok(ConfigUpdate {
        ssid: params.get("ssid").map(str::to_owned),
        password: params.get("password").map(str::to_owned),
        mqtt_server: params.get("mqtt_server").map(str::to_owned),
        mqtt_user: params.get("mqtt_user").map(str::to_owned),
        mqtt_password: params.get("mqtt_password").map(str::to_owned),
        sensor1_name: params.get("sensor1_name").map(str::to_owned),
        sensor2_name: params.get("sensor2_name").map(str::to_owned),
        onewire_bus_pin: params.get_number("oneWireBus_pin")?,
        buttons: Some(parse_button_rows(params)?),
    })
}

/// `POST /save`
pub fn handle_save<S, P, B, E>(
    service: &mut NodeService,
    params: &FormParams,
    store: &mut S,
    pins: &mut P,
    bus: &mut B,
    sink: &mut E,
) -> Response
where
    S: ConfigStorePort,
    P: PinPort,
    B: SensorBusPort,
    E: EventSink,
{
    let update = match build_update(params) {
        Ok(update) => update,
        Err(e) => return Response::bad_request(&e),
    };
    match service.handle_command(Command::UpdateConfig(update), store, pins, bus, sink) {
        Ok(()) => Response::text(200, "Config saved"),
        Err(CommandError::Validation(e)) => Response::bad_request(&e),
        Err(CommandError::Save(_)) => Response::text(500, "Config applied but not persisted"),
    }
}

/// `POST /deleteButton`
pub fn handle_delete<S, P, B, E>(
    service: &mut NodeService,
    params: &FormParams,
    store: &mut S,
    pins: &mut P,
    bus: &mut B,
    sink: &mut E,
) -> Response
where
    S: ConfigStorePort,
    P: PinPort,
    B: SensorBusPort,
    E: EventSink,
{
    let Some(raw) = params.get("index") else {
        return Response::text(400, "Index not provided");
    };
    let Ok(index) = raw.parse::<usize>() else {
        return Response::text(400, "Invalid index");
    };
    match service.handle_command(Command::DeleteButton { index }, store, pins, bus, sink) {
        Ok(()) => Response::text(200, "Button deleted"),
        Err(CommandError::Validation(_)) => Response::text(400, "Invalid index"),
        Err(CommandError::Save(_)) => Response::text(500, "Button removed but not persisted"),
    }
}

/// `GET /button_state`
pub fn handle_button_state<P: PinPort>(service: &NodeService, pins: &P) -> Response {
    match serde_json::to_string(&service.input_states(pins)) {
        Ok(body) => Response::json(body),
        Err(_) => Response::text(500, "serialization failed"),
    }
}

/// `GET /temp` — the two bus slots under the fixed keys clients read.
/// Display labels are not part of this document; they come from `/config`.
pub fn handle_temp<B: SensorBusPort>(service: &NodeService, bus: &mut B) -> Response {
    let report = service.temperatures(bus);
    let body = serde_json::json!({
        "temp1": report.sensor1_temp,
        "temp2": report.sensor2_temp,
    });
    Response::json(body.to_string())
}

/// `GET /config` — active config with secrets blanked.
pub fn handle_config_view(service: &NodeService) -> Response {
    match serde_json::to_string(&service.config().redacted()) {
        Ok(body) => Response::json(body),
        Err(_) => Response::text(500, "serialization failed"),
    }
}

/// `GET /trigger?pin=N&duration=MS` — ad-hoc pulse outside the
/// configured button list. The pin is range-checked here because the
/// save-time validation never saw it.
pub fn handle_trigger<P, D>(params: &FormParams, pins_port: &mut P, delay: &mut D) -> Response
where
    P: PinPort,
    D: DelayPort,
{
    let (Some(pin), Some(duration)) = (params.get("pin"), params.get("duration")) else {
        return Response::text(400, "Invalid parameters");
    };
    let (Ok(pin), Ok(duration_ms)) = (pin.parse::<u8>(), duration.parse::<u64>()) else {
        return Response::text(400, "Invalid parameters");
    };
    if !pins::in_range(pin) {
        return Response::bad_request(&ValidationError::PinOutOfRange(pin));
    }
    actuator::pulse_raw(pins_port, delay, pin, duration_ms);
    Response::text(200, format!("PIN {pin} Triggered for {duration_ms} ms"))
}

/// `POST /restart`
pub fn handle_restart<S, P, B, E>(
    service: &mut NodeService,
    store: &mut S,
    pins: &mut P,
    bus: &mut B,
    sink: &mut E,
) -> Response
where
    S: ConfigStorePort,
    P: PinPort,
    B: SensorBusPort,
    E: EventSink,
{
    // Restart never fails validation or persistence.
    let _ = service.handle_command(Command::Restart, store, pins, bus, sink);
    Response::text(200, "Restarting...")
}
