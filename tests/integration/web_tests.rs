//! Management surface handlers end to end against mock adapters:
//! form submission, delete, status JSON, trigger, restart.

use gpionode::app::service::NodeService;
use gpionode::config::{ButtonDefinition, DeviceConfig, PinMode};
use gpionode::web::{self, FormParams};

use crate::mock_hw::{MockBus, MockDelay, MockPins, MockStore, RecordingSink};

struct Harness {
    service: NodeService,
    store: MockStore,
    pins: MockPins,
    bus: MockBus,
    sink: RecordingSink,
}

impl Harness {
    fn boot(config: DeviceConfig) -> Self {
        let store = MockStore::with_config(config);
        let mut pins = MockPins::new();
        let mut bus = MockBus::new();
        let mut sink = RecordingSink::new();
        let service = NodeService::boot(&store, &mut pins, &mut bus, &mut sink);
        Self {
            service,
            store,
            pins,
            bus,
            sink,
        }
    }

    fn save(&mut self, body: &str) -> web::Response {
        let params = FormParams::parse(body);
        web::handle_save(
            &mut self.service,
            &params,
            &mut self.store,
            &mut self.pins,
            &mut self.bus,
            &mut self.sink,
        )
    }

    fn delete(&mut self, body: &str) -> web::Response {
        let params = FormParams::parse(body);
        web::handle_delete(
            &mut self.service,
            &params,
            &mut self.store,
            &mut self.pins,
            &mut self.bus,
            &mut self.sink,
        )
    }
}

fn config_with_button() -> DeviceConfig {
    let mut config = DeviceConfig::default();
    config.password = "secret-pass".into();
    config.buttons.push(ButtonDefinition {
        name: "Reset".into(),
        pin: 25,
        duration_ms: 1000,
        topic: "esp32/reset".into(),
        mode: PinMode::Output,
    });
    config
}

#[test]
fn save_form_replaces_config_and_persists() {
    let mut h = Harness::boot(DeviceConfig::default());

    let response = h.save(
        "ssid=HomeNet&password=password1&mqtt_server=broker.local\
         &sensor1_name=WATER\
         &button_name0=Reset&button_pin0=25&button_duration0=1000\
         &button_topic0=esp32%2Freset&button_mode0=3",
    );

    assert_eq!(response.status, 200);
    assert_eq!(response.body, "Config saved");
    let config = h.service.config();
    assert_eq!(config.ssid, "HomeNet");
    assert_eq!(config.mqtt_server, "broker.local");
    assert_eq!(config.sensor1_name, "WATER");
    // Untouched scalar keeps its default.
    assert_eq!(config.sensor2_name, "CHIPSET");
    assert_eq!(config.buttons.len(), 1);
    assert_eq!(config.buttons[0].topic, "esp32/reset");
    assert_eq!(h.store.save_count, 1);
    assert_eq!(h.pins.configured_mode(25), Some(PinMode::Output));
}

#[test]
fn save_form_with_index_gap_drops_the_tail() {
    let mut h = Harness::boot(DeviceConfig::default());

    // Rows 0, 1 and 3: row 3 sits past the gap and is never read.
    let response = h.save(
        "button_name0=a&button_pin0=10&button_duration0=100&button_topic0=t0&button_mode0=3\
         &button_name1=b&button_pin1=11&button_duration1=100&button_topic1=t1&button_mode1=3\
         &button_name3=d&button_pin3=13&button_duration3=100&button_topic3=t3&button_mode3=3",
    );

    assert_eq!(response.status, 200);
    let names: Vec<&str> = h
        .service
        .config()
        .buttons
        .iter()
        .map(|b| b.name.as_str())
        .collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[test]
fn save_form_with_bad_pin_is_rejected() {
    let mut h = Harness::boot(config_with_button());

    let response = h.save(
        "button_name0=x&button_pin0=99&button_duration0=10&button_topic0=t&button_mode0=3",
    );

    assert_eq!(response.status, 400);
    // Nothing changed, nothing persisted.
    assert_eq!(h.service.config().buttons[0].name, "Reset");
    assert_eq!(h.store.save_count, 0);
}

#[test]
fn save_form_with_unparseable_number_is_rejected() {
    let mut h = Harness::boot(DeviceConfig::default());
    let response = h.save(
        "button_name0=x&button_pin0=abc&button_duration0=10&button_topic0=t&button_mode0=3",
    );
    assert_eq!(response.status, 400);
}

#[test]
fn save_failure_reports_500_but_change_is_live() {
    let mut h = Harness::boot(DeviceConfig::default());
    h.store.fail_save = true;

    let response = h.save("sensor1_name=WATER");

    assert_eq!(response.status, 500);
    assert_eq!(h.service.config().sensor1_name, "WATER");
}

#[test]
fn delete_by_index_shifts_and_reports() {
    let mut config = config_with_button();
    config.buttons.push(ButtonDefinition {
        name: "Power".into(),
        pin: 26,
        duration_ms: 200,
        topic: "esp32/power".into(),
        mode: PinMode::Output,
    });
    let mut h = Harness::boot(config);

    let response = h.delete("index=0");

    assert_eq!(response.status, 200);
    assert_eq!(response.body, "Button deleted");
    assert_eq!(h.service.config().buttons.len(), 1);
    assert_eq!(h.service.config().buttons[0].name, "Power");
}

#[test]
fn delete_without_index_is_a_client_error() {
    let mut h = Harness::boot(config_with_button());
    let response = h.delete("");
    assert_eq!(response.status, 400);
    assert_eq!(response.body, "Index not provided");
}

#[test]
fn delete_with_invalid_index_is_a_client_error() {
    let mut h = Harness::boot(config_with_button());
    assert_eq!(h.delete("index=5").body, "Invalid index");
    assert_eq!(h.delete("index=-1").body, "Invalid index");
    assert_eq!(h.service.config().buttons.len(), 1);
}

#[test]
fn button_state_serializes_input_snapshot() {
    let mut config = config_with_button();
    config.buttons.push(ButtonDefinition {
        name: "lid".into(),
        pin: 32,
        duration_ms: 0,
        topic: String::new(),
        mode: PinMode::InputPullup,
    });
    let mut h = Harness::boot(config);
    h.pins.set_level(32, false);

    let response = web::handle_button_state(&h.service, &h.pins);

    assert_eq!(response.status, 200);
    assert_eq!(response.content_type, "application/json");
    let json: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["name"], "lid");
    assert_eq!(json[0]["pin"], 32);
    assert_eq!(json[0]["state"], true);
    assert_eq!(json[0]["id"], 1);
}

#[test]
fn temp_document_uses_fixed_slot_keys() {
    let mut h = Harness::boot(DeviceConfig::default());
    h.bus.temps = vec![42.25];

    let response = web::handle_temp(&h.service, &mut h.bus);

    assert_eq!(response.content_type, "application/json");
    let json: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(json["temp1"], 42.25);
    assert_eq!(json["temp2"], -127.0);
    // Labels belong to the config view, not this document.
    assert!(json.get("sensor1_name").is_none());
    assert_eq!(json.as_object().unwrap().len(), 2);
}

#[test]
fn config_view_redacts_secrets() {
    let h = Harness::boot(config_with_button());

    let response = web::handle_config_view(&h.service);

    let json: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(json["password"], "");
    assert_eq!(json["buttons"][0]["name"], "Reset");
    assert_eq!(json["buttons"][0]["duration"], 1000);
}

#[test]
fn trigger_pulses_an_ad_hoc_pin() {
    let mut pins = MockPins::new();
    let mut delay = MockDelay::new();
    let params = FormParams::parse("pin=13&duration=250");

    let response = web::handle_trigger(&params, &mut pins, &mut delay);

    assert_eq!(response.status, 200);
    assert_eq!(response.body, "PIN 13 Triggered for 250 ms");
    assert_eq!(pins.configured_mode(13), Some(PinMode::Output));
    assert_eq!(pins.writes_to(13), vec![true, false]);
    assert_eq!(delay.delays, vec![250]);
}

#[test]
fn trigger_validates_parameters() {
    let mut pins = MockPins::new();
    let mut delay = MockDelay::new();

    let missing = web::handle_trigger(&FormParams::parse("pin=13"), &mut pins, &mut delay);
    assert_eq!(missing.status, 400);
    assert_eq!(missing.body, "Invalid parameters");

    let out_of_range =
        web::handle_trigger(&FormParams::parse("pin=99&duration=10"), &mut pins, &mut delay);
    assert_eq!(out_of_range.status, 400);
    assert!(pins.calls.is_empty());
}

#[test]
fn restart_acknowledges_and_flags_the_service() {
    let mut h = Harness::boot(DeviceConfig::default());

    let response = web::handle_restart(
        &mut h.service,
        &mut h.store,
        &mut h.pins,
        &mut h.bus,
        &mut h.sink,
    );

    assert_eq!(response.status, 200);
    assert_eq!(response.body, "Restarting...");
    assert!(h.service.take_restart());
}
