//! GpioNode firmware — main entry point.
//!
//! Hexagonal layout: the domain core (`NodeService`, `LinkSupervisor`)
//! runs on the single main task and talks to hardware exclusively
//! through port traits. HTTP handlers run on the httpd task but share
//! the same state behind one mutex, so at most one actuation is in
//! flight at any time — a pulse blocks everything else for its
//! duration, by contract.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use log::info;

use esp_idf_hal::delay::FreeRtos;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::prelude::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::EspWifi;

use gpionode::adapters::device_id::DeviceIdentity;
use gpionode::adapters::fs_store::FsStoreAdapter;
use gpionode::adapters::gpio::GpioAdapter;
use gpionode::adapters::http::{create_http_server, NodeRuntime};
use gpionode::adapters::log_sink::LogEventSink;
use gpionode::adapters::mqtt::MqttAdapter;
use gpionode::adapters::onewire::OneWireAdapter;
use gpionode::adapters::time::TimeAdapter;
use gpionode::adapters::wifi::WifiAdapter;
use gpionode::app::ports::ConnectivityPort;
use gpionode::app::service::NodeService;
use gpionode::link::LinkSupervisor;

/// Main loop cadence. Everything (broker pump, link supervision,
/// restart handling) runs on this tick.
const LOOP_INTERVAL_MS: u32 = 100;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    info!("GpioNode v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Device identity ────────────────────────────────────
    let identity = DeviceIdentity::resolve();
    info!("Device ID: {} (hostname: {})", identity.id, identity.hostname);

    // ── 3. Peripherals and radio ──────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let esp_wifi = EspWifi::new(peripherals.modem, sysloop, Some(nvs))?;
    let mut wifi = WifiAdapter::new(esp_wifi, identity.id.as_str());

    // ── 4. Storage, hardware ports, domain service ────────────
    let store = FsStoreAdapter::new();
    let mut gpio = GpioAdapter::new();
    let mut bus = OneWireAdapter::new();
    let mut sink = LogEventSink::new();
    let service = NodeService::boot(&store, &mut gpio, &mut bus, &mut sink);

    // Stage station credentials from the loaded config; with none the
    // supervisor stays in provisioning and only the AP comes up.
    {
        let config = service.config();
        wifi.set_credentials(&config.ssid, &config.password);
    }
    if !wifi.has_credentials() {
        wifi.start_provisioning();
    }

    // ── 5. Shared runtime + management server ─────────────────
    let runtime = Arc::new(Mutex::new(NodeRuntime {
        service,
        store,
        gpio,
        bus,
        time: TimeAdapter::new(),
        sink,
    }));
    let _server = create_http_server(Arc::clone(&runtime))?;

    // ── 6. Link layer ─────────────────────────────────────────
    let mut broker = MqttAdapter::new();
    let mut link = LinkSupervisor::new(identity.id.as_str().to_owned());

    info!("System ready. Entering event loop.");

    // ── 7. Event loop ─────────────────────────────────────────
    loop {
        let restart = {
            let mut rt = runtime.lock().unwrap();
            let rt = &mut *rt;
            let now_ms = rt.time.uptime_ms();
            link.poll(
                now_ms,
                &mut wifi,
                &mut broker,
                &mut rt.service,
                &mut rt.gpio,
                &mut rt.time,
                &mut rt.sink,
            );
            rt.service.take_restart()
        };

        if restart {
            // Give the httpd task a moment to flush the response.
            FreeRtos::delay_ms(500);
            unsafe { esp_idf_svc::sys::esp_restart() };
        }

        FreeRtos::delay_ms(LOOP_INTERVAL_MS);
    }
}
