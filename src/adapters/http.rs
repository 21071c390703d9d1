//! HTTP server adapter (target only): registers the management routes
//! onto the platform server and forwards them to [`crate::web`].
//!
//! Handlers run on the httpd task; all node state sits behind one mutex,
//! so a request that pulses a pin blocks every other request (and the
//! main loop) until the pulse completes. That is the intended
//! one-pulse-at-a-time behaviour.

use std::sync::{Arc, Mutex};

use embedded_svc::http::server::{Connection, Request};
use embedded_svc::io::{Read, Write};
use esp_idf_svc::http::server::{Configuration as HttpConfiguration, EspHttpServer};
use esp_idf_svc::http::Method;

use crate::adapters::fs_store::FsStoreAdapter;
use crate::adapters::gpio::GpioAdapter;
use crate::adapters::log_sink::LogEventSink;
use crate::adapters::onewire::OneWireAdapter;
use crate::adapters::time::TimeAdapter;
use crate::app::service::NodeService;
use crate::web::{self, FormParams, Response};

/// Everything a request handler may touch, behind one lock.
pub struct NodeRuntime {
    pub service: NodeService,
    pub store: FsStoreAdapter,
    pub gpio: GpioAdapter,
    pub bus: OneWireAdapter,
    pub time: TimeAdapter,
    pub sink: LogEventSink,
}

fn read_body<R: Read>(reader: &mut R) -> Result<Vec<u8>, anyhow::Error> {
    let mut body = Vec::new();
    let mut chunk = [0_u8; 256];
    loop {
        let n = reader
            .read(&mut chunk)
            .map_err(|e| anyhow::anyhow!("request read failed: {e:?}"))?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
        // Config forms are small; anything bigger is not ours.
        if body.len() > 8 * 1024 {
            anyhow::bail!("request body too large");
        }
    }
    Ok(body)
}

fn query_params(uri: &str) -> FormParams {
    let raw = uri.split_once('?').map_or("", |(_, q)| q);
    FormParams::parse(raw)
}

fn send<C: Connection>(req: Request<C>, response: &Response) -> Result<(), anyhow::Error> {
    let status_text = match response.status {
        200 => "OK",
        400 => "Bad Request",
        _ => "Internal Server Error",
    };
    let mut out = req
        .into_response(
            response.status,
            Some(status_text),
            &[("Content-Type", response.content_type)],
        )
        .map_err(|e| anyhow::anyhow!("response start failed: {e:?}"))?;
    out.write_all(response.body.as_bytes())
        .map_err(|e| anyhow::anyhow!("response write failed: {e:?}"))?;
    Ok(())
}

/// Bring up the management server and wire every route.
pub fn create_http_server(
    runtime: Arc<Mutex<NodeRuntime>>,
) -> Result<EspHttpServer<'static>, anyhow::Error> {
    let conf = HttpConfiguration {
        stack_size: 16 * 1024,
        ..Default::default()
    };
    let mut server = EspHttpServer::new(&conf)?;

    {
        let runtime = Arc::clone(&runtime);
        server.fn_handler::<anyhow::Error, _>("/config", Method::Get, move |req| {
            let rt = runtime.lock().unwrap();
            send(req, &web::handle_config_view(&rt.service))
        })?;
    }

    {
        let runtime = Arc::clone(&runtime);
        server.fn_handler::<anyhow::Error, _>("/button_state", Method::Get, move |req| {
            let rt = runtime.lock().unwrap();
            let response = web::handle_button_state(&rt.service, &rt.gpio);
            send(req, &response)
        })?;
    }

    {
        let runtime = Arc::clone(&runtime);
        server.fn_handler::<anyhow::Error, _>("/temp", Method::Get, move |req| {
            let mut rt = runtime.lock().unwrap();
            let rt = &mut *rt;
            let response = web::handle_temp(&rt.service, &mut rt.bus);
            send(req, &response)
        })?;
    }

    {
        let runtime = Arc::clone(&runtime);
        server.fn_handler::<anyhow::Error, _>("/trigger", Method::Get, move |req| {
            let params = query_params(req.uri());
            let mut rt = runtime.lock().unwrap();
            let rt = &mut *rt;
            let response = web::handle_trigger(&params, &mut rt.gpio, &mut rt.time);
            send(req, &response)
        })?;
    }

    {
        let runtime = Arc::clone(&runtime);
        server.fn_handler::<anyhow::Error, _>("/save", Method::Post, move |mut req| {
            let body = read_body(&mut req)?;
            let params = FormParams::parse(&String::from_utf8_lossy(&body));
            let mut rt = runtime.lock().unwrap();
            let rt = &mut *rt;
            let response = web::handle_save(
                &mut rt.service,
                &params,
                &mut rt.store,
                &mut rt.gpio,
                &mut rt.bus,
                &mut rt.sink,
            );
            send(req, &response)
        })?;
    }

    {
        let runtime = Arc::clone(&runtime);
        server.fn_handler::<anyhow::Error, _>("/deleteButton", Method::Post, move |mut req| {
            let body = read_body(&mut req)?;
            let params = FormParams::parse(&String::from_utf8_lossy(&body));
            let mut rt = runtime.lock().unwrap();
            let rt = &mut *rt;
            let response = web::handle_delete(
                &mut rt.service,
                &params,
                &mut rt.store,
                &mut rt.gpio,
                &mut rt.bus,
                &mut rt.sink,
            );
            send(req, &response)
        })?;
    }

    {
        let runtime = Arc::clone(&runtime);
        server.fn_handler::<anyhow::Error, _>("/restart", Method::Post, move |req| {
            let mut rt = runtime.lock().unwrap();
            let rt = &mut *rt;
            let response = web::handle_restart(
                &mut rt.service,
                &mut rt.store,
                &mut rt.gpio,
                &mut rt.bus,
                &mut rt.sink,
            );
            send(req, &response)
        })?;
    }

    Ok(server)
}
