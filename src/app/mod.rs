//! Domain core: configuration service, actuation, routing and status,
//! all behind the port traits in [`ports`].

pub mod actuator;
pub mod commands;
pub mod events;
pub mod ports;
pub mod router;
pub mod service;
pub mod status;
