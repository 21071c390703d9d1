//! Structured domain events.
//!
//! Every externally observable decision of the core emits one of these
//! through the [`EventSink`](super::ports::EventSink) port. Adapters turn
//! them into log lines; tests assert on them directly.

use crate::link::LinkState;

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Boot-time config load outcome. `fallback` is true when storage
    /// failed and factory defaults were substituted.
    ConfigLoaded { buttons: usize, fallback: bool },
    /// Config document written to storage.
    ConfigSaved { buttons: usize },
    /// A mutation was accepted but persisting it failed; the in-memory
    /// config still carries the change.
    ConfigSaveFailed,
    /// A button was removed at `index`; later buttons shifted left.
    ButtonDeleted { index: usize },
    /// One pulse executed: pin driven high for `duration_ms` then low.
    Pulsed { name: String, pin: u8, duration_ms: u64 },
    /// An inbound bus message matched `matched` configured topics.
    MessageRouted { topic: String, matched: usize },
    /// Connectivity supervisor transition.
    LinkChanged { from: LinkState, to: LinkState },
    /// Broker (re)connect attempt failed; next retry after the backoff.
    BrokerRetry,
    /// A restart was requested through the management surface.
    RestartRequested,
}
