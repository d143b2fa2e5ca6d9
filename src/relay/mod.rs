// Signaling relay core
//
// Routing of chat, WebRTC signaling and latency pings between members of a
// room, plus the connect/disconnect lifecycle. Membership itself lives in
// `crate::room`.

// Public API - what other modules can use
pub use broadcast::BroadcastRelay;
pub use errors::RelayError;
pub use lifecycle::ConnectionLifecycle;
pub use models::{present_str, present_value, ChatMessage, SignalEnvelope, SignalKind};
pub use signal::SignalRouter;

// Internal modules
mod broadcast;
mod errors;
mod lifecycle;
pub mod models;
mod signal;
