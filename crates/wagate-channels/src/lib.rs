//! # wagate-channels
//!
//! Messaging client integration for wagate: the automation bridge client,
//! the session lifecycle relay, group lookup, and the inbound webhook.

pub mod bridge;
pub mod groups;
pub mod qr;
pub mod relay;
pub mod session;
pub mod webhook;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use bridge::BridgeClient;
pub use relay::{Relay, SocketEvent, Subscription};
pub use session::SessionState;
pub use webhook::WebhookForwarder;
