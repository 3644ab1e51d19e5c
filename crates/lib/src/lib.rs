//! Gowon module2 — replies to trigger phrases seen on the gowon message bus.
//!
//! Inbound chat messages arrive as JSON on an MQTT input topic; the first
//! matching trigger's reply is published on the output topic with the
//! sender's destination echoed back.

pub mod bus;
pub mod config;
pub mod dispatch;
pub mod format;
pub mod init;
pub mod message;
pub mod responders;
pub mod service;

pub use dispatch::Dispatcher;
pub use message::{DecodeError, InboundMessage, OutboundMessage};
pub use responders::{ResponderRegistry, Trigger};
