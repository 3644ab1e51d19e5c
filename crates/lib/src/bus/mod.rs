//! Message bus adapter (MQTT).
//!
//! The adapter owns the connection and receive loop; every inbound payload on
//! the input topic goes through [`route_payload`], which dispatches it and
//! hands any reply to a [`Publisher`].

mod mqtt;
mod publisher;

pub use mqtt::{MqttBus, MqttPublisher};
pub use publisher::{route_payload, Publisher, RouteOutcome};
