//! Inbound dispatch: decode, match against the registry, build the reply.
//!
//! Pure: no I/O and no mutable state, so one dispatcher can serve every
//! message for the life of the connection. Publishing is the bus adapter's job.

use crate::message::{DecodeError, InboundMessage, OutboundMessage};
use crate::responders::ResponderRegistry;
use std::sync::Arc;

/// Name this module reports in the `module` field of its replies.
pub const DEFAULT_MODULE_NAME: &str = "module2";

#[derive(Debug, Clone)]
pub struct Dispatcher {
    module: String,
    registry: Arc<ResponderRegistry>,
}

impl Dispatcher {
    pub fn new(module: impl Into<String>, registry: Arc<ResponderRegistry>) -> Self {
        Self {
            module: module.into(),
            registry,
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn registry(&self) -> &ResponderRegistry {
        &self.registry
    }

    /// Handle one raw payload. `Ok(None)` means nothing to publish.
    pub fn handle(&self, raw: &[u8]) -> Result<Option<OutboundMessage>, DecodeError> {
        let inbound = InboundMessage::decode(raw)?;
        Ok(self.handle_message(&inbound))
    }

    /// Match an already decoded message. Messages sent by this module itself are ignored.
    pub fn handle_message(&self, inbound: &InboundMessage) -> Option<OutboundMessage> {
        // The gateway stamps chat traffic with `module: "gowon"` and sibling modules
        // use their own names, so only replies this module published can match here.
        if inbound.module.as_deref() == Some(self.module.as_str()) {
            log::debug!("dispatch: ignoring message from own module {}", self.module);
            return None;
        }
        let reply = self.registry.lookup(&inbound.text)?;
        Some(OutboundMessage::reply_to(&self.module, reply, inbound))
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_MODULE_NAME, Arc::new(ResponderRegistry::builtin()))
    }
}
