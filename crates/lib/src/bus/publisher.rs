//! Publisher seam and the per-message route step (dispatch, then publish).

use crate::dispatch::Dispatcher;
use async_trait::async_trait;

/// Sends a payload to a topic. Implemented by the MQTT client; tests use a recorder.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), String>;
}

/// What happened to one inbound payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// A reply was handed to the publisher.
    Published,
    /// Decoded fine; no trigger matched (or the message was our own).
    NoMatch,
    /// Payload could not be decoded; dropped.
    Dropped,
    /// Reply could not be encoded or published; dropped.
    PublishFailed,
}

/// Dispatch `payload` and publish the reply (if any) to `output_topic`.
/// Never fails: every per-message problem is logged and the message is dropped.
pub async fn route_payload<P>(
    dispatcher: &Dispatcher,
    publisher: &P,
    output_topic: &str,
    payload: &[u8],
) -> RouteOutcome
where
    P: Publisher + ?Sized,
{
    let reply = match dispatcher.handle(payload) {
        Ok(Some(reply)) => reply,
        Ok(None) => {
            log::debug!("route: no trigger matched");
            return RouteOutcome::NoMatch;
        }
        Err(e) => {
            log::warn!("route: dropping message: {}", e);
            return RouteOutcome::Dropped;
        }
    };
    let body = match reply.to_payload() {
        Ok(b) => b,
        Err(e) => {
            log::warn!("route: encoding reply failed: {}", e);
            return RouteOutcome::PublishFailed;
        }
    };
    match publisher.publish(output_topic, body).await {
        Ok(()) => {
            log::info!("route: replied to {} on {}", reply.dest, output_topic);
            RouteOutcome::Published
        }
        Err(e) => {
            log::warn!("route: publish to {} failed: {}", output_topic, e);
            RouteOutcome::PublishFailed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<(String, Vec<u8>)>>,
    }

    #[async_trait]
    impl Publisher for Recorder {
        async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), String> {
            self.sent.lock().unwrap().push((topic.to_string(), payload));
            Ok(())
        }
    }

    struct Refusing;

    #[async_trait]
    impl Publisher for Refusing {
        async fn publish(&self, _topic: &str, _payload: Vec<u8>) -> Result<(), String> {
            Err("request queue full".to_string())
        }
    }

    #[tokio::test]
    async fn matched_message_is_published_to_output_topic() {
        let d = Dispatcher::default();
        let p = Recorder::default();
        let outcome = route_payload(&d, &p, "/gowon/output", br#"{"msg":"no sana","dest":"userA"}"#).await;
        assert_eq!(outcome, RouteOutcome::Published);

        let sent = p.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "/gowon/output");
        assert_eq!(
            String::from_utf8(sent[0].1.clone()).unwrap(),
            r#"{"module":"module2","msg":"no life","dest":"userA"}"#
        );
    }

    #[tokio::test]
    async fn unmatched_and_malformed_publish_nothing() {
        let d = Dispatcher::default();
        let p = Recorder::default();
        assert_eq!(
            route_payload(&d, &p, "out", br#"{"msg":"hello there","dest":"x"}"#).await,
            RouteOutcome::NoMatch
        );
        assert_eq!(route_payload(&d, &p, "out", b"garbage").await, RouteOutcome::Dropped);
        assert_eq!(
            route_payload(&d, &p, "out", br#"{"msg":"congratulations"}"#).await,
            RouteOutcome::Dropped
        );
        assert!(p.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn publish_failure_is_reported_not_raised() {
        let d = Dispatcher::default();
        let outcome = route_payload(&d, &Refusing, "out", br#"{"msg":"no sana","dest":"x"}"#).await;
        assert_eq!(outcome, RouteOutcome::PublishFailed);
    }

    #[tokio::test]
    async fn works_through_trait_object() {
        let d = Dispatcher::default();
        let p: Box<dyn Publisher> = Box::new(Recorder::default());
        let outcome = route_payload(&d, p.as_ref(), "out", br#"{"msg":"CONGRATULATIONS","dest":1}"#).await;
        assert_eq!(outcome, RouteOutcome::Published);
    }
}
