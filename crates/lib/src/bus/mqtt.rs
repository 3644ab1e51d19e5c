//! MQTT connector: subscribes to the input topic and replies on the output topic.

use crate::bus::publisher::{route_payload, Publisher};
use crate::config::Config;
use crate::dispatch::Dispatcher;
use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use std::future::Future;
use std::time::Duration;

/// Capacity of the client -> event loop request queue.
const REQUEST_CAPACITY: usize = 16;
const DISCONNECT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Publishes through the shared MQTT client without waiting on the event loop.
#[derive(Clone)]
pub struct MqttPublisher {
    client: AsyncClient,
}

#[async_trait]
impl Publisher for MqttPublisher {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), String> {
        // Called from inside the poll loop, so it must not block on a full queue.
        self.client
            .try_publish(topic, QoS::AtMostOnce, false, payload)
            .map_err(|e| e.to_string())
    }
}

/// One broker connection, one input subscription.
pub struct MqttBus {
    client: AsyncClient,
    eventloop: EventLoop,
    broker: String,
    input_topic: String,
    output_topic: String,
    reconnect_delay: Duration,
}

impl MqttBus {
    /// Build the client from config. Nothing is sent until [`MqttBus::run`] polls the event loop.
    pub fn new(config: &Config) -> Self {
        let broker = &config.broker;
        let mut options = MqttOptions::new(&broker.client_id, &broker.host, broker.port);
        options.set_keep_alive(Duration::from_secs(broker.keep_alive_secs));
        options.set_clean_session(true);
        let (client, eventloop) = AsyncClient::new(options, REQUEST_CAPACITY);
        Self {
            client,
            eventloop,
            broker: format!("{}:{}", broker.host, broker.port),
            input_topic: config.topics.input.clone(),
            output_topic: config.topics.output.clone(),
            reconnect_delay: Duration::from_secs(broker.reconnect_delay_secs),
        }
    }

    pub fn publisher(&self) -> MqttPublisher {
        MqttPublisher {
            client: self.client.clone(),
        }
    }

    /// Poll the connection until `shutdown` completes, routing each input-topic
    /// publish through `dispatcher`. Connection errors are logged and retried.
    pub async fn run<F>(mut self, dispatcher: Dispatcher, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let publisher = self.publisher();
        tokio::pin!(shutdown);
        log::info!("mqtt: connecting to broker {}", self.broker);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                event = self.eventloop.poll() => match event {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        log::info!("mqtt: connected to broker {}", self.broker);
                        // Clean session: the subscription has to be renewed after every (re)connect.
                        if let Err(e) = self.client.try_subscribe(self.input_topic.as_str(), QoS::AtMostOnce) {
                            log::warn!("mqtt: subscribe to {} failed: {}", self.input_topic, e);
                        }
                    }
                    Ok(Event::Incoming(Packet::SubAck(_))) => {
                        log::info!("mqtt: subscription to {} complete", self.input_topic);
                    }
                    Ok(Event::Incoming(Packet::Publish(p))) => {
                        if topic_matches(&self.input_topic, &p.topic) {
                            route_payload(&dispatcher, &publisher, &self.output_topic, &p.payload).await;
                        } else {
                            log::warn!("mqtt: unexpected message on {}", p.topic);
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        log::warn!(
                            "mqtt: connection to broker lost: {}; retrying in {}s",
                            e,
                            self.reconnect_delay.as_secs()
                        );
                        tokio::select! {
                            _ = &mut shutdown => break,
                            _ = tokio::time::sleep(self.reconnect_delay) => {}
                        }
                        log::info!("mqtt: attempting to reconnect to broker {}", self.broker);
                    }
                },
            }
        }
        log::info!("mqtt: shutdown requested, disconnecting");
        self.disconnect().await;
    }

    /// Ask the broker for a clean disconnect, waiting at most [`DISCONNECT_TIMEOUT`].
    async fn disconnect(&mut self) {
        if let Err(e) = self.client.try_disconnect() {
            log::debug!("mqtt: disconnect request failed: {}", e);
            return;
        }
        let eventloop = &mut self.eventloop;
        let drain = async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Outgoing(Outgoing::Disconnect)) | Err(_) => break,
                    Ok(_) => {}
                }
            }
        };
        if tokio::time::timeout(DISCONNECT_TIMEOUT, drain).await.is_err() {
            log::debug!("mqtt: disconnect timed out");
        }
    }
}

/// MQTT topic filter match (`+` one level, trailing `#` any remaining levels).
pub(crate) fn topic_matches(filter: &str, topic: &str) -> bool {
    let mut levels = topic.split('/');
    for part in filter.split('/') {
        match (part, levels.next()) {
            ("#", _) => return true,
            ("+", Some(_)) => {}
            (p, Some(l)) if p == l => {}
            _ => return false,
        }
    }
    levels.next().is_none()
}
