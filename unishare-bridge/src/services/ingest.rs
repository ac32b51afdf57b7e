use std::sync::Arc;
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::sync::Mutex;

use crate::configs::settings::Broker;
use crate::errors::BridgeError;
use crate::repositories::{DeviceRepository, UpsertOutcome};
use crate::services::decoder;
use crate::services::roster::{RosterFilter, RosterPublisher};
use crate::services::router::{self, MessageIntent};
use crate::services::telemetry_sink::TelemetrySink;

/// Composition root of the bridge: owns the broker session and dispatches
/// every inbound message to the registry, the sink or the roster publisher.
pub struct IngestService {
    client: AsyncClient,
    event_loop: Mutex<EventLoop>,
    registry: Arc<DeviceRepository>,
    sink: Arc<TelemetrySink>,
    roster: RosterPublisher,
}

impl IngestService {
    pub fn new(broker: &Broker, registry: Arc<DeviceRepository>, sink: Arc<TelemetrySink>) -> Self {
        let mut options = MqttOptions::new(&broker.client_id, &broker.host, broker.port);
        options.set_keep_alive(Duration::from_secs(5));

        if let (Some(username), Some(password)) = (&broker.username, &broker.password) {
            options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(options, 10);
        let roster = RosterPublisher::new(client.clone(), Arc::clone(&registry));

        Self {
            client,
            event_loop: Mutex::new(event_loop),
            registry,
            sink,
            roster,
        }
    }

    /// Poll the broker session until process termination. Messages are handled
    /// one at a time, fully, before the next poll; no failure short of process
    /// death stops the loop.
    pub async fn run(&self) {
        let mut event_loop = self.event_loop.lock().await;

        loop {
            match event_loop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    if let Err(e) = self.on_connected().await {
                        tracing::error!("session setup failed: {e}");
                    }
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    if let Err(e) = self.dispatch(&publish.topic, &publish.payload).await {
                        tracing::warn!(topic = %publish.topic, "dropped message: {e}");
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    // rumqttc reconnects on the next poll
                    tracing::error!("transport error: {e}");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }

    /// Runs on every ConnAck so subscriptions and the retained roster survive
    /// broker reconnects.
    async fn on_connected(&self) -> Result<(), BridgeError> {
        self.client
            .subscribe(router::SETUP_TOPIC, QoS::AtLeastOnce)
            .await?;
        self.client
            .subscribe(router::SENSOR_TOPIC_FILTER, QoS::AtLeastOnce)
            .await?;
        self.client
            .subscribe(router::CONNECT_TOPIC, QoS::AtMostOnce)
            .await?;
        self.client
            .subscribe(router::GET_ALL_TOPIC, QoS::AtMostOnce)
            .await?;

        tracing::info!("connected, subscriptions in place");

        self.roster.publish(RosterFilter::SensorsOnly).await?;

        Ok(())
    }

    async fn dispatch(&self, topic: &str, payload: &[u8]) -> Result<(), BridgeError> {
        match router::classify(topic)? {
            MessageIntent::Setup => self.register(payload, false).await,
            MessageIntent::Connect => self.register(payload, true).await,
            MessageIntent::RosterRequest => self.roster.publish(RosterFilter::All).await,
            MessageIntent::Reading { mac_address, kind } => {
                let value = decoder::decode_reading(kind, payload)?;
                self.sink.write(&mac_address, kind, &value).await
            }
            MessageIntent::Unrecognized => {
                tracing::debug!(topic, "ignoring unrecognized topic");
                Ok(())
            }
        }
    }

    /// Upsert a registration and republish the retained sensor roster when the
    /// registry actually changed. A connect announce also marks the device as
    /// connected.
    async fn register(&self, payload: &[u8], announce: bool) -> Result<(), BridgeError> {
        let registration = decoder::decode_registration(payload)?;

        let outcome = self
            .registry
            .upsert(
                &registration.mac_address,
                &registration.name,
                &registration.device_type,
            )
            .await?;

        if announce {
            self.registry
                .set_status(&registration.mac_address, true)
                .await?;
        }

        if outcome == UpsertOutcome::Changed {
            tracing::info!(mac_address = %registration.mac_address, "device registered");
            self.roster.publish(RosterFilter::SensorsOnly).await?;
        }

        Ok(())
    }
}
