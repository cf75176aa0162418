//! MQTT subscription loop over TLS to AWS IoT Core

use std::path::Path;
use std::time::Duration;

use log::{debug, error, info, warn};
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS, TlsConfiguration, Transport};
use tokio_util::sync::CancellationToken;

use crate::aws::AwsError;
use crate::config::{IotSettings, IOT_MQTT_ALPN};
use crate::error::BridgeResult;
use crate::messaging::router::TopicRouter;
use crate::types::{InboundMessage, Qos};

/// Outgoing request queue size between the client handle and the event loop
const REQUEST_CHANNEL_CAPACITY: usize = 64;

/// Connects to the IoT endpoint, subscribes to every route of its router and
/// dispatches received publishes until shut down.
pub struct MqttListener {
    settings: IotSettings,
    router: TopicRouter,
}

impl MqttListener {
    pub fn new(settings: IotSettings, router: TopicRouter) -> Self {
        Self { settings, router }
    }

    pub fn router(&self) -> &TopicRouter {
        &self.router
    }

    /// Run until `shutdown` is cancelled.
    ///
    /// Connection errors are logged and retried after the reconnect delay;
    /// subscriptions are renewed on every connection acknowledgement.
    pub async fn run(&self, shutdown: CancellationToken) -> BridgeResult<()> {
        let options = self.mqtt_options().await?;
        let (host, port) = options.broker_address();
        let (client, mut eventloop) = AsyncClient::new(options, REQUEST_CHANNEL_CAPACITY);
        info!(
            "Listening on {}:{} for {} route(s)",
            host,
            port,
            self.router.len()
        );

        loop {
            tokio::select! {
                biased;

                () = shutdown.cancelled() => break,
                event = eventloop.poll() => match event {
                    Ok(event) => self.handle_event(&client, event),
                    Err(e) => {
                        error!("MQTT connection error: {}", e);
                        tokio::select! {
                            biased;

                            () = shutdown.cancelled() => break,
                            () = tokio::time::sleep(self.settings.reconnect_delay) => {}
                        }
                    }
                },
            }
        }

        info!("Stopping MQTT listener");
        if let Err(e) = client.try_disconnect() {
            debug!("Disconnect request not sent: {}", e);
        }
        Ok(())
    }

    fn handle_event(&self, client: &AsyncClient, event: Event) {
        match event {
            Event::Incoming(Packet::ConnAck(_)) => {
                info!("MQTT session established for {}", self.settings.client_id);
                self.subscribe_all(client);
            }
            Event::Incoming(Packet::Publish(publish)) => {
                let message = InboundMessage::new(publish.topic, publish.payload.to_vec());
                self.router.dispatch(&message);
            }
            _ => {}
        }
    }

    fn subscribe_all(&self, client: &AsyncClient) {
        for (filter, qos) in self.router.filters() {
            match client.try_subscribe(filter.as_str(), mqtt_qos(qos)) {
                Ok(()) => debug!("Subscribed to {}", filter),
                Err(e) => warn!("Could not subscribe to {}: {}", filter, e),
            }
        }
    }

    async fn mqtt_options(&self) -> BridgeResult<MqttOptions> {
        let settings = &self.settings;
        let host = settings.mqtt_host()?;
        let (ca_path, cert_path, key_path) = settings.tls_paths()?;

        if settings.client_id.trim().is_empty() || settings.client_id.starts_with(' ') {
            return Err(AwsError::ConfigError("MQTT client id must not be blank".into()).into());
        }
        if !settings.keep_alive.is_zero() && settings.keep_alive < Duration::from_secs(1) {
            return Err(AwsError::ConfigError(
                "MQTT keep-alive must be zero or at least one second".into(),
            )
            .into());
        }

        let ca = read_pem(&ca_path).await?;
        let cert = read_pem(&cert_path).await?;
        let key = read_pem(&key_path).await?;

        let mut options = MqttOptions::new(settings.client_id.clone(), host, settings.port);
        options.set_keep_alive(settings.keep_alive);
        options.set_transport(Transport::tls_with_config(TlsConfiguration::Simple {
            ca,
            alpn: alpn_protocols(settings.port),
            client_auth: Some((cert, key)),
        }));
        Ok(options)
    }
}

fn mqtt_qos(qos: Qos) -> QoS {
    match qos {
        Qos::AtMostOnce => QoS::AtMostOnce,
        Qos::AtLeastOnce => QoS::AtLeastOnce,
    }
}

/// IoT Core only accepts MQTT on 443 when the client negotiates its ALPN protocol
fn alpn_protocols(port: u16) -> Option<Vec<Vec<u8>>> {
    (port == 443).then(|| vec![IOT_MQTT_ALPN.as_bytes().to_vec()])
}

async fn read_pem(path: &Path) -> BridgeResult<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|e| {
        AwsError::ConfigError(format!("Failed to read {}: {}", path.display(), e)).into()
    })
}
