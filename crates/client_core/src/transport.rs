use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use shared::{
    domain::TransportMode,
    protocol::{BridgeEnvelope, OutboundCommand},
};
use thiserror::Error;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    config::{ConfigError, PanelSettings},
    panel::PanelEvent,
    routing::RegistrationTable,
};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to connect push channel {url}: {source}")]
    Connect {
        url: Url,
        source: tokio_tungstenite::tungstenite::Error,
    },
    #[error("push channel {url} did not answer within {timeout:?}")]
    ConnectTimeout { url: Url, timeout: Duration },
    #[error("failed to encode outbound command: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("fallback request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Outbound path to the bridge. Delivery is never confirmed.
pub trait CommandSink: Send + Sync {
    fn send(&self, command: OutboundCommand);
}

#[async_trait]
pub trait Puller: Send + Sync {
    async fn pull(&self) -> Result<(), TransportError>;
}

#[derive(Clone)]
pub struct HttpFallback {
    http: Client,
    url: Url,
}

impl HttpFallback {
    pub fn new(url: Url) -> Self {
        Self {
            http: Client::new(),
            url,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub async fn deliver(&self, command: &OutboundCommand) -> Result<(), TransportError> {
        let data = serde_json::to_string(&command.payload()?)?;
        self.http
            .get(self.url.clone())
            .query(&[("topic", command.topic()), ("data", data.as_str())])
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

impl CommandSink for HttpFallback {
    fn send(&self, command: OutboundCommand) {
        let fallback = self.clone();
        tokio::spawn(async move {
            if let Err(err) = fallback.deliver(&command).await {
                warn!(topic = command.topic(), %err, "fallback: command delivery failed");
            }
        });
    }
}

#[async_trait]
impl Puller for HttpFallback {
    async fn pull(&self) -> Result<(), TransportError> {
        self.http
            .get(self.url.clone())
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Pulls once right away, then once per `period` for as long as the runtime lives.
/// Each pull runs detached so a slow request never delays the next tick.
pub fn spawn_poll_loop(puller: Arc<dyn Puller>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let puller = Arc::clone(&puller);
            tokio::spawn(async move {
                if let Err(err) = puller.pull().await {
                    warn!(%err, "poll: pull failed");
                }
            });
        }
    })
}

#[derive(Clone)]
pub struct PushSink {
    outbound: mpsc::UnboundedSender<Message>,
}

impl CommandSink for PushSink {
    fn send(&self, command: OutboundCommand) {
        let topic = command.topic().to_string();
        let text = match command
            .into_envelope()
            .and_then(|envelope| serde_json::to_string(&envelope))
        {
            Ok(text) => text,
            Err(err) => {
                warn!(%topic, %err, "push: failed to encode command");
                return;
            }
        };
        if self.outbound.send(Message::Text(text)).is_err() {
            warn!(%topic, "push: channel closed, command dropped");
        }
    }
}

/// Websocket to the bridge. Inbound frames are forwarded only for topics
/// present in the registration table it was opened with. Dropping the
/// channel stops both socket tasks.
pub struct PushChannel {
    sink: PushSink,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl PushChannel {
    pub async fn open(
        url: &Url,
        timeout: Duration,
        routes: Arc<RegistrationTable>,
        events: mpsc::Sender<PanelEvent>,
    ) -> Result<Self, TransportError> {
        let (ws_stream, _) = time::timeout(timeout, connect_async(url.as_str()))
            .await
            .map_err(|_| TransportError::ConnectTimeout {
                url: url.clone(),
                timeout,
            })?
            .map_err(|source| TransportError::Connect {
                url: url.clone(),
                source,
            })?;
        let (ws_writer, mut ws_reader) = ws_stream.split();

        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let writer = tokio::spawn(async move {
            if let Err(err) = UnboundedReceiverStream::new(outbound_rx)
                .map(Ok)
                .forward(ws_writer)
                .await
            {
                warn!(%err, "push: send failed, outbound commands stop here");
            }
        });

        let reader = tokio::spawn(async move {
            while let Some(msg) = ws_reader.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        let envelope = match BridgeEnvelope::decode(&text) {
                            Ok(envelope) => envelope,
                            Err(err) => {
                                warn!(%err, "push: invalid bridge frame");
                                continue;
                            }
                        };
                        if !routes.contains(&envelope.ctx) {
                            debug!(topic = %envelope.ctx, "push: no handler registered, dropping");
                            continue;
                        }
                        let event = PanelEvent::Inbound {
                            topic: envelope.ctx,
                            payload: envelope.data,
                        };
                        if events.send(event).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(err) => {
                        warn!(%err, "push: receive failed");
                        break;
                    }
                }
            }
            info!("push: channel closed");
        });

        Ok(Self {
            sink: PushSink { outbound },
            reader,
            writer,
        })
    }

    pub fn sink(&self) -> PushSink {
        self.sink.clone()
    }
}

impl Drop for PushChannel {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}

pub struct SelectedTransport {
    pub mode: TransportMode,
    pub sink: Arc<dyn CommandSink>,
    pub push: Option<PushChannel>,
    pub poll_task: Option<JoinHandle<()>>,
}

/// Decides once between push and poll. Push wins when it is enabled and the
/// websocket handshake completes in time.
pub async fn select_transport(
    settings: &PanelSettings,
    routes: Arc<RegistrationTable>,
    events: mpsc::Sender<PanelEvent>,
) -> Result<SelectedTransport, TransportError> {
    if settings.push_enabled {
        let url = settings.push_url()?;
        match PushChannel::open(&url, settings.push_connect_timeout(), routes, events).await {
            Ok(channel) => {
                info!(%url, "transport: push channel open");
                return Ok(SelectedTransport {
                    mode: TransportMode::Push,
                    sink: Arc::new(channel.sink()),
                    push: Some(channel),
                    poll_task: None,
                });
            }
            Err(err) => {
                info!(%err, "transport: push unavailable, falling back to poll");
            }
        }
    }

    let fallback = HttpFallback::new(settings.fallback_url()?);
    info!(
        url = %fallback.url(),
        period_secs = settings.poll_interval_secs,
        "transport: polling"
    );
    let poll_task = spawn_poll_loop(Arc::new(fallback.clone()), settings.poll_interval());
    Ok(SelectedTransport {
        mode: TransportMode::Poll,
        sink: Arc::new(fallback),
        push: None,
        poll_task: Some(poll_task),
    })
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
