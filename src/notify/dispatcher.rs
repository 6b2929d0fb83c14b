//! Notification Dispatcher - routes alerts to channels by priority
//!
//! | priority | channels                 |
//! |----------|--------------------------|
//! | high     | in-app, email, SMS       |
//! | medium   | in-app, email            |
//! | low      | in-app                   |
//!
//! Channels run concurrently and independently; each gets one attempt under
//! its own timeout. A failed channel never cancels the others and never
//! propagates out of `dispatch`.

use async_trait::async_trait;
use futures::future::join_all;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::in_app::{InAppSender, ToastFeed};
use super::messages::MessageComposer;
use super::relay_client::RelayClient;
use crate::config::MonitorConfig;
use crate::types::{AlertEvent, Channel, Priority};

/// A single channel send failed.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Relay rejected the message ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("{channel} send timed out after {secs}s")]
    Timeout { channel: Channel, secs: u64 },
}

/// One outbound channel.
#[async_trait]
pub trait ChannelSender: Send + Sync {
    fn channel(&self) -> Channel;
    async fn send(&self, alert: &AlertEvent) -> Result<(), DispatchError>;
}

/// Outcome of dispatching one alert.
#[derive(Debug)]
pub struct DispatchReport {
    pub alert_id: String,
    pub delivered: BTreeSet<Channel>,
    pub failed: Vec<(Channel, DispatchError)>,
    /// Routed channels with no sender configured
    pub skipped: Vec<Channel>,
}

impl DispatchReport {
    pub fn new(alert_id: impl Into<String>) -> Self {
        Self {
            alert_id: alert_id.into(),
            delivered: BTreeSet::new(),
            failed: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn all_delivered(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Channels an alert of this priority is routed to.
pub fn channels_for(priority: Priority) -> &'static [Channel] {
    match priority {
        Priority::High => &[Channel::InApp, Channel::Email, Channel::Sms],
        Priority::Medium => &[Channel::InApp, Channel::Email],
        Priority::Low => &[Channel::InApp],
    }
}

pub struct Dispatcher {
    senders: HashMap<Channel, Arc<dyn ChannelSender>>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            senders: HashMap::new(),
            timeout,
        }
    }

    /// Register (or replace) the sender for its channel.
    pub fn with_sender(mut self, sender: Arc<dyn ChannelSender>) -> Self {
        self.senders.insert(sender.channel(), sender);
        self
    }

    /// In-app always; email and SMS only when a recipient is configured.
    pub fn from_config(config: &MonitorConfig, feed: ToastFeed) -> Self {
        let notify = &config.notify;
        let timeout = Duration::from_secs(notify.dispatch_timeout_secs);
        let label = if config.container.name.is_empty() {
            config.container.id.clone()
        } else {
            config.container.name.clone()
        };
        let composer = MessageComposer::new(notify.signature.clone(), label);
        let relay = RelayClient::new(&notify.relay_url, timeout);

        let mut dispatcher = Self::new(timeout).with_sender(Arc::new(InAppSender::new(feed)));
        if let Some(ref to) = notify.email_to {
            dispatcher = dispatcher.with_sender(Arc::new(EmailSender::new(
                relay.clone(),
                to.clone(),
                composer.clone(),
            )));
        }
        if let Some(ref to) = notify.sms_to {
            dispatcher =
                dispatcher.with_sender(Arc::new(SmsSender::new(relay, to.clone(), composer)));
        }
        dispatcher
    }

    pub fn configured_channels(&self) -> BTreeSet<Channel> {
        self.senders.keys().copied().collect()
    }

    pub async fn dispatch(&self, alert: &AlertEvent) -> DispatchReport {
        let mut report = DispatchReport::new(&alert.id);
        let mut routed = Vec::new();

        for &channel in channels_for(alert.priority) {
            match self.senders.get(&channel) {
                Some(sender) => routed.push(Arc::clone(sender)),
                None => report.skipped.push(channel),
            }
        }
        if !report.skipped.is_empty() {
            debug!(alert = %alert.id, skipped = ?report.skipped, "[Dispatcher] Channels not configured");
        }

        let secs = self.timeout.as_secs();
        let sends = routed.iter().map(|sender| async move {
            let channel = sender.channel();
            let result = match tokio::time::timeout(self.timeout, sender.send(alert)).await {
                Ok(result) => result,
                Err(_) => Err(DispatchError::Timeout { channel, secs }),
            };
            (channel, result)
        });

        for (channel, result) in join_all(sends).await {
            match result {
                Ok(()) => {
                    report.delivered.insert(channel);
                }
                Err(e) => {
                    warn!(alert = %alert.id, channel = %channel, error = %e, "[Dispatcher] Channel send failed");
                    report.failed.push((channel, e));
                }
            }
        }

        info!(
            alert = %alert.id,
            priority = %alert.priority,
            delivered = ?report.delivered,
            failed = report.failed.len(),
            "[Dispatcher] Alert dispatched"
        );
        report
    }
}

// ============================================================================
// Relay-backed Senders
// ============================================================================

pub struct EmailSender {
    relay: RelayClient,
    to: String,
    composer: MessageComposer,
}

impl EmailSender {
    pub fn new(relay: RelayClient, to: String, composer: MessageComposer) -> Self {
        Self { relay, to, composer }
    }
}

#[async_trait]
impl ChannelSender for EmailSender {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    async fn send(&self, alert: &AlertEvent) -> Result<(), DispatchError> {
        let subject = self.composer.email_subject(alert);
        let body = self.composer.email_body(alert);
        self.relay.send_email(&self.to, &subject, &body).await?;
        Ok(())
    }
}

pub struct SmsSender {
    relay: RelayClient,
    to: String,
    composer: MessageComposer,
}

impl SmsSender {
    pub fn new(relay: RelayClient, to: String, composer: MessageComposer) -> Self {
        Self { relay, to, composer }
    }
}

#[async_trait]
impl ChannelSender for SmsSender {
    fn channel(&self) -> Channel {
        Channel::Sms
    }

    async fn send(&self, alert: &AlertEvent) -> Result<(), DispatchError> {
        let body = self.composer.sms_body(alert);
        self.relay.send_sms(&self.to, &body).await?;
        Ok(())
    }
}
