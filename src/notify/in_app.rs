//! In-app toast feed shown by the dashboard

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::dispatcher::{ChannelSender, DispatchError, DispatchReport};
use crate::types::{AlertEvent, Channel, Priority};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Error,
    Warning,
    Info,
    Success,
}

impl From<Priority> for ToastLevel {
    fn from(priority: Priority) -> Self {
        match priority {
            Priority::High => ToastLevel::Error,
            Priority::Medium => ToastLevel::Warning,
            Priority::Low => ToastLevel::Info,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Toast {
    pub level: ToastLevel,
    pub title: String,
    pub message: String,
    /// Alert this toast belongs to, if any
    pub alert_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Toast {
    pub fn new(level: ToastLevel, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            message: message.into(),
            alert_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn for_alert(alert: &AlertEvent) -> Self {
        Self {
            alert_id: Some(alert.id.clone()),
            ..Self::new(alert.priority.into(), alert.subject.clone(), alert.message.clone())
        }
    }

    /// Confirmation for external channels that accepted an alert.
    pub fn delivery_summary(report: &DispatchReport) -> Option<Self> {
        let external: Vec<&str> = [(Channel::Sms, "SMS"), (Channel::Email, "Email")]
            .into_iter()
            .filter(|(ch, _)| report.delivered.contains(ch))
            .map(|(_, label)| label)
            .collect();
        if external.is_empty() {
            return None;
        }
        let toast = Self::new(
            ToastLevel::Success,
            "Alert notification sent",
            format!("Alert notification sent via {}", external.join(" & ")),
        );
        Some(Self {
            alert_id: Some(report.alert_id.clone()),
            ..toast
        })
    }

    /// Failure notice naming the channel that could not be reached.
    pub fn delivery_failure(alert_id: &str, channel: Channel, error: &DispatchError) -> Self {
        Self {
            alert_id: Some(alert_id.to_string()),
            ..Self::new(
                ToastLevel::Error,
                format!("Failed to send {channel} alert"),
                error.to_string(),
            )
        }
    }
}

/// Bounded, shared toast feed (newest first).
#[derive(Debug, Clone)]
pub struct ToastFeed {
    inner: Arc<RwLock<VecDeque<Toast>>>,
    capacity: usize,
}

impl ToastFeed {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub async fn push(&self, toast: Toast) {
        let mut feed = self.inner.write().await;
        feed.push_front(toast);
        feed.truncate(self.capacity);
    }

    pub async fn snapshot(&self) -> Vec<Toast> {
        self.inner.read().await.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }
}

/// In-app channel: posts the alert to the toast feed.
pub struct InAppSender {
    feed: ToastFeed,
}

impl InAppSender {
    pub fn new(feed: ToastFeed) -> Self {
        Self { feed }
    }
}

#[async_trait]
impl ChannelSender for InAppSender {
    fn channel(&self) -> Channel {
        Channel::InApp
    }

    async fn send(&self, alert: &AlertEvent) -> Result<(), DispatchError> {
        self.feed.push(Toast::for_alert(alert)).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn feed_is_bounded_newest_first() {
        let feed = ToastFeed::new(3);
        for i in 0..5 {
            feed.push(Toast::new(ToastLevel::Info, format!("t{i}"), "")).await;
        }
        let toasts = feed.snapshot().await;
        assert_eq!(toasts.len(), 3);
        assert_eq!(toasts[0].title, "t4");
        assert_eq!(toasts[2].title, "t2");
    }

    #[test]
    fn priority_maps_to_level() {
        assert_eq!(ToastLevel::from(Priority::High), ToastLevel::Error);
        assert_eq!(ToastLevel::from(Priority::Medium), ToastLevel::Warning);
        assert_eq!(ToastLevel::from(Priority::Low), ToastLevel::Info);
    }

    #[test]
    fn summary_lists_external_channels_only() {
        let mut report = DispatchReport::new("a1");
        report.delivered.insert(Channel::InApp);
        assert!(Toast::delivery_summary(&report).is_none());

        report.delivered.insert(Channel::Email);
        report.delivered.insert(Channel::Sms);
        let toast = Toast::delivery_summary(&report).unwrap();
        assert_eq!(toast.message, "Alert notification sent via SMS & Email");
    }
}
