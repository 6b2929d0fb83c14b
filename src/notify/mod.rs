//! Notification Dispatcher Module
//!
//! - `dispatcher` - priority routing, concurrent channel sends, timeouts
//! - `relay_client` - HTTP client for the email/SMS relay
//! - `messages` - subject and body composition
//! - `in_app` - dashboard toast feed and the in-app channel

pub mod dispatcher;
pub mod in_app;
pub mod messages;
pub mod relay_client;

pub use dispatcher::{
    channels_for, ChannelSender, DispatchError, DispatchReport, Dispatcher, EmailSender, SmsSender,
};
pub use in_app::{InAppSender, Toast, ToastFeed, ToastLevel};
pub use messages::MessageComposer;
pub use relay_client::RelayClient;
