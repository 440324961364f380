use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundMessage {
    pub to: String,
    pub subject: Option<String>,
    pub body: String,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ChannelError {
    #[error("channel transport failed: {0}")]
    Transport(String),
    #[error("channel rejected the message with status {status}")]
    Rejected { status: u16 },
}

#[async_trait]
pub trait EmailChannel: Send + Sync {
    async fn send_email(&self, message: &OutboundMessage) -> Result<(), ChannelError>;
}

#[async_trait]
pub trait SmsChannel: Send + Sync {
    async fn send_sms(&self, message: &OutboundMessage) -> Result<(), ChannelError>;
}

/// Email relay behind a JSON HTTP API.
pub struct HttpEmailChannel {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<SecretString>,
    from: String,
}

impl HttpEmailChannel {
    pub fn new(
        client: reqwest::Client,
        api_url: impl Into<String>,
        api_key: Option<SecretString>,
        from: impl Into<String>,
    ) -> Self {
        Self { client, api_url: api_url.into(), api_key, from: from.into() }
    }
}

#[async_trait]
impl EmailChannel for HttpEmailChannel {
    async fn send_email(&self, message: &OutboundMessage) -> Result<(), ChannelError> {
        let mut request = self.client.post(&self.api_url).json(&json!({
            "from": self.from,
            "to": message.to,
            "subject": message.subject.clone().unwrap_or_default(),
            "body": message.body,
        }));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let response =
            request.send().await.map_err(|error| ChannelError::Transport(error.to_string()))?;
        if !response.status().is_success() {
            return Err(ChannelError::Rejected { status: response.status().as_u16() });
        }
        Ok(())
    }
}

/// SMS relay behind a JSON HTTP API.
pub struct HttpSmsChannel {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<SecretString>,
    from: String,
}

impl HttpSmsChannel {
    pub fn new(
        client: reqwest::Client,
        api_url: impl Into<String>,
        api_key: Option<SecretString>,
        from: impl Into<String>,
    ) -> Self {
        Self { client, api_url: api_url.into(), api_key, from: from.into() }
    }
}

#[async_trait]
impl SmsChannel for HttpSmsChannel {
    async fn send_sms(&self, message: &OutboundMessage) -> Result<(), ChannelError> {
        let mut request = self.client.post(&self.api_url).json(&json!({
            "from": self.from,
            "to": message.to,
            "body": message.body,
        }));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let response =
            request.send().await.map_err(|error| ChannelError::Transport(error.to_string()))?;
        if !response.status().is_success() {
            return Err(ChannelError::Rejected { status: response.status().as_u16() });
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct NoopEmailChannel;

#[async_trait]
impl EmailChannel for NoopEmailChannel {
    async fn send_email(&self, _message: &OutboundMessage) -> Result<(), ChannelError> {
        Ok(())
    }
}

#[derive(Default)]
pub struct NoopSmsChannel;

#[async_trait]
impl SmsChannel for NoopSmsChannel {
    async fn send_sms(&self, _message: &OutboundMessage) -> Result<(), ChannelError> {
        Ok(())
    }
}

/// Test double that records messages and can be scripted to fail.
#[derive(Clone, Default)]
pub struct RecordingEmailChannel {
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
    fail: bool,
}

impl RecordingEmailChannel {
    pub fn failing() -> Self {
        Self { sent: Arc::default(), fail: true }
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        match self.sent.lock() {
            Ok(sent) => sent.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl EmailChannel for RecordingEmailChannel {
    async fn send_email(&self, message: &OutboundMessage) -> Result<(), ChannelError> {
        if self.fail {
            return Err(ChannelError::Transport("scripted email failure".to_owned()));
        }
        match self.sent.lock() {
            Ok(mut sent) => sent.push(message.clone()),
            Err(poisoned) => poisoned.into_inner().push(message.clone()),
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct RecordingSmsChannel {
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
    fail: bool,
}

impl RecordingSmsChannel {
    pub fn failing() -> Self {
        Self { sent: Arc::default(), fail: true }
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        match self.sent.lock() {
            Ok(sent) => sent.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl SmsChannel for RecordingSmsChannel {
    async fn send_sms(&self, message: &OutboundMessage) -> Result<(), ChannelError> {
        if self.fail {
            return Err(ChannelError::Transport("scripted sms failure".to_owned()));
        }
        match self.sent.lock() {
            Ok(mut sent) => sent.push(message.clone()),
            Err(poisoned) => poisoned.into_inner().push(message.clone()),
        }
        Ok(())
    }
}
