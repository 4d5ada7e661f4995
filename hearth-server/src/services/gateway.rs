//! Messaging gateway client
//!
//! One HTTP gateway carries both channels. WhatsApp addresses carry a
//! `whatsapp:` prefix on both ends; SMS uses the bare E.164 numbers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use hearth_common::config::Credentials;

const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";
const WHATSAPP_PREFIX: &str = "whatsapp:";
const USER_AGENT: &str = concat!("hearth/", env!("CARGO_PKG_VERSION"));

/// Gateway error code for an exhausted daily quota
pub const DAILY_LIMIT_ERROR_CODE: i64 = 63038;

/// Delivery channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    WhatsApp,
    Sms,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::WhatsApp => f.write_str("WhatsApp"),
            Channel::Sms => f.write_str("SMS"),
        }
    }
}

/// Failed gateway call
///
/// `status` is the HTTP status when the gateway answered; `code` is the
/// gateway's own error code from the response body.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct GatewayError {
    pub status: Option<u16>,
    pub code: Option<i64>,
    pub message: String,
}

impl GatewayError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            code: None,
            message: message.into(),
        }
    }

    pub fn http(status: u16, code: Option<i64>, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            code,
            message: message.into(),
        }
    }

    /// True when the gateway reports its daily send quota is spent
    pub fn is_rate_limit(&self) -> bool {
        self.status == Some(429)
            && (self.code == Some(DAILY_LIMIT_ERROR_CODE)
                || self.message.contains("daily messages limit"))
    }
}

/// Outbound message transport
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    /// Send one message to one number over one channel
    async fn send(&self, channel: Channel, to: &str, body: &str) -> Result<(), GatewayError>;
}

/// Add the channel prefix unless the address already carries it
pub fn whatsapp_address(number: &str) -> String {
    if number.starts_with(WHATSAPP_PREFIX) {
        number.to_string()
    } else {
        format!("{}{}", WHATSAPP_PREFIX, number)
    }
}

#[derive(Debug, Deserialize)]
struct TwilioErrorBody {
    code: Option<i64>,
    message: Option<String>,
}

/// Twilio REST client
pub struct TwilioGateway {
    http_client: reqwest::Client,
    account_sid: Option<String>,
    auth_token: Option<String>,
    sms_from: Option<String>,
    whatsapp_from: Option<String>,
}

impl TwilioGateway {
    pub fn new(credentials: &Credentials) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| GatewayError::new(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            account_sid: credentials.twilio_account_sid.clone(),
            auth_token: credentials.twilio_auth_token.clone(),
            sms_from: credentials.twilio_sms_from.clone(),
            whatsapp_from: credentials.twilio_whatsapp_from.clone(),
        })
    }

    fn addresses(&self, channel: Channel, to: &str) -> Result<(String, String), GatewayError> {
        match channel {
            Channel::WhatsApp => {
                let from = self
                    .whatsapp_from
                    .as_deref()
                    .ok_or_else(|| GatewayError::new("TWILIO_WHATSAPP_FROM not configured"))?;
                Ok((whatsapp_address(from), whatsapp_address(to)))
            }
            Channel::Sms => {
                let from = self
                    .sms_from
                    .as_deref()
                    .ok_or_else(|| GatewayError::new("TWILIO_SMS_FROM not configured"))?;
                Ok((from.to_string(), to.to_string()))
            }
        }
    }
}

#[async_trait]
impl MessagingGateway for TwilioGateway {
    async fn send(&self, channel: Channel, to: &str, body: &str) -> Result<(), GatewayError> {
        let (Some(sid), Some(token)) = (self.account_sid.as_deref(), self.auth_token.as_deref())
        else {
            return Err(GatewayError::new("Twilio credentials not configured"));
        };

        let (from, to) = self.addresses(channel, to)?;
        let url = format!("{}/Accounts/{}/Messages.json", TWILIO_API_BASE, sid);

        debug!(channel = %channel, "Sending message via Twilio");

        let response = self
            .http_client
            .post(&url)
            .basic_auth(sid, Some(token))
            .form(&[("To", to.as_str()), ("From", from.as_str()), ("Body", body)])
            .send()
            .await
            .map_err(|e| GatewayError::new(format!("Network error: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body_text = response.text().await.unwrap_or_default();
        let parsed: Option<TwilioErrorBody> = serde_json::from_str(&body_text).ok();
        let code = parsed.as_ref().and_then(|b| b.code);
        let message = parsed
            .and_then(|b| b.message)
            .unwrap_or_else(|| format!("Twilio API error: {}", status));

        warn!(
            channel = %channel,
            status = status.as_u16(),
            ?code,
            "{} send failed: {}",
            channel,
            message
        );

        Err(GatewayError::http(status.as_u16(), code, message))
    }
}
