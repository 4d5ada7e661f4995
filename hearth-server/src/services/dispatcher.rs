//! Notification dispatcher
//!
//! Delivers one message to one recipient over WhatsApp and/or SMS.
//!
//! Checks run in a fixed order:
//! 1. App-wide master switch (when settings are known)
//! 2. Recipient has a phone number and personal notifications enabled
//! 3. WhatsApp, if enabled for the recipient and at app level
//! 4. SMS, independently of the WhatsApp outcome
//!
//! Channel failures never propagate: they become error strings on the outcome.

use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, warn};

use hearth_common::db::{AppSettings, Profile};

use super::gateway::{Channel, GatewayError, MessagingGateway};

/// Per-recipient delivery result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchOutcome {
    pub whatsapp: bool,
    pub sms: bool,
    pub errors: Vec<String>,
    pub rate_limited: bool,
}

impl DispatchOutcome {
    /// At least one channel delivered
    pub fn delivered(&self) -> bool {
        self.whatsapp || self.sms
    }

    /// Fold one channel attempt into the outcome; returns whether it was delivered
    fn record(&mut self, channel: Channel, result: Result<(), GatewayError>) -> bool {
        match result {
            Ok(()) => {
                debug!(channel = %channel, "Message delivered");
                true
            }
            Err(e) if e.is_rate_limit() => {
                warn!(channel = %channel, "Gateway daily limit reached");
                self.rate_limited = true;
                self.errors.push(format!(
                    "{}: Rate limit exceeded - daily message limit reached",
                    channel
                ));
                false
            }
            Err(e) => {
                self.errors.push(format!("{}: {}", channel, e));
                false
            }
        }
    }
}

/// Per-recipient channel preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelPreferences {
    pub notifications: bool,
    pub whatsapp: bool,
    pub sms: bool,
}

impl ChannelPreferences {
    pub fn of(profile: &Profile) -> Self {
        Self {
            notifications: profile.notifications_enabled,
            whatsapp: profile.whatsapp_enabled,
            sms: profile.sms_enabled,
        }
    }

    /// Same preferences with SMS switched off
    pub fn whatsapp_only(self) -> Self {
        Self { sms: false, ..self }
    }
}

/// Send `message` to one recipient, honouring app and personal settings
pub async fn send_notification_to_user(
    gateway: &dyn MessagingGateway,
    phone: Option<&str>,
    prefs: ChannelPreferences,
    message: &str,
    app_settings: Option<&AppSettings>,
) -> DispatchOutcome {
    let mut outcome = DispatchOutcome::default();

    if let Some(settings) = app_settings {
        if !settings.notifications_enabled {
            return outcome;
        }
    }

    let Some(phone) = phone.filter(|p| !p.is_empty()) else {
        return outcome;
    };
    if !prefs.notifications {
        return outcome;
    }

    let whatsapp_allowed = app_settings.map_or(true, |s| s.enable_whatsapp);
    if prefs.whatsapp && whatsapp_allowed {
        let result = gateway.send(Channel::WhatsApp, phone, message).await;
        outcome.whatsapp = outcome.record(Channel::WhatsApp, result);
    }

    let sms_allowed = app_settings.map_or(true, |s| s.enable_sms);
    if prefs.sms && sms_allowed {
        let result = gateway.send(Channel::Sms, phone, message).await;
        outcome.sms = outcome.record(Channel::Sms, result);
    }

    outcome
}

/// One recipient's result within a fan-out
#[derive(Debug, Clone)]
pub struct Delivery<'a> {
    pub recipient: &'a Profile,
    pub outcome: DispatchOutcome,
}

/// Send the same message to each recipient in turn
///
/// Calls are awaited one at a time. Recipients with personal notifications
/// switched off are skipped and do not appear in the result.
pub async fn fan_out<'a>(
    gateway: &dyn MessagingGateway,
    recipients: &'a [Profile],
    message: &str,
    app_settings: Option<&AppSettings>,
    whatsapp_only: bool,
) -> Vec<Delivery<'a>> {
    let mut deliveries = Vec::with_capacity(recipients.len());

    for recipient in recipients.iter().filter(|r| r.notifications_enabled) {
        let mut prefs = ChannelPreferences::of(recipient);
        if whatsapp_only {
            prefs = prefs.whatsapp_only();
        }

        let outcome = send_notification_to_user(
            gateway,
            recipient.phone_number.as_deref(),
            prefs,
            message,
            app_settings,
        )
        .await;

        deliveries.push(Delivery { recipient, outcome });
    }

    deliveries
}

/// Keep one entry per distinct phone number, first occurrence wins
///
/// Entries without a phone number are dropped.
pub fn dedupe_by_phone(profiles: Vec<Profile>) -> Vec<Profile> {
    let mut seen = HashSet::new();
    profiles
        .into_iter()
        .filter(|p| match p.phone_number.as_deref() {
            Some(phone) if !phone.is_empty() => seen.insert(phone.to_string()),
            _ => false,
        })
        .collect()
}
