//! Daily good-morning greeting
//!
//! WhatsApp only: the greeting keeps the messaging session window open.
//! A rate-limit signal is reported but does not switch notifications off.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;

use hearth_common::Result;

use crate::db::{profiles, settings};

use super::dispatcher::{dedupe_by_phone, fan_out};
use super::gateway::MessagingGateway;
use super::messages::format_good_morning;
use super::quotes::QuoteService;
use super::reminders::{format_executed_at, MASTER_DISABLED_MESSAGE, NO_RECIPIENTS_MESSAGE};

const WHATSAPP_DISABLED_MESSAGE: &str = "WhatsApp notifications are disabled at application level";
const NO_WHATSAPP_RECIPIENTS_MESSAGE: &str = "No family members with WhatsApp enabled found";

#[derive(Debug, Clone, Serialize)]
pub struct GreetingDelivery {
    pub profile_id: String,
    pub name: String,
    pub whatsapp: bool,
    pub errors: Vec<String>,
}

/// Report of one good-morning run
#[derive(Debug, Clone, Serialize)]
pub struct GoodMorningReport {
    pub success: bool,
    pub executed_at: String,
    /// Quote tier, or "none" when the run stopped before fetching a quote
    pub quote_source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_error: Option<String>,
    pub profiles_found: usize,
    pub messages_sent: usize,
    pub results: Vec<GreetingDelivery>,
    pub rate_limited: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl GoodMorningReport {
    fn stopped(executed_at: String, message: &str) -> Self {
        Self {
            success: true,
            executed_at,
            quote_source: "none".to_string(),
            quote: None,
            quote_error: None,
            profiles_found: 0,
            messages_sent: 0,
            results: Vec::new(),
            rate_limited: false,
            message: Some(message.to_string()),
        }
    }
}

pub async fn run_good_morning(
    pool: &SqlitePool,
    gateway: &dyn MessagingGateway,
    quotes: &QuoteService,
    now: DateTime<Utc>,
) -> Result<GoodMorningReport> {
    let executed_at = format_executed_at(now);
    info!("[good-morning] Run at {}", executed_at);

    let app_settings = settings::get_settings(pool).await?;
    if let Some(s) = &app_settings {
        if !s.notifications_enabled {
            info!("[good-morning] {}", MASTER_DISABLED_MESSAGE);
            return Ok(GoodMorningReport::stopped(executed_at, MASTER_DISABLED_MESSAGE));
        }
        if !s.enable_whatsapp {
            info!("[good-morning] {}", WHATSAPP_DISABLED_MESSAGE);
            return Ok(GoodMorningReport::stopped(executed_at, WHATSAPP_DISABLED_MESSAGE));
        }
    }

    let quote = quotes.daily_quote().await;
    info!(source = ?quote.source, "[good-morning] Quote ready");
    let mut report = GoodMorningReport {
        success: true,
        executed_at,
        quote_source: quote.source.as_str().to_string(),
        quote: Some(quote.quote.clone()),
        quote_error: quote.error.clone(),
        profiles_found: 0,
        messages_sent: 0,
        results: Vec::new(),
        rate_limited: false,
        message: None,
    };

    let with_phone = profiles::list_profiles_with_phone(pool).await?;
    if with_phone.is_empty() {
        report.message = Some(NO_RECIPIENTS_MESSAGE.to_string());
        return Ok(report);
    }

    let eligible: Vec<_> = with_phone
        .into_iter()
        .filter(|p| p.notifications_enabled && p.whatsapp_enabled)
        .collect();
    if eligible.is_empty() {
        report.message = Some(NO_WHATSAPP_RECIPIENTS_MESSAGE.to_string());
        return Ok(report);
    }

    let recipients = dedupe_by_phone(eligible);
    info!("[good-morning] {} eligible recipients", recipients.len());

    for recipient in &recipients {
        let greeting = format_good_morning(&recipient.name, &quote.quote);
        let deliveries = fan_out(
            gateway,
            std::slice::from_ref(recipient),
            &greeting,
            app_settings.as_ref(),
            true,
        )
        .await;

        for d in deliveries {
            report.rate_limited |= d.outcome.rate_limited;
            if d.outcome.whatsapp {
                report.messages_sent += 1;
            }
            report.results.push(GreetingDelivery {
                profile_id: d.recipient.id.clone(),
                name: d.recipient.name.clone(),
                whatsapp: d.outcome.whatsapp,
                errors: d.outcome.errors,
            });
        }
    }

    report.profiles_found = recipients.len();
    info!("[good-morning] Completed: {} messages sent", report.messages_sent);

    Ok(report)
}
