//! Reminder runs
//!
//! The periodic run finds events and open tasks dated tomorrow and sends one
//! message per (subject, recipient) pair. The manual run sends one caller-described
//! item to everyone. Both switch the master setting off, once, when the gateway
//! reports its daily limit.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{info, warn};

use hearth_common::dates::{format_long_date, tomorrow_of};
use hearth_common::db::AppSettings;
use hearth_common::Result;

use crate::db::{events, profiles, settings, tasks};

use super::dispatcher::{dedupe_by_phone, fan_out, Delivery};
use super::gateway::MessagingGateway;
use super::messages::{format_event_reminder, format_task_reminder};

pub const MASTER_DISABLED_MESSAGE: &str = "Notifications are disabled at application level";
pub const NO_RECIPIENTS_MESSAGE: &str = "No family members with phone numbers found";
pub const RATE_LIMIT_MESSAGE: &str = "Twilio daily message limit exceeded. Notifications have been \
automatically disabled. They will need to be manually re-enabled after the limit resets \
(typically at midnight).";

/// Timestamp format used in run reports
pub fn format_executed_at(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SentCounts {
    pub events: usize,
    pub tasks: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventDelivery {
    pub event_id: String,
    pub event_title: String,
    pub profile_id: String,
    pub profile_name: String,
    pub whatsapp: bool,
    pub sms: bool,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskDelivery {
    pub task_id: String,
    pub task_title: String,
    pub profile_id: String,
    pub profile_name: String,
    pub whatsapp: bool,
    pub sms: bool,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReminderResults {
    pub events: Vec<EventDelivery>,
    pub tasks: Vec<TaskDelivery>,
}

/// Report of one periodic reminder run
#[derive(Debug, Clone, Serialize)]
pub struct ReminderReport {
    pub success: bool,
    pub date: NaiveDate,
    pub executed_at: String,
    pub events_found: usize,
    pub tasks_found: usize,
    pub profiles_found: usize,
    pub notifications_sent: SentCounts,
    pub results: ReminderResults,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit_exceeded: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ReminderReport {
    fn early_exit(date: NaiveDate, executed_at: String, message: &str) -> Self {
        Self {
            success: true,
            date,
            executed_at,
            events_found: 0,
            tasks_found: 0,
            profiles_found: 0,
            notifications_sent: SentCounts::default(),
            results: ReminderResults::default(),
            rate_limit_exceeded: None,
            message: Some(message.to_string()),
        }
    }
}

fn any_rate_limited(deliveries: &[Delivery<'_>]) -> bool {
    deliveries.iter().any(|d| d.outcome.rate_limited)
}

/// Send reminders for everything due the day after `today`
pub async fn run_reminders(
    pool: &SqlitePool,
    gateway: &dyn MessagingGateway,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Result<ReminderReport> {
    let tomorrow = tomorrow_of(today);
    let executed_at = format_executed_at(now);
    info!("[reminders] Run at {}, looking for items on {}", executed_at, tomorrow);

    let app_settings = settings::get_settings(pool).await?;
    if app_settings.as_ref().is_some_and(|s| !s.notifications_enabled) {
        info!("[reminders] {}", MASTER_DISABLED_MESSAGE);
        return Ok(ReminderReport::early_exit(tomorrow, executed_at, MASTER_DISABLED_MESSAGE));
    }

    let with_phone = profiles::list_profiles_with_phone(pool).await?;
    if with_phone.is_empty() {
        info!("[reminders] {}", NO_RECIPIENTS_MESSAGE);
        return Ok(ReminderReport::early_exit(tomorrow, executed_at, NO_RECIPIENTS_MESSAGE));
    }
    let recipients = dedupe_by_phone(with_phone);
    info!("[reminders] {} recipients after phone de-duplication", recipients.len());

    let due_events = events::events_on(pool, tomorrow).await?;
    let due_tasks = tasks::open_tasks_due_on(pool, tomorrow).await?;
    info!(
        "[reminders] Found {} events and {} tasks for {}",
        due_events.len(),
        due_tasks.len(),
        tomorrow
    );

    let mut results = ReminderResults::default();
    let mut rate_limited = false;

    for event in &due_events {
        let message = format_event_reminder(
            &event.title,
            &format_long_date(event.date),
            event.time.as_deref(),
            event.creator_name.as_deref(),
        );
        let deliveries =
            fan_out(gateway, &recipients, &message, app_settings.as_ref(), false).await;
        rate_limited |= any_rate_limited(&deliveries);

        results.events.extend(deliveries.into_iter().map(|d| EventDelivery {
            event_id: event.id.clone(),
            event_title: event.title.clone(),
            profile_id: d.recipient.id.clone(),
            profile_name: d.recipient.name.clone(),
            whatsapp: d.outcome.whatsapp,
            sms: d.outcome.sms,
            errors: d.outcome.errors,
        }));
    }

    for task in &due_tasks {
        let message = format_task_reminder(
            &task.title,
            &format_long_date(task.due_date),
            task.creator_name.as_deref(),
        );
        let deliveries =
            fan_out(gateway, &recipients, &message, app_settings.as_ref(), false).await;
        rate_limited |= any_rate_limited(&deliveries);

        results.tasks.extend(deliveries.into_iter().map(|d| TaskDelivery {
            task_id: task.id.clone(),
            task_title: task.title.clone(),
            profile_id: d.recipient.id.clone(),
            profile_name: d.recipient.name.clone(),
            whatsapp: d.outcome.whatsapp,
            sms: d.outcome.sms,
            errors: d.outcome.errors,
        }));
    }

    if rate_limited {
        warn!("[reminders] Rate limit detected, disabling notifications");
        settings::disable_notifications(pool).await?;
    }

    let notifications_sent = SentCounts {
        events: results.events.iter().filter(|r| r.whatsapp || r.sms).count(),
        tasks: results.tasks.iter().filter(|r| r.whatsapp || r.sms).count(),
    };
    info!(
        "[reminders] Completed: {} event and {} task notifications sent",
        notifications_sent.events, notifications_sent.tasks
    );

    Ok(ReminderReport {
        success: true,
        date: tomorrow,
        executed_at,
        events_found: due_events.len(),
        tasks_found: due_tasks.len(),
        profiles_found: recipients.len(),
        notifications_sent,
        results,
        rate_limit_exceeded: rate_limited.then_some(true),
        message: rate_limited.then(|| RATE_LIMIT_MESSAGE.to_string()),
    })
}

/// What a manual send is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Task,
    Event,
}

/// Caller-described item for a manual send
///
/// The date is used verbatim in the message.
#[derive(Debug, Clone)]
pub struct ManualItem {
    pub kind: ItemKind,
    pub title: String,
    pub date: String,
    pub time: Option<String>,
    pub creator_name: Option<String>,
}

impl ManualItem {
    pub fn message(&self) -> String {
        match self.kind {
            ItemKind::Task => {
                format_task_reminder(&self.title, &self.date, self.creator_name.as_deref())
            }
            ItemKind::Event => format_event_reminder(
                &self.title,
                &self.date,
                self.time.as_deref(),
                self.creator_name.as_deref(),
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipientDelivery {
    pub profile_id: String,
    pub name: String,
    pub whatsapp: bool,
    pub sms: bool,
    pub errors: Vec<String>,
}

/// Report of one manual send
#[derive(Debug, Clone, Serialize)]
pub struct ManualSendReport {
    pub success: bool,
    pub sent: usize,
    pub total: usize,
    pub results: Vec<RecipientDelivery>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit_exceeded: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ManualSendReport {
    fn early_exit(success: bool, message: &str) -> Self {
        Self {
            success,
            sent: 0,
            total: 0,
            results: Vec::new(),
            rate_limit_exceeded: None,
            message: Some(message.to_string()),
        }
    }
}

/// Send one item to every de-duplicated recipient now
pub async fn send_item_now(
    pool: &SqlitePool,
    gateway: &dyn MessagingGateway,
    item: &ManualItem,
) -> Result<ManualSendReport> {
    let app_settings: Option<AppSettings> = settings::get_settings(pool).await?;
    if app_settings.as_ref().is_some_and(|s| !s.notifications_enabled) {
        return Ok(ManualSendReport::early_exit(false, MASTER_DISABLED_MESSAGE));
    }

    let with_phone = profiles::list_profiles_with_phone(pool).await?;
    if with_phone.is_empty() {
        return Ok(ManualSendReport::early_exit(true, NO_RECIPIENTS_MESSAGE));
    }
    let recipients = dedupe_by_phone(with_phone);

    let message = item.message();
    let deliveries = fan_out(gateway, &recipients, &message, app_settings.as_ref(), false).await;
    let rate_limited = any_rate_limited(&deliveries);

    if rate_limited {
        warn!("[send] Rate limit detected, disabling notifications");
        settings::disable_notifications(pool).await?;
    }

    let results: Vec<RecipientDelivery> = deliveries
        .into_iter()
        .map(|d| RecipientDelivery {
            profile_id: d.recipient.id.clone(),
            name: d.recipient.name.clone(),
            whatsapp: d.outcome.whatsapp,
            sms: d.outcome.sms,
            errors: d.outcome.errors,
        })
        .collect();

    let sent = results.iter().filter(|r| r.whatsapp || r.sms).count();
    info!("[send] {} of {} recipients reached", sent, recipients.len());

    Ok(ManualSendReport {
        success: true,
        sent,
        total: recipients.len(),
        results,
        rate_limit_exceeded: rate_limited.then_some(true),
        message: rate_limited.then(|| RATE_LIMIT_MESSAGE.to_string()),
    })
}
