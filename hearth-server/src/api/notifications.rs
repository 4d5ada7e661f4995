//! Notification endpoints
//!
//! The reminder, good-morning and diagnose endpoints are called by an external
//! scheduler and are guarded by the shared trigger secret. Manual send needs a
//! signed-in member.

use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use hearth_common::config::CredentialPresence;
use hearth_common::dates::{local_today, tomorrow_of};
use hearth_common::db::{AppSettings, Profile};

use crate::auth::{authorization_header, CurrentUser};
use crate::db::events::{self, DueEvent};
use crate::db::tasks::{self, DueTask};
use crate::db::{profiles, settings};
use crate::error::{ApiError, ApiResult};
use crate::services::dedupe_by_phone;
use crate::services::good_morning::{run_good_morning, GoodMorningReport};
use crate::services::reminders::{
    format_executed_at, run_reminders, send_item_now, ItemKind, ManualItem, ManualSendReport,
    ReminderReport,
};
use crate::AppState;

use super::non_blank;

fn check_trigger_secret(state: &AppState, headers: &HeaderMap) -> ApiResult<()> {
    state
        .config
        .trigger_auth
        .check(authorization_header(headers))
        .inspect_err(|_| warn!("Rejected trigger call with a missing or wrong secret"))
}

/// GET|POST /api/notifications/reminders
pub async fn trigger_reminders(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<ReminderReport>> {
    check_trigger_secret(&state, &headers)?;
    let report = run_reminders(&state.db, state.gateway.as_ref(), local_today(), Utc::now()).await?;
    Ok(Json(report))
}

/// GET|POST /api/notifications/good-morning
pub async fn trigger_good_morning(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<GoodMorningReport>> {
    check_trigger_secret(&state, &headers)?;
    let report = run_good_morning(
        &state.db,
        state.gateway.as_ref(),
        state.quotes.as_ref(),
        Utc::now(),
    )
    .await?;
    Ok(Json(report))
}

/// Manual send body, as posted by the calendar and task views
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub item_id: Option<String>,
    pub item_title: Option<String>,
    pub item_date: Option<String>,
    pub item_time: Option<String>,
    pub creator_name: Option<String>,
}

impl SendRequest {
    fn into_item(self) -> ApiResult<ManualItem> {
        let (Some(kind), Some(_item_id), Some(title), Some(date)) = (
            non_blank(self.kind),
            non_blank(self.item_id),
            non_blank(self.item_title),
            non_blank(self.item_date),
        ) else {
            return Err(ApiError::BadRequest("Missing required fields".to_string()));
        };

        let kind = match kind.as_str() {
            "task" => ItemKind::Task,
            "event" => ItemKind::Event,
            _ => return Err(ApiError::BadRequest("Invalid type".to_string())),
        };

        Ok(ManualItem {
            kind,
            title,
            date,
            time: non_blank(self.item_time),
            creator_name: non_blank(self.creator_name),
        })
    }
}

/// POST /api/notifications/send
pub async fn send_now(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<SendRequest>,
) -> ApiResult<Json<ManualSendReport>> {
    let item = req.into_item()?;
    info!(
        requested_by = %user.id,
        kind = ?item.kind,
        title = %item.title,
        "[send] Manual notification"
    );

    let report = send_item_now(&state.db, state.gateway.as_ref(), &item).await?;
    Ok(Json(report))
}

#[derive(Debug, Serialize)]
pub struct DiagnoseDates {
    pub today: NaiveDate,
    pub tomorrow: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct RecipientSummary {
    pub name: String,
    pub has_phone: bool,
    pub notifications_enabled: bool,
    pub whatsapp_enabled: bool,
    pub sms_enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct ProfileCounts {
    pub total: usize,
    pub with_phone_numbers: usize,
    pub with_notifications_enabled: usize,
    pub whatsapp_eligible: usize,
    /// Distinct phone numbers, i.e. how many messages one subject produces
    pub unique_recipients: usize,
    pub list: Vec<RecipientSummary>,
}

#[derive(Debug, Serialize)]
pub struct SubjectCounts<T> {
    pub today: usize,
    pub tomorrow: usize,
    pub tomorrow_list: Vec<T>,
}

/// Read-only snapshot of everything the next reminder run depends on
#[derive(Debug, Serialize)]
pub struct DiagnoseReport {
    pub success: bool,
    pub timestamp: String,
    pub dates: DiagnoseDates,
    pub app_settings: Option<AppSettings>,
    pub profiles: ProfileCounts,
    pub events: SubjectCounts<DueEvent>,
    pub tasks: SubjectCounts<DueTask>,
    pub environment: CredentialPresence,
    pub trigger_secret_required: bool,
    pub recommendations: Vec<String>,
}

fn profile_counts(all: &[Profile]) -> ProfileCounts {
    let with_phone: Vec<Profile> = all
        .iter()
        .filter(|p| p.phone_number.as_deref().is_some_and(|n| !n.trim().is_empty()))
        .cloned()
        .collect();

    ProfileCounts {
        total: all.len(),
        with_phone_numbers: with_phone.len(),
        with_notifications_enabled: with_phone.iter().filter(|p| p.notifications_enabled).count(),
        whatsapp_eligible: with_phone
            .iter()
            .filter(|p| p.notifications_enabled && p.whatsapp_enabled)
            .count(),
        list: all
            .iter()
            .map(|p| RecipientSummary {
                name: p.name.clone(),
                has_phone: p.phone_number.is_some(),
                notifications_enabled: p.notifications_enabled,
                whatsapp_enabled: p.whatsapp_enabled,
                sms_enabled: p.sms_enabled,
            })
            .collect(),
        unique_recipients: dedupe_by_phone(with_phone).len(),
    }
}

/// Human-readable hints for whatever would stop the next run from delivering
pub fn recommendations(
    settings: Option<&AppSettings>,
    profiles: &ProfileCounts,
    credentials: &CredentialPresence,
    tomorrow: NaiveDate,
    subjects_tomorrow: usize,
) -> Vec<String> {
    let mut hints = Vec::new();

    if let Some(s) = settings {
        if !s.notifications_enabled {
            hints.push(
                "Notifications are disabled app-wide; re-enable them in settings".to_string(),
            );
        }
        if !s.enable_whatsapp && !s.enable_sms {
            hints.push(
                "Both WhatsApp and SMS channels are disabled at application level".to_string(),
            );
        }
    }
    if profiles.with_phone_numbers == 0 {
        hints.push("No family members have a phone number".to_string());
    } else if profiles.with_notifications_enabled == 0 {
        hints.push("No family member with a phone number has notifications enabled".to_string());
    }
    if !credentials.twilio_account_sid || !credentials.twilio_auth_token {
        hints.push(
            "Twilio credentials not configured (TWILIO_ACCOUNT_SID, TWILIO_AUTH_TOKEN)".to_string(),
        );
    }
    if !credentials.twilio_whatsapp_from {
        hints.push("TWILIO_WHATSAPP_FROM not configured; WhatsApp messages will fail".to_string());
    }
    if !credentials.twilio_sms_from {
        hints.push("TWILIO_SMS_FROM not configured; SMS messages will fail".to_string());
    }
    if !credentials.openai_api_key {
        hints.push(
            "OPENAI_API_KEY not configured; quotes come from the secondary source".to_string(),
        );
    }
    if subjects_tomorrow == 0 {
        hints.push(format!("No events or open tasks found for {}", tomorrow));
    }

    hints
}

/// GET /api/notifications/diagnose
pub async fn diagnose(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<DiagnoseReport>> {
    check_trigger_secret(&state, &headers)?;

    let today = local_today();
    let tomorrow = tomorrow_of(today);

    let app_settings = settings::get_settings(&state.db).await?;
    let all_profiles = profiles::list_profiles(&state.db).await?;
    let events_today = events::events_on(&state.db, today).await?;
    let events_tomorrow = events::events_on(&state.db, tomorrow).await?;
    let tasks_today = tasks::open_tasks_due_on(&state.db, today).await?;
    let tasks_tomorrow = tasks::open_tasks_due_on(&state.db, tomorrow).await?;

    let profile_counts = profile_counts(&all_profiles);
    let environment = state.config.credentials.presence();
    let recommendations = recommendations(
        app_settings.as_ref(),
        &profile_counts,
        &environment,
        tomorrow,
        events_tomorrow.len() + tasks_tomorrow.len(),
    );

    Ok(Json(DiagnoseReport {
        success: true,
        timestamp: format_executed_at(Utc::now()),
        dates: DiagnoseDates { today, tomorrow },
        app_settings,
        profiles: profile_counts,
        events: SubjectCounts {
            today: events_today.len(),
            tomorrow: events_tomorrow.len(),
            tomorrow_list: events_tomorrow,
        },
        tasks: SubjectCounts {
            today: tasks_today.len(),
            tomorrow: tasks_tomorrow.len(),
            tomorrow_list: tasks_tomorrow,
        },
        environment,
        trigger_secret_required: state.config.trigger_auth.is_required(),
        recommendations,
    }))
}

/// Scheduler-facing routes; they check the trigger secret themselves
pub fn trigger_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/notifications/reminders",
            get(trigger_reminders).post(trigger_reminders),
        )
        .route(
            "/api/notifications/good-morning",
            get(trigger_good_morning).post(trigger_good_morning),
        )
        .route("/api/notifications/diagnose", get(diagnose))
}

pub fn manual_send_routes() -> Router<AppState> {
    Router::new().route("/api/notifications/send", post(send_now))
}
