//! Dispatcher behaviour against a recording gateway

mod helpers;

use hearth_common::db::AppSettings;
use hearth_server::services::{
    dedupe_by_phone, send_notification_to_user, Channel, ChannelPreferences, DispatchOutcome,
    GatewayError,
};

use helpers::{daily_limit_error, RecordingGateway, TestApp};

const PHONE: &str = "+15551234567";

fn all_channels() -> ChannelPreferences {
    ChannelPreferences {
        notifications: true,
        whatsapp: true,
        sms: true,
    }
}

#[tokio::test]
async fn test_master_switch_off_sends_nothing() {
    let gateway = RecordingGateway::ok();
    let settings = AppSettings {
        notifications_enabled: false,
        ..Default::default()
    };

    let outcome = send_notification_to_user(
        &gateway,
        Some(PHONE),
        all_channels(),
        "hi",
        Some(&settings),
    )
    .await;

    assert_eq!(outcome, DispatchOutcome::default());
    assert_eq!(gateway.call_count(), 0);
}

#[tokio::test]
async fn test_missing_phone_sends_nothing() {
    let gateway = RecordingGateway::ok();

    let outcome = send_notification_to_user(&gateway, None, all_channels(), "hi", None).await;
    assert_eq!(outcome, DispatchOutcome::default());

    let outcome = send_notification_to_user(&gateway, Some(""), all_channels(), "hi", None).await;
    assert_eq!(outcome, DispatchOutcome::default());

    assert_eq!(gateway.call_count(), 0);
}

#[tokio::test]
async fn test_personal_opt_out_sends_nothing() {
    let gateway = RecordingGateway::ok();
    let prefs = ChannelPreferences {
        notifications: false,
        ..all_channels()
    };

    let outcome = send_notification_to_user(&gateway, Some(PHONE), prefs, "hi", None).await;

    assert!(!outcome.delivered());
    assert_eq!(gateway.call_count(), 0);
}

#[tokio::test]
async fn test_both_channels_attempted_in_order() {
    let gateway = RecordingGateway::ok();

    let outcome =
        send_notification_to_user(&gateway, Some(PHONE), all_channels(), "hi", None).await;

    assert!(outcome.whatsapp && outcome.sms);
    assert!(outcome.errors.is_empty());
    let channels: Vec<Channel> = gateway.calls().iter().map(|c| c.channel).collect();
    assert_eq!(channels, vec![Channel::WhatsApp, Channel::Sms]);
}

#[tokio::test]
async fn test_whatsapp_failure_does_not_block_sms() {
    let gateway = RecordingGateway::with_rule(|channel| match channel {
        Channel::WhatsApp => Err(GatewayError::http(400, Some(21211), "Invalid 'To' Phone Number")),
        Channel::Sms => Ok(()),
    });

    let outcome =
        send_notification_to_user(&gateway, Some(PHONE), all_channels(), "hi", None).await;

    assert!(!outcome.whatsapp);
    assert!(outcome.sms);
    assert!(!outcome.rate_limited);
    assert_eq!(outcome.errors, vec!["WhatsApp: Invalid 'To' Phone Number".to_string()]);
    assert_eq!(gateway.call_count(), 2);
}

#[tokio::test]
async fn test_app_level_channel_switches() {
    let gateway = RecordingGateway::ok();
    let sms_off = AppSettings {
        enable_sms: false,
        ..Default::default()
    };

    let outcome = send_notification_to_user(
        &gateway,
        Some(PHONE),
        all_channels(),
        "hi",
        Some(&sms_off),
    )
    .await;

    assert!(outcome.whatsapp);
    assert!(!outcome.sms);
    assert_eq!(gateway.calls()[0].channel, Channel::WhatsApp);
    assert_eq!(gateway.call_count(), 1);
}

#[tokio::test]
async fn test_rate_limit_is_flagged_with_distinct_message() {
    let gateway = RecordingGateway::rate_limited();

    let outcome =
        send_notification_to_user(&gateway, Some(PHONE), all_channels(), "hi", None).await;

    assert!(outcome.rate_limited);
    assert!(!outcome.delivered());
    assert_eq!(
        outcome.errors,
        vec![
            "WhatsApp: Rate limit exceeded - daily message limit reached".to_string(),
            "SMS: Rate limit exceeded - daily message limit reached".to_string(),
        ]
    );
    assert!(daily_limit_error().is_rate_limit());
}

#[tokio::test]
async fn test_dedupe_keeps_first_of_each_phone() {
    let app = TestApp::new().await;
    let first = app.member("Ana", "mother", Some(PHONE)).await;
    let second = app.member("Ben", "father", Some(PHONE)).await;
    let other = app.member("Cy", "son", Some("+15550000000")).await;
    let none = app.member("Di", "daughter", None).await;

    let kept = dedupe_by_phone(vec![first.clone(), second, other.clone(), none]);

    let ids: Vec<&str> = kept.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec![first.id.as_str(), other.id.as_str()]);
}
