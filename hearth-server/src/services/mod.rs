//! Notification pipeline and supporting services

pub mod dispatcher;
pub mod gateway;
pub mod good_morning;
pub mod messages;
pub mod photo_store;
pub mod quotes;
pub mod reminders;

pub use dispatcher::{
    dedupe_by_phone, send_notification_to_user, ChannelPreferences, DispatchOutcome,
};
pub use gateway::{Channel, GatewayError, MessagingGateway, TwilioGateway};
pub use photo_store::{PhotoBucket, PhotoStore, StoredPhoto};
pub use quotes::{QuoteProvider, QuoteResult, QuoteService, QuoteSource};
