//! Database row models and the vocabularies their text columns draw from

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Family member profile (also the login account)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub name: String,
    pub role: String,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
    pub phone_number: Option<String>,
    pub notifications_enabled: bool,
    pub whatsapp_enabled: bool,
    pub sms_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn is_parent(&self) -> bool {
        Role::from_str(&self.role).map(Role::is_parent).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
    pub time: Option<String>,
    pub notes: Option<String>,
    pub category: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub due_date: Option<NaiveDate>,
    pub assigned_to: String,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: String,
    pub is_readonly_for_kids: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Memory {
    pub id: String,
    pub photo_url: String,
    pub note: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Announcement {
    pub id: String,
    pub message: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// The single application-wide settings row
///
/// `notifications_enabled` is the master switch: when false nothing is sent,
/// whatever the per-profile preferences say.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AppSettings {
    pub id: i64,
    pub notifications_enabled: bool,
    pub enable_sms: bool,
    pub enable_whatsapp: bool,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            id: 1,
            notifications_enabled: true,
            enable_sms: true,
            enable_whatsapp: true,
            updated_at: Utc::now(),
            updated_by: None,
        }
    }
}

/// Declares a closed vocabulary stored as lowercase text
macro_rules! text_vocabulary {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(Error::InvalidInput(format!(
                        "Invalid {} '{}', expected one of: {}",
                        stringify!($name),
                        other,
                        [$($text),+].join(", ")
                    ))),
                }
            }
        }
    };
}

text_vocabulary!(
    /// Family role; parents may manage notes
    Role {
        Father => "father",
        Mother => "mother",
        Parent => "parent",
        Son => "son",
        Daughter => "daughter",
    }
);

impl Role {
    pub fn is_parent(self) -> bool {
        matches!(self, Role::Father | Role::Mother | Role::Parent)
    }

    /// Role assigned at signup from age and gender
    pub fn from_age_and_gender(age: i32, gender: Gender) -> Self {
        match (age < 26, gender) {
            (true, Gender::Male) => Role::Son,
            (true, Gender::Female) => Role::Daughter,
            (false, Gender::Male) => Role::Father,
            (false, Gender::Female) => Role::Mother,
        }
    }
}

text_vocabulary!(Gender {
    Male => "male",
    Female => "female",
});

text_vocabulary!(EventCategory {
    School => "school",
    Health => "health",
    Travel => "travel",
    Family => "family",
});

text_vocabulary!(NoteCategory {
    Emergency => "emergency",
    Health => "health",
    School => "school",
    General => "general",
});

text_vocabulary!(
    /// Who a task is for
    Assignee {
        Father => "father",
        Mother => "mother",
        Son => "son",
        Daughter => "daughter",
        All => "all",
    }
);
