use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
    System,
}

/// Canonical chat message as stored in the session log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
}

/// Loosely shaped message record, e.g. a seed entry read from disk.
///
/// Every field is optional; [`RawMessage::normalize`] fills in the gaps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMessage {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, alias = "type")]
    pub role: Option<Role>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl RawMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role: Some(role),
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Produce a canonical [`Message`], substituting defaults for anything missing.
    /// Empty ids count as missing.
    pub fn normalize(&self, fallback: Role) -> Message {
        let id = match self.id.as_deref() {
            Some(id) if !id.is_empty() => id.to_owned(),
            _ => generate_id(),
        };
        Message {
            id,
            role: self.role.unwrap_or(fallback),
            content: self.content.clone().unwrap_or_default(),
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            sources: Vec::new(),
        }
    }
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        RawMessage::new(Role::User, content).normalize(Role::User)
    }

    pub fn bot(content: impl Into<String>) -> Self {
        RawMessage::new(Role::Bot, content).normalize(Role::Bot)
    }

    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.sources = sources;
        self
    }
}

pub fn generate_id() -> String {
    format!("msg_{}", Uuid::now_v7().simple())
}

pub fn normalize_all(raw: &[RawMessage], fallback: Role) -> Vec<Message> {
    raw.iter().map(|msg| msg.normalize(fallback)).collect()
}

/// Wall-clock `HH:MM` in the local timezone.
pub fn format_time(timestamp: &DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%H:%M").to_string()
}
