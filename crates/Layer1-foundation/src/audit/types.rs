//! Audit Log Types
//!
//! Records of authorization decisions taken at the data-access boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Audit Entry ID
// ============================================================================

/// Audit entry ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuditId(pub String);

impl AuditId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for AuditId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AuditId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Audit Event
// ============================================================================

/// Kind of authorization event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEvent {
    AuthorizationSuccess,
    AuthorizationFailure,
}

impl AuditEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthorizationSuccess => "authorization_success",
            Self::AuthorizationFailure => "authorization_failure",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "authorization_success" => Some(Self::AuthorizationSuccess),
            "authorization_failure" => Some(Self::AuthorizationFailure),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::AuthorizationSuccess)
    }
}

// ============================================================================
// Audit Entry
// ============================================================================

/// One authorization decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditId,

    pub timestamp: DateTime<Utc>,

    pub event: AuditEvent,

    /// Principal the decision was made for
    pub username: String,

    /// Operation that was authorized (`get`, `bulk_create`, ...)
    pub action: String,

    /// Object types involved
    pub types: Vec<String>,

    /// Actions that were not granted (failures only)
    pub missing_actions: Vec<String>,

    /// Call arguments and decision details
    pub context: Value,
}

impl AuditEntry {
    pub fn new(event: AuditEvent, username: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            id: AuditId::new(),
            timestamp: Utc::now(),
            event,
            username: username.into(),
            action: action.into(),
            types: Vec::new(),
            missing_actions: Vec::new(),
            context: Value::Null,
        }
    }

    pub fn with_types(mut self, types: &[String]) -> Self {
        self.types = types.to_vec();
        self
    }

    pub fn with_missing_actions(mut self, missing: &[String]) -> Self {
        self.missing_actions = missing.to_vec();
        self
    }

    pub fn with_context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }
}

// ============================================================================
// Audit Query
// ============================================================================

/// Audit log query
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    pub events: Option<Vec<AuditEvent>>,

    pub username: Option<String>,

    pub action: Option<String>,

    pub from: Option<DateTime<Utc>>,

    pub to: Option<DateTime<Utc>>,

    pub limit: Option<usize>,

    pub offset: Option<usize>,
}

impl AuditQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(mut self, events: Vec<AuditEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_time_range(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Whether `entry` satisfies every filter
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        if let Some(ref events) = self.events {
            if !events.contains(&entry.event) {
                return false;
            }
        }

        if let Some(ref username) = self.username {
            if &entry.username != username {
                return false;
            }
        }

        if let Some(ref action) = self.action {
            if &entry.action != action {
                return false;
            }
        }

        if let Some(ref from) = self.from {
            if entry.timestamp < *from {
                return false;
            }
        }

        if let Some(ref to) = self.to {
            if entry.timestamp > *to {
                return false;
            }
        }

        true
    }
}

// ============================================================================
// Audit Statistics
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditStatistics {
    pub total_entries: u64,

    pub failures: u64,

    /// operation -> count
    pub by_action: std::collections::HashMap<String, u64>,

    /// username -> failure count
    pub failures_by_user: std::collections::HashMap<String, u64>,
}
