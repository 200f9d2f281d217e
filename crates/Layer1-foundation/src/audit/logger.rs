//! Audit Logger - SQLite persistence for authorization events

use super::sink::AuditSink;
use super::types::{AuditEntry, AuditEvent, AuditId, AuditQuery, AuditStatistics};
use crate::config::AuditConfig;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::PathBuf;
use tracing::{debug, error, info};

// ============================================================================
// AuditLogger
// ============================================================================

/// Audit logger settings
#[derive(Debug, Clone)]
pub struct AuditLoggerConfig {
    /// Database path
    pub db_path: PathBuf,

    /// Retention period in days
    pub retention_days: u32,
}

impl Default for AuditLoggerConfig {
    fn default() -> Self {
        let db_path = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tessera")
            .join("audit.db");

        Self {
            db_path,
            retention_days: 90,
        }
    }
}

impl From<&AuditConfig> for AuditLoggerConfig {
    fn from(config: &AuditConfig) -> Self {
        let mut logger_config = Self::default();
        if let Some(path) = &config.db_path {
            logger_config.db_path = path.clone();
        }
        logger_config.retention_days = config.retention_days;
        logger_config
    }
}

/// Persists authorization events and answers queries over them
///
/// ```ignore
/// use tessera_foundation::audit::{AuditLogger, AuditQuery, AuditEvent};
///
/// let logger = AuditLogger::new()?;
/// let failures = logger.query(&AuditQuery::new()
///     .with_events(vec![AuditEvent::AuthorizationFailure])
///     .with_limit(10))?;
/// ```
pub struct AuditLogger {
    db: Mutex<Connection>,

    config: AuditLoggerConfig,
}

impl AuditLogger {
    pub fn new() -> crate::Result<Self> {
        Self::with_config(AuditLoggerConfig::default())
    }

    pub fn with_config(config: AuditLoggerConfig) -> crate::Result<Self> {
        if let Some(parent) = config.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&config.db_path)?;
        let logger = Self {
            db: Mutex::new(conn),
            config,
        };
        logger.init_tables()?;

        info!(
            db_path = %logger.config.db_path.display(),
            "Audit logger initialized"
        );

        Ok(logger)
    }

    /// Open the logger described by `config` and prune expired entries
    ///
    /// Returns `None` when auditing is disabled.
    pub fn open(config: &AuditConfig) -> crate::Result<Option<Self>> {
        if !config.enabled {
            debug!("Audit logging disabled");
            return Ok(None);
        }

        let logger = Self::with_config(AuditLoggerConfig::from(config))?;
        logger.apply_retention()?;
        Ok(Some(logger))
    }

    /// In-memory logger (tests, dry runs)
    pub fn in_memory() -> crate::Result<Self> {
        let conn = Connection::open_in_memory()?;
        let logger = Self {
            db: Mutex::new(conn),
            config: AuditLoggerConfig {
                db_path: PathBuf::from(":memory:"),
                ..Default::default()
            },
        };
        logger.init_tables()?;
        Ok(logger)
    }

    pub fn config(&self) -> &AuditLoggerConfig {
        &self.config
    }

    fn init_tables(&self) -> crate::Result<()> {
        let db = self.db.lock();

        db.execute(
            r#"
            CREATE TABLE IF NOT EXISTS audit_log (
                id TEXT PRIMARY KEY,
                timestamp TEXT NOT NULL,
                event TEXT NOT NULL,
                username TEXT NOT NULL,
                action TEXT NOT NULL,
                types TEXT NOT NULL,
                missing_actions TEXT NOT NULL,
                context TEXT NOT NULL
            )
            "#,
            [],
        )?;

        db.execute(
            "CREATE INDEX IF NOT EXISTS idx_audit_timestamp ON audit_log(timestamp)",
            [],
        )?;
        db.execute(
            "CREATE INDEX IF NOT EXISTS idx_audit_username ON audit_log(username)",
            [],
        )?;

        Ok(())
    }

    pub fn log(&self, entry: AuditEntry) -> crate::Result<AuditId> {
        let id = entry.id.clone();
        let types = serde_json::to_string(&entry.types)?;
        let missing = serde_json::to_string(&entry.missing_actions)?;
        let context = serde_json::to_string(&entry.context)?;

        let db = self.db.lock();
        db.execute(
            r#"
            INSERT INTO audit_log (
                id, timestamp, event, username, action, types, missing_actions, context
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                id.0,
                entry.timestamp.to_rfc3339(),
                entry.event.as_str(),
                entry.username,
                entry.action,
                types,
                missing,
                context,
            ],
        )?;

        debug!(
            audit_id = %id,
            event = entry.event.as_str(),
            username = %entry.username,
            "Audit entry logged"
        );

        Ok(id)
    }

    pub fn get(&self, id: &AuditId) -> crate::Result<Option<AuditEntry>> {
        let db = self.db.lock();
        let entry = db
            .query_row(
                "SELECT * FROM audit_log WHERE id = ?1",
                params![id.0],
                |row| Self::row_to_entry(row),
            )
            .optional()?;
        Ok(entry)
    }

    pub fn query(&self, query: &AuditQuery) -> crate::Result<Vec<AuditEntry>> {
        let mut sql = String::from("SELECT * FROM audit_log WHERE 1=1");
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref events) = query.events {
            let placeholders: Vec<&str> = events.iter().map(|_| "?").collect();
            sql.push_str(&format!(" AND event IN ({})", placeholders.join(", ")));
            for event in events {
                params_vec.push(Box::new(event.as_str().to_string()));
            }
        }

        if let Some(ref username) = query.username {
            sql.push_str(" AND username = ?");
            params_vec.push(Box::new(username.clone()));
        }

        if let Some(ref action) = query.action {
            sql.push_str(" AND action = ?");
            params_vec.push(Box::new(action.clone()));
        }

        if let Some(ref from) = query.from {
            sql.push_str(" AND timestamp >= ?");
            params_vec.push(Box::new(from.to_rfc3339()));
        }
        if let Some(ref to) = query.to {
            sql.push_str(" AND timestamp <= ?");
            params_vec.push(Box::new(to.to_rfc3339()));
        }

        sql.push_str(" ORDER BY timestamp DESC");

        // SQLite requires a LIMIT before OFFSET
        match (query.limit, query.offset) {
            (Some(limit), Some(offset)) => {
                sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset))
            }
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {}", limit)),
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {}", offset)),
            (None, None) => {}
        }

        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();

        let db = self.db.lock();
        let mut stmt = db.prepare(&sql)?;
        let entries = stmt
            .query_map(params_refs.as_slice(), |row| Self::row_to_entry(row))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(entries)
    }

    pub fn recent(&self, limit: usize) -> crate::Result<Vec<AuditEntry>> {
        self.query(&AuditQuery::new().with_limit(limit))
    }

    pub fn statistics(&self) -> crate::Result<AuditStatistics> {
        let db = self.db.lock();

        let total_entries: u64 =
            db.query_row("SELECT COUNT(*) FROM audit_log", [], |row| row.get(0))?;
        let failures: u64 = db.query_row(
            "SELECT COUNT(*) FROM audit_log WHERE event = ?1",
            params![AuditEvent::AuthorizationFailure.as_str()],
            |row| row.get(0),
        )?;

        let mut by_action = std::collections::HashMap::new();
        let mut stmt = db.prepare("SELECT action, COUNT(*) FROM audit_log GROUP BY action")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let action: String = row.get(0)?;
            let count: u64 = row.get(1)?;
            by_action.insert(action, count);
        }

        let mut failures_by_user = std::collections::HashMap::new();
        let mut stmt = db.prepare(
            "SELECT username, COUNT(*) FROM audit_log WHERE event = ?1 GROUP BY username",
        )?;
        let mut rows = stmt.query(params![AuditEvent::AuthorizationFailure.as_str()])?;
        while let Some(row) = rows.next()? {
            let username: String = row.get(0)?;
            let count: u64 = row.get(1)?;
            failures_by_user.insert(username, count);
        }

        Ok(AuditStatistics {
            total_entries,
            failures,
            by_action,
            failures_by_user,
        })
    }

    /// Delete entries older than `days`
    pub fn cleanup(&self, days: u32) -> crate::Result<u64> {
        let cutoff = chrono::Utc::now() - chrono::Duration::days(days as i64);

        let db = self.db.lock();
        let deleted = db.execute(
            "DELETE FROM audit_log WHERE timestamp < ?1",
            params![cutoff.to_rfc3339()],
        )?;

        if deleted > 0 {
            info!(deleted = deleted, days = days, "Cleaned up old audit entries");
        }

        Ok(deleted as u64)
    }

    /// Apply the configured retention period
    pub fn apply_retention(&self) -> crate::Result<u64> {
        self.cleanup(self.config.retention_days)
    }

    fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<AuditEntry> {
        let id: String = row.get("id")?;
        let timestamp: String = row.get("timestamp")?;
        let event: String = row.get("event")?;
        let types: String = row.get("types")?;
        let missing: String = row.get("missing_actions")?;
        let context: String = row.get("context")?;

        Ok(AuditEntry {
            id: AuditId(id),
            timestamp: chrono::DateTime::parse_from_rfc3339(&timestamp)
                .map(|dt| dt.with_timezone(&chrono::Utc))
                .unwrap_or_else(|_| chrono::Utc::now()),
            event: AuditEvent::parse(&event).unwrap_or(AuditEvent::AuthorizationFailure),
            username: row.get("username")?,
            action: row.get("action")?,
            types: serde_json::from_str(&types).unwrap_or_default(),
            missing_actions: serde_json::from_str(&missing).unwrap_or_default(),
            context: serde_json::from_str(&context).unwrap_or(Value::Null),
        })
    }

    fn record(&self, entry: AuditEntry) {
        if let Err(e) = self.log(entry) {
            error!(error = %e, "Failed to persist audit entry");
        }
    }
}

impl AuditSink for AuditLogger {
    fn authorization_success(
        &self,
        username: &str,
        action: &str,
        types: &[String],
        context: &Value,
    ) {
        self.record(
            AuditEntry::new(AuditEvent::AuthorizationSuccess, username, action)
                .with_types(types)
                .with_context(context.clone()),
        );
    }

    fn authorization_failure(
        &self,
        username: &str,
        action: &str,
        types: &[String],
        missing_actions: &[String],
        context: &Value,
    ) {
        self.record(
            AuditEntry::new(AuditEvent::AuthorizationFailure, username, action)
                .with_types(types)
                .with_missing_actions(missing_actions)
                .with_context(context.clone()),
        );
    }
}
