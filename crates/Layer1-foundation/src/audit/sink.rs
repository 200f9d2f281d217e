//! Audit sink
//!
//! Receives authorization decisions. Calls are fire-and-forget: a sink must
//! never block or fail the decision it records.

use serde_json::Value;
use tracing::{info, warn};

/// Destination for authorization audit events
pub trait AuditSink: Send + Sync {
    fn authorization_success(
        &self,
        username: &str,
        action: &str,
        types: &[String],
        context: &Value,
    );

    fn authorization_failure(
        &self,
        username: &str,
        action: &str,
        types: &[String],
        missing_actions: &[String],
        context: &Value,
    );
}

/// Emits audit events as `tracing` records on target `tessera::audit`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn authorization_success(
        &self,
        username: &str,
        action: &str,
        types: &[String],
        context: &Value,
    ) {
        info!(
            target: "tessera::audit",
            event = "authorization_success",
            username,
            action,
            types = ?types,
            context = %context,
            "{} authorized to {} {}",
            username,
            action,
            types.join(",")
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
        warn!(
            target: "tessera::audit",
            event = "authorization_failure",
            username,
            action,
            types = ?types,
            missing = ?missing_actions,
            context = %context,
            "{} unauthorized to {} {}",
            username,
            action,
            types.join(",")
        );
    }
}

/// Fans every event out to several sinks
#[derive(Default)]
pub struct CompositeAuditSink {
    sinks: Vec<std::sync::Arc<dyn AuditSink>>,
}

impl CompositeAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: std::sync::Arc<dyn AuditSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl AuditSink for CompositeAuditSink {
    fn authorization_success(
        &self,
        username: &str,
        action: &str,
        types: &[String],
        context: &Value,
    ) {
        for sink in &self.sinks {
            sink.authorization_success(username, action, types, context);
        }
    }

    fn authorization_failure(
        &self,
        username: &str,
        action: &str,
        types: &[String],
        missing_actions: &[String],
        context: &Value,
    ) {
        for sink in &self.sinks {
            sink.authorization_failure(username, action, types, missing_actions, context);
        }
    }
}
