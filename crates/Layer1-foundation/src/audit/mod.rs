//! Audit System
//!
//! Records every authorization decision made at the data-access boundary.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │   SecureSavedObjectsClient (tessera-core)    │
//! │                     │                        │
//! │                     ▼                        │
//! │              dyn AuditSink                   │
//! │      ┌──────────────┼──────────────┐         │
//! │      ▼              ▼              ▼         │
//! │ TracingAuditSink AuditLogger  CompositeSink  │
//! │  (tracing)       (SQLite)                    │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use tessera_foundation::audit::{AuditLogger, AuditSink, CompositeAuditSink, TracingAuditSink};
//!
//! let sink: Arc<dyn AuditSink> = Arc::new(
//!     CompositeAuditSink::new()
//!         .with(Arc::new(TracingAuditSink))
//!         .with(Arc::new(AuditLogger::new()?)),
//! );
//! ```

pub mod logger;
pub mod sink;
pub mod types;

pub use logger::{AuditLogger, AuditLoggerConfig};
pub use sink::{AuditSink, CompositeAuditSink, TracingAuditSink};
pub use types::{AuditEntry, AuditEvent, AuditId, AuditQuery, AuditStatistics};
